// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Coin-specific transaction serialization and signature hashing
//!
//! A [Strategy] is selected per coin family and injected into the
//! [Engine][crate::engine::Engine], providing the consensus encoding of
//! transaction parts along with the commitment used for per-input signature
//! hashes. Hooks allow a strategy to serialize parts of the transaction during
//! the confirmation pass where its layout requires it.

use strum::Display;

use crate::{
    coin::CoinInfo,
    engine::Error,
    hash::HashWriter,
    tx::{PrevOutput, SignTx, TxIn, TxInput, TxOutput},
    writers::{write_varint, Writer},
};

mod bitcoin;
pub use bitcoin::Bitcoin;

mod decred;
pub use decred::Decred;

/// How an input is signed and where its amount comes from
#[derive(Copy, Clone, PartialEq, Debug, Display)]
pub enum InputMode {
    /// Amount from the previous transaction, legacy signature hash over a re-streamed transaction
    Legacy,
    /// Amount from the host, serialized in pass 2, signed in the witness stage
    Segwit,
    /// Amount from the host, signed in pass 2 with the BIP143 digest
    Bip143,
    /// Amount from the previous transaction, signed in pass 2 with the prefix / witness digest
    Prefix,
}

impl InputMode {
    /// Amount is established by streaming the previous transaction
    pub const fn needs_prev_tx(&self) -> bool {
        matches!(self, Self::Legacy | Self::Prefix)
    }

    /// Amount is committed by the signature hash, and drawn down during signing
    pub const fn commits_amount(&self) -> bool {
        matches!(self, Self::Segwit | Self::Bip143)
    }

    /// Signed from the strategy commitment during pass 2
    pub const fn signs_in_pass2(&self) -> bool {
        matches!(self, Self::Bip143 | Self::Prefix)
    }
}

/// Coin-specific serialization and commitment contract
pub trait Strategy: Sized {
    /// Hash used for transaction ids and pass consistency digests
    type Hasher: HashWriter;

    /// Witness data is serialized in a separate stage after the outputs
    const WITNESS_STAGE: bool;

    /// Outputs are streamed again during pass 2 for final serialization
    const SERIALIZE_OUTPUTS: bool;

    /// Begin a commitment for a new transaction
    fn new(coin: &'static CoinInfo, tx: &SignTx) -> Result<Self, Error>;

    /// Classify an input, refusing script types the coin can not spend
    fn input_mode(&self, txi: &TxInput) -> Result<InputMode, Error>;

    /// Transaction header, `witness` selects segwit marker / full serialization
    fn write_header(&self, w: &mut impl Writer, version: u32, witness: bool) -> Result<(), Error>;

    fn write_footer(&self, w: &mut impl Writer, lock_time: u32, expiry: u32) -> Result<(), Error>;

    fn write_input(&self, w: &mut impl Writer, txi: &impl TxIn, script_sig: &[u8]) -> Result<(), Error>;

    fn write_output(
        &self,
        w: &mut impl Writer,
        amount: u64,
        script_version: u16,
        script_pubkey: &[u8],
    ) -> Result<(), Error>;

    /// Final form of a signed input
    fn write_signed_input(&self, w: &mut impl Writer, txi: &TxInput, script_sig: &[u8]) -> Result<(), Error> {
        self.write_input(w, txi, script_sig)
    }

    fn commitment_add_input(&mut self, txi: &TxInput) -> Result<(), Error>;

    fn commitment_add_output(&mut self, amount: u64, script_version: u16, script_pubkey: &[u8]) -> Result<(), Error>;

    /// Signature hash for input `index` from the accumulated commitment
    fn sighash(
        &self,
        tx: &SignTx,
        index: u32,
        txi: &TxInput,
        script_code: &[u8],
        hash_type: u32,
    ) -> Result<[u8; 32], Error>;

    /// Refuse outputs the coin forbids
    fn check_output(&self, _txo: &TxOutput) -> Result<(), Error> {
        Ok(())
    }

    /// Refuse previous outputs the coin forbids spending
    fn check_prev_output(&self, _prev: &PrevOutput) -> Result<(), Error> {
        Ok(())
    }

    /// Session start, ahead of the first input request
    fn begin(&mut self, _w: &mut impl Writer, _tx: &SignTx) -> Result<(), Error> {
        Ok(())
    }

    /// Pass 1 input accepted
    fn input_processed(&mut self, _w: &mut impl Writer, _txi: &TxInput) -> Result<(), Error> {
        Ok(())
    }

    /// Pass 1 output stream starting
    fn outputs_begin(&mut self, _w: &mut impl Writer, _tx: &SignTx) -> Result<(), Error> {
        Ok(())
    }

    /// Pass 1 output accepted
    fn output_processed(
        &mut self,
        _w: &mut impl Writer,
        _amount: u64,
        _script_version: u16,
        _script_pubkey: &[u8],
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Pass 1 output stream complete
    fn outputs_end(&mut self, _w: &mut impl Writer, _tx: &SignTx) -> Result<(), Error> {
        Ok(())
    }

    /// Start of pass 2 serialization
    fn begin_signing(&self, w: &mut impl Writer, tx: &SignTx, any_segwit: bool) -> Result<(), Error> {
        self.write_header(w, tx.version, any_segwit)?;
        write_varint(w, tx.inputs_count as u64)
    }

    /// Complete serialization
    fn finish(&self, w: &mut impl Writer, tx: &SignTx) -> Result<(), Error> {
        self.write_footer(w, tx.lock_time, tx.expiry)
    }
}

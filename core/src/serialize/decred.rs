// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Decred serialization, with split prefix / witness signature hashing

use super::{InputMode, Strategy};
use crate::{
    coin::CoinInfo,
    engine::Error,
    hash::{Blake256, HashWriter},
    tx::{InputScriptType, PrevOutput, SignTx, TxIn, TxInput, TxOutput},
    writers::{
        write_bytes_prefixed, write_tx_hash, write_u16, write_u32, write_u64, write_u8,
        write_varint, Writer,
    },
};

/// Serialization modes, carried in the upper half of the version field
const SERIALIZE_FULL: u32 = 0 << 16;
const SERIALIZE_NO_WITNESS: u32 = 1 << 16;
const SERIALIZE_WITNESS_SIGNING: u32 = 3 << 16;

/// Witness block height / index placeholders for signed inputs
const BLOCK_HEIGHT_NONE: u32 = 0;
const BLOCK_INDEX_NONE: u32 = 0xffff_ffff;

/// Decred strategy
///
/// Inputs are serialized in prefix form during the first pass and outputs as
/// they are confirmed, with signed inputs following in witness form. Signature
/// hashes commit to the prefix hash and a per-input witness hash.
#[derive(Clone, Debug)]
pub struct Decred {
    prefix: Blake256,
}

impl Decred {
    fn write_outputs_count(&mut self, w: &mut impl Writer, tx: &SignTx) -> Result<(), Error> {
        write_varint(w, tx.outputs_count as u64)?;
        write_varint(&mut self.prefix, tx.outputs_count as u64)
    }

    /// Witness hash for signing input `index`, all other script slots empty
    fn witness_hash(&self, tx: &SignTx, index: u32, script_code: &[u8]) -> Result<[u8; 32], Error> {
        let mut h = Blake256::new();

        write_u32(&mut h, tx.version | SERIALIZE_WITNESS_SIGNING)?;
        write_varint(&mut h, tx.inputs_count as u64)?;
        for i in 0..tx.inputs_count {
            if i == index {
                write_bytes_prefixed(&mut h, script_code)?;
            } else {
                write_varint(&mut h, 0)?;
            }
        }

        Ok(h.digest())
    }
}

impl Strategy for Decred {
    type Hasher = Blake256;

    const WITNESS_STAGE: bool = false;

    const SERIALIZE_OUTPUTS: bool = false;

    fn new(coin: &'static CoinInfo, tx: &SignTx) -> Result<Self, Error> {
        if !coin.is_decred() {
            return Err(Error::InvalidState);
        }

        let mut prefix = Blake256::new();
        write_u32(&mut prefix, tx.version | SERIALIZE_NO_WITNESS)?;
        write_varint(&mut prefix, tx.inputs_count as u64)?;

        Ok(Self { prefix })
    }

    fn input_mode(&self, txi: &TxInput) -> Result<InputMode, Error> {
        match txi.script_type {
            InputScriptType::SpendAddress | InputScriptType::SpendMultisig => Ok(InputMode::Prefix),
            _ => Err(Error::UnsupportedScriptType),
        }
    }

    fn write_header(&self, w: &mut impl Writer, version: u32, witness: bool) -> Result<(), Error> {
        let mode = match witness {
            true => SERIALIZE_FULL,
            false => SERIALIZE_NO_WITNESS,
        };
        write_u32(w, version | mode)
    }

    fn write_footer(&self, w: &mut impl Writer, lock_time: u32, expiry: u32) -> Result<(), Error> {
        write_u32(w, lock_time)?;
        write_u32(w, expiry)
    }

    /// Prefix form, scripts live in the witness
    fn write_input(&self, w: &mut impl Writer, txi: &impl TxIn, _script_sig: &[u8]) -> Result<(), Error> {
        write_tx_hash(w, txi.prev_hash())?;
        write_u32(w, txi.prev_index())?;
        write_u8(w, txi.decred_tree())?;
        write_u32(w, txi.sequence())
    }

    fn write_output(
        &self,
        w: &mut impl Writer,
        amount: u64,
        script_version: u16,
        script_pubkey: &[u8],
    ) -> Result<(), Error> {
        write_u64(w, amount)?;
        write_u16(w, script_version)?;
        write_bytes_prefixed(w, script_pubkey)
    }

    /// Witness form
    fn write_signed_input(&self, w: &mut impl Writer, txi: &TxInput, script_sig: &[u8]) -> Result<(), Error> {
        write_u64(w, txi.amount.unwrap_or(0))?;
        write_u32(w, BLOCK_HEIGHT_NONE)?;
        write_u32(w, BLOCK_INDEX_NONE)?;
        write_bytes_prefixed(w, script_sig)
    }

    fn commitment_add_input(&mut self, txi: &TxInput) -> Result<(), Error> {
        let mut prefix = core::mem::take(&mut self.prefix);
        let r = self.write_input(&mut prefix, txi, &[]);
        self.prefix = prefix;
        r
    }

    fn commitment_add_output(&mut self, amount: u64, script_version: u16, script_pubkey: &[u8]) -> Result<(), Error> {
        let mut prefix = core::mem::take(&mut self.prefix);
        let r = self.write_output(&mut prefix, amount, script_version, script_pubkey);
        self.prefix = prefix;
        r
    }

    fn sighash(
        &self,
        tx: &SignTx,
        index: u32,
        _txi: &TxInput,
        script_code: &[u8],
        hash_type: u32,
    ) -> Result<[u8; 32], Error> {
        let mut h = Blake256::new();

        write_u32(&mut h, hash_type)?;
        h.write_bytes(&self.prefix.digest())?;
        h.write_bytes(&self.witness_hash(tx, index, script_code)?)?;

        Ok(h.digest())
    }

    fn check_output(&self, txo: &TxOutput) -> Result<(), Error> {
        match txo.decred_script_version {
            0 => Ok(()),
            _ => Err(Error::ScriptVersion),
        }
    }

    fn check_prev_output(&self, prev: &PrevOutput) -> Result<(), Error> {
        match prev.decred_script_version {
            0 => Ok(()),
            _ => Err(Error::ScriptVersion),
        }
    }

    fn begin(&mut self, w: &mut impl Writer, tx: &SignTx) -> Result<(), Error> {
        self.write_header(w, tx.version, true)?;
        write_varint(w, tx.inputs_count as u64)
    }

    fn input_processed(&mut self, w: &mut impl Writer, txi: &TxInput) -> Result<(), Error> {
        self.write_input(w, txi, &[])
    }

    fn outputs_begin(&mut self, w: &mut impl Writer, tx: &SignTx) -> Result<(), Error> {
        self.write_outputs_count(w, tx)
    }

    fn output_processed(
        &mut self,
        w: &mut impl Writer,
        amount: u64,
        script_version: u16,
        script_pubkey: &[u8],
    ) -> Result<(), Error> {
        self.write_output(w, amount, script_version, script_pubkey)
    }

    fn outputs_end(&mut self, w: &mut impl Writer, tx: &SignTx) -> Result<(), Error> {
        self.write_footer(w, tx.lock_time, tx.expiry)?;
        write_u32(&mut self.prefix, tx.lock_time)?;
        write_u32(&mut self.prefix, tx.expiry)
    }

    /// Witness section, inputs only
    fn begin_signing(&self, w: &mut impl Writer, tx: &SignTx, _any_segwit: bool) -> Result<(), Error> {
        write_varint(w, tx.inputs_count as u64)
    }

    /// Footer is part of the prefix, already serialized
    fn finish(&self, _w: &mut impl Writer, _tx: &SignTx) -> Result<(), Error> {
        Ok(())
    }
}

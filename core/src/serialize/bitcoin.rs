// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Bitcoin-like serialization, with the BIP143 commitment

use super::{InputMode, Strategy};
use crate::{
    coin::{CoinFlags, CoinInfo},
    engine::Error,
    hash::{HashWriter, Sha256Writer},
    tx::{InputScriptType, SignTx, TxIn, TxInput},
    writers::{
        write_bytes_prefixed, write_tx_hash, write_tx_input, write_tx_output, write_u32, write_u64,
        Writer,
    },
};

/// Segwit marker and flag
const SEGWIT_MARKER: [u8; 2] = [0x00, 0x01];

/// Default serialization strategy, standard layout with BIP143 signature hashes
#[derive(Clone, Debug)]
pub struct Bitcoin {
    coin: &'static CoinInfo,
    h_prevouts: Sha256Writer,
    h_sequence: Sha256Writer,
    h_outputs: Sha256Writer,
}

impl Strategy for Bitcoin {
    type Hasher = Sha256Writer;

    const WITNESS_STAGE: bool = true;

    const SERIALIZE_OUTPUTS: bool = true;

    fn new(coin: &'static CoinInfo, _tx: &SignTx) -> Result<Self, Error> {
        if coin.is_decred() {
            return Err(Error::InvalidState);
        }

        Ok(Self {
            coin,
            h_prevouts: Sha256Writer::default(),
            h_sequence: Sha256Writer::default(),
            h_outputs: Sha256Writer::default(),
        })
    }

    fn input_mode(&self, txi: &TxInput) -> Result<InputMode, Error> {
        use InputScriptType::*;

        match txi.script_type {
            SpendAddress | SpendMultisig if self.coin.has(CoinFlags::FORCE_BIP143) => {
                Ok(InputMode::Bip143)
            }
            SpendAddress | SpendMultisig => Ok(InputMode::Legacy),
            SpendWitness | SpendP2shWitness if self.coin.has(CoinFlags::SEGWIT) => {
                Ok(InputMode::Segwit)
            }
            _ => Err(Error::UnsupportedScriptType),
        }
    }

    fn write_header(&self, w: &mut impl Writer, version: u32, witness: bool) -> Result<(), Error> {
        write_u32(w, version)?;
        if witness {
            w.write_bytes(&SEGWIT_MARKER)?;
        }
        Ok(())
    }

    fn write_footer(&self, w: &mut impl Writer, lock_time: u32, _expiry: u32) -> Result<(), Error> {
        write_u32(w, lock_time)
    }

    fn write_input(&self, w: &mut impl Writer, txi: &impl TxIn, script_sig: &[u8]) -> Result<(), Error> {
        write_tx_input(w, txi, script_sig)
    }

    fn write_output(
        &self,
        w: &mut impl Writer,
        amount: u64,
        _script_version: u16,
        script_pubkey: &[u8],
    ) -> Result<(), Error> {
        write_tx_output(w, amount, script_pubkey)
    }

    fn commitment_add_input(&mut self, txi: &TxInput) -> Result<(), Error> {
        write_tx_hash(&mut self.h_prevouts, &txi.prev_hash)?;
        write_u32(&mut self.h_prevouts, txi.prev_index)?;
        write_u32(&mut self.h_sequence, txi.sequence)
    }

    fn commitment_add_output(&mut self, amount: u64, _script_version: u16, script_pubkey: &[u8]) -> Result<(), Error> {
        write_tx_output(&mut self.h_outputs, amount, script_pubkey)
    }

    fn sighash(
        &self,
        tx: &SignTx,
        _index: u32,
        txi: &TxInput,
        script_code: &[u8],
        hash_type: u32,
    ) -> Result<[u8; 32], Error> {
        let double = self.coin.has(CoinFlags::SIGN_HASH_DOUBLE);
        let amount = txi.amount.ok_or(Error::MissingAmount)?;

        let mut h = Sha256Writer::default();

        write_u32(&mut h, tx.version)?;
        h.write_bytes(&self.h_prevouts.tx_hash(double, false))?;
        h.write_bytes(&self.h_sequence.tx_hash(double, false))?;

        write_tx_hash(&mut h, &txi.prev_hash)?;
        write_u32(&mut h, txi.prev_index)?;

        write_bytes_prefixed(&mut h, script_code)?;
        write_u64(&mut h, amount)?;
        write_u32(&mut h, txi.sequence)?;

        h.write_bytes(&self.h_outputs.tx_hash(double, false))?;
        write_u32(&mut h, tx.lock_time)?;
        write_u32(&mut h, hash_type)?;

        Ok(h.tx_hash(double, false))
    }
}

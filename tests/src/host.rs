// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Reference host, answering engine requests from a known transaction
//!
//! This mirrors the loop a wallet runs against a device: forward every
//! request to the transaction / previous transaction data it names, show
//! confirmations to the user, and concatenate serialized chunks until the
//! engine reports completion.

use std::collections::HashMap;

use anyhow::{anyhow, Context};
use bitcoin::hashes::Hash;
use log::{debug, info};

use ledger_btc_core::{
    coin::{CoinFlags, CoinInfo},
    engine::{Driver, Engine, Error, Event, Output, Serialized},
    hash::HashWriter,
    serialize::Strategy,
    tx::{PrevInput, PrevOutput, PrevTx, Script, SignTx, TxHash, TxInput, TxOutput},
    writers::write_varint,
};

/// Previous transaction, as held by the host
#[derive(Clone, PartialEq, Debug)]
pub struct PrevTxData {
    pub meta: PrevTx,
    pub inputs: Vec<PrevInput>,
    pub outputs: Vec<PrevOutput>,
}

impl PrevTxData {
    /// Convert a bitcoin transaction
    pub fn from_bitcoin(tx: &bitcoin::Transaction) -> anyhow::Result<Self> {
        let meta = PrevTx {
            version: tx.version.0 as u32,
            lock_time: tx.lock_time.to_consensus_u32(),
            inputs_count: tx.input.len() as u32,
            outputs_count: tx.output.len() as u32,
            expiry: 0,
        };

        let inputs = tx
            .input
            .iter()
            .map(|i| {
                Ok(PrevInput {
                    prev_hash: display_hash(i.previous_output.txid.to_byte_array()),
                    prev_index: i.previous_output.vout,
                    script_sig: to_script(i.script_sig.as_bytes())?,
                    sequence: i.sequence.0,
                    decred_tree: 0,
                })
            })
            .collect::<anyhow::Result<_>>()?;

        let outputs = tx
            .output
            .iter()
            .map(|o| {
                Ok(PrevOutput {
                    amount: o.value.to_sat(),
                    script_pubkey: to_script(o.script_pubkey.as_bytes())?,
                    decred_script_version: 0,
                })
            })
            .collect::<anyhow::Result<_>>()?;

        Ok(Self {
            meta,
            inputs,
            outputs,
        })
    }

    /// Compute the transaction hash (display order) using a strategy's
    /// serialization
    pub fn hash<S: Strategy>(&self, coin: &'static CoinInfo) -> Result<TxHash, Error> {
        let tx = SignTx {
            version: self.meta.version,
            inputs_count: self.meta.inputs_count,
            outputs_count: self.meta.outputs_count,
            lock_time: self.meta.lock_time,
            expiry: self.meta.expiry,
        };
        let s = S::new(coin, &tx)?;

        let mut h = S::Hasher::default();

        s.write_header(&mut h, self.meta.version, false)?;
        write_varint(&mut h, self.inputs.len() as u64)?;
        for i in &self.inputs {
            s.write_input(&mut h, i, &i.script_sig)?;
        }
        write_varint(&mut h, self.outputs.len() as u64)?;
        for o in &self.outputs {
            s.write_output(&mut h, o.amount, o.decred_script_version, &o.script_pubkey)?;
        }
        s.write_footer(&mut h, self.meta.lock_time, self.meta.expiry)?;

        Ok(h.tx_hash(coin.has(CoinFlags::SIGN_HASH_DOUBLE), true))
    }
}

/// Transaction to be signed, with the previous transactions it spends
#[derive(Clone, PartialEq, Debug, Default)]
pub struct HostTx {
    pub tx: SignTx,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub prev_txs: HashMap<TxHash, PrevTxData>,
}

impl HostTx {
    /// Create a transaction from its inputs and outputs
    pub fn new(version: u32, lock_time: u32, inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        let tx = SignTx {
            version,
            inputs_count: inputs.len() as u32,
            outputs_count: outputs.len() as u32,
            lock_time,
            expiry: 0,
        };

        Self {
            tx,
            inputs,
            outputs,
            prev_txs: HashMap::new(),
        }
    }

    /// Add a previous transaction under its hash
    pub fn with_prev(mut self, hash: TxHash, prev: PrevTxData) -> Self {
        self.prev_txs.insert(hash, prev);
        self
    }

    fn prev(&self, hash: &TxHash) -> anyhow::Result<&PrevTxData> {
        self.prev_txs
            .get(hash)
            .ok_or_else(|| anyhow!("unknown previous transaction {}", hex::encode(hash)))
    }
}

/// Result of a signing session
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Signed {
    /// Signed transaction, concatenated from all chunks
    pub tx: Vec<u8>,
    /// Non-empty chunks, in order of receipt
    pub chunks: Vec<Vec<u8>>,
    /// Signatures by input index
    pub signatures: Vec<(u32, Vec<u8>)>,
    /// Confirmations shown to the user
    pub confirmations: Vec<Output>,
}

impl Signed {
    fn collect(&mut self, s: &Serialized) {
        if !s.tx.is_empty() {
            self.tx.extend_from_slice(&s.tx);
            self.chunks.push(s.tx.to_vec());
        }
        if let Some((index, sig)) = &s.signature {
            self.signatures.push((*index, sig.to_vec()));
        }
    }
}

/// Run a signing session to completion, answering confirmations with
/// `approve`
pub fn sign<DRV: Driver, S: Strategy>(
    engine: &mut Engine<DRV, S>,
    host: &HostTx,
    mut approve: impl FnMut(&Output) -> bool,
) -> anyhow::Result<Signed> {
    let mut signed = Signed::default();

    let mut out = engine
        .update(&Event::TxInit { tx: host.tx })
        .context("tx init")?;

    loop {
        if let Some(s) = out.serialized() {
            signed.collect(s);
        }

        let r = match &out {
            Output::TxInput {
                index,
                prev_hash: None,
                ..
            } => engine.update(&Event::TxInput {
                index: *index,
                input: item(&host.inputs, *index)?,
            }),
            Output::TxInput {
                index,
                prev_hash: Some(h),
                ..
            } => engine.update(&Event::PrevInput {
                index: *index,
                input: item(&host.prev(h)?.inputs, *index)?,
            }),
            Output::TxOutput {
                index,
                prev_hash: None,
                ..
            } => engine.update(&Event::TxOutput {
                index: *index,
                output: item(&host.outputs, *index)?,
            }),
            Output::TxOutput {
                index,
                prev_hash: Some(h),
                ..
            } => engine.update(&Event::PrevOutput {
                index: *index,
                output: item(&host.prev(h)?.outputs, *index)?,
            }),
            Output::TxMeta { prev_hash, .. } => engine.update(&Event::PrevMeta {
                tx: host.prev(prev_hash)?.meta,
            }),
            o if o.is_confirmation() => {
                let approved = approve(o);
                info!("confirmation {:?}: {}", o, approved);

                signed.confirmations.push(o.clone());
                engine.update(&Event::Approval(approved))
            }
            Output::Finished { .. } => break,
            o => return Err(anyhow!("unexpected output: {:?}", o)),
        };

        out = r.with_context(|| format!("engine state {}", engine.state()))?;
    }

    debug!("signed tx: {}", hex::encode(&signed.tx));

    Ok(signed)
}

fn item<T>(items: &[T], index: u32) -> anyhow::Result<&T> {
    items
        .get(index as usize)
        .ok_or_else(|| anyhow!("requested index {} out of range", index))
}

/// Reverse an internal-order hash for display
pub fn display_hash(mut h: [u8; 32]) -> TxHash {
    h.reverse();
    h
}

fn to_script(b: &[u8]) -> anyhow::Result<Script> {
    Script::from_slice(b).map_err(|_| anyhow!("script too long ({} bytes)", b.len()))
}

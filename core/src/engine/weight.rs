// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Transaction weight estimation, used for fee rate checks
//!
//! Estimates assume maximum length signatures, so the computed weight is an
//! upper bound for the signed transaction.

use crate::{
    tx::{InputScriptType, TxInput},
    writers::{op_push_size, varint_size},
};

const TXSIZE_HEADER: usize = 4;
const TXSIZE_FOOTER: usize = 4;
/// Segwit marker and flag
const TXSIZE_SEGWIT_OVERHEAD: usize = 2;
/// Outpoint and sequence
const TXSIZE_INPUT: usize = 40;
/// Amount
const TXSIZE_OUTPUT: usize = 8;
const TXSIZE_PUBKEY: usize = 33;
const TXSIZE_SIGNATURE: usize = 72;
/// OP_m, OP_n, OP_CHECKMULTISIG
const TXSIZE_MULTISIGSCRIPT: usize = 3;
const TXSIZE_WITNESSPKHASH: usize = 22;
const TXSIZE_WITNESSSCRIPT: usize = 34;

/// Non-witness bytes count four times
const WITNESS_SCALE: usize = 4;

#[derive(Clone, PartialEq, Debug)]
pub struct TxWeightCalculator {
    inputs_count: usize,
    counter: usize,
    segwit: bool,
}

impl TxWeightCalculator {
    pub const fn new(inputs_count: usize, outputs_count: usize) -> Self {
        Self {
            inputs_count,
            counter: WITNESS_SCALE
                * (TXSIZE_HEADER
                    + TXSIZE_FOOTER
                    + varint_size(inputs_count as u64)
                    + varint_size(outputs_count as u64)),
            segwit: false,
        }
    }

    fn add_witness_header(&mut self) {
        if !self.segwit {
            self.counter += TXSIZE_SEGWIT_OVERHEAD;
            self.counter += varint_size(self.inputs_count as u64);
            self.segwit = true;
        }
    }

    pub fn add_input(&mut self, txi: &TxInput) {
        let mut script_size = match &txi.multisig {
            Some(ms) => {
                let redeem = TXSIZE_MULTISIGSCRIPT + ms.pubkeys.len() * (1 + TXSIZE_PUBKEY);
                1 + ms.m as usize * (1 + TXSIZE_SIGNATURE) + op_push_size(redeem) + redeem
            }
            None => 1 + TXSIZE_SIGNATURE + 1 + TXSIZE_PUBKEY,
        };

        self.counter += WITNESS_SCALE * TXSIZE_INPUT;

        match txi.script_type {
            InputScriptType::SpendAddress | InputScriptType::SpendMultisig => {
                script_size += varint_size(script_size as u64);
                self.counter += WITNESS_SCALE * script_size;
            }
            InputScriptType::SpendWitness | InputScriptType::SpendP2shWitness => {
                self.add_witness_header();

                if txi.script_type == InputScriptType::SpendP2shWitness {
                    let redeem = match txi.multisig {
                        Some(_) => TXSIZE_WITNESSSCRIPT,
                        None => TXSIZE_WITNESSPKHASH,
                    };
                    self.counter += WITNESS_SCALE * (2 + redeem);
                } else {
                    // Empty script_sig
                    self.counter += WITNESS_SCALE;
                }

                // Witness item count plus items, not scaled
                self.counter += 1 + script_size;
            }
            InputScriptType::External => (),
        }
    }

    pub fn add_output(&mut self, script_pubkey: &[u8]) {
        let size = script_pubkey.len() + varint_size(script_pubkey.len() as u64);
        self.counter += WITNESS_SCALE * (TXSIZE_OUTPUT + size);
    }

    pub fn total(&self) -> usize {
        self.counter
    }
}

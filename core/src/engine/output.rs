// Copyright (c) 2022-2023 The MobileCoin Foundation

use heapless::Vec;
use static_assertions::const_assert;

use crate::tx::{Path, Signature, TxHash, TxOutput, MAX_SCRIPT_SIZE};

use super::State;

/// Maximum serialized chunk returned with a single request
pub const CHUNK_SIZE: usize = 2048;

// A single signed input (outpoint, script, sequence) must fit in a chunk
const_assert!(CHUNK_SIZE >= MAX_SCRIPT_SIZE + 64);

/// Serialized transaction chunk
pub type Chunk = Vec<u8, CHUNK_SIZE>;

/// Signed transaction data produced since the previous request
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Serialized {
    /// Signature for a completed input, with its index
    pub signature: Option<(u32, Signature)>,
    /// Serialized transaction bytes
    pub tx: Chunk,
}

impl Serialized {
    pub fn is_empty(&self) -> bool {
        self.signature.is_none() && self.tx.is_empty()
    }
}

/// [`Engine`][super::Engine] outputs (in response to events), requests for
/// the host or confirmations for the user
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    None,

    /// Engine state
    State { state: State, progress: Option<usize> },

    /// Request an input, from the transaction being signed or
    /// from the previous transaction `prev_hash`
    TxInput {
        index: u32,
        prev_hash: Option<TxHash>,
        serialized: Serialized,
    },

    /// Request an output, from the transaction being signed or
    /// from the previous transaction `prev_hash`
    TxOutput {
        index: u32,
        prev_hash: Option<TxHash>,
        serialized: Serialized,
    },

    /// Request the header of previous transaction `prev_hash`
    TxMeta {
        prev_hash: TxHash,
        serialized: Serialized,
    },

    /// User confirmation of an input spent from a path outside the
    /// wallet layout for its coin and script type
    ConfirmForeignPath { index: u32, address_n: Path },

    /// User confirmation of an output
    ConfirmOutput { index: u32, output: TxOutput },

    /// User confirmation of a fee above the coin threshold
    ConfirmFeeOverThreshold { fee: u64 },

    /// User confirmation of a non-zero lock time
    ConfirmLockTime { lock_time: u32 },

    /// User confirmation of the total spend and fee
    ConfirmTotal { spending: u64, fee: u64 },

    /// Signing complete
    Finished { serialized: Serialized },
}

impl Output {
    /// Fetch serialized data attached to a request
    pub fn serialized(&self) -> Option<&Serialized> {
        match self {
            Output::TxInput { serialized, .. }
            | Output::TxOutput { serialized, .. }
            | Output::TxMeta { serialized, .. }
            | Output::Finished { serialized } => Some(serialized),
            _ => None,
        }
    }

    /// Check whether an output awaits a user decision
    pub fn is_confirmation(&self) -> bool {
        matches!(
            self,
            Output::ConfirmForeignPath { .. }
                | Output::ConfirmOutput { .. }
                | Output::ConfirmFeeOverThreshold { .. }
                | Output::ConfirmLockTime { .. }
                | Output::ConfirmTotal { .. }
        )
    }
}

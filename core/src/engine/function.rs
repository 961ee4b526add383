// Copyright (c) 2022-2023 The MobileCoin Foundation

use crate::{
    hash::HashWriter,
    tx::{PrevTx, PublicKey, Script, TxHash, TxInput},
};

use super::digest::TxCheck;

/// Previous transaction streaming context, establishing the amount of an input
pub struct PrevTxCtx<H: HashWriter> {
    /// Index of the input spending the previous transaction
    pub index: u32,
    /// Expected previous transaction hash, display order
    pub prev_hash: TxHash,
    /// Spent output
    pub prev_index: u32,
    /// Amount claimed by the host, if any
    pub claimed: Option<u64>,
    /// Previous transaction header
    pub meta: Option<PrevTx>,
    /// Previous transaction hash
    pub hasher: H,
    /// Amount of the spent output
    pub amount: Option<u64>,
}

/// Legacy signature context, re-streaming the transaction to build the
/// signature hash for a single input
pub struct LegacyCtx<H: HashWriter> {
    /// Index of the input being signed
    pub index: u32,
    /// Input being signed
    pub txi: TxInput,
    /// Public key for the input
    pub pubkey: PublicKey,
    /// Script code placed in the signed input slot
    pub script_code: Script,
    /// Signature hash
    pub h_sign: H,
    /// Check digest over the re-streamed transaction
    pub check: TxCheck<H>,
}

/// Sub-function contexts, only one of which is active at a time
pub struct Function<H: HashWriter> {
    inner: FunctionType<H>,
}

#[allow(clippy::large_enum_variant)]
enum FunctionType<H: HashWriter> {
    None,
    PrevTx(PrevTxCtx<H>),
    Legacy(LegacyCtx<H>),
}

impl<H: HashWriter> Default for Function<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HashWriter> Function<H> {
    /// Create a new / empty function context
    pub const fn new() -> Self {
        Self {
            inner: FunctionType::None,
        }
    }

    /// Setup previous transaction context
    pub fn prev_tx_init(&mut self, txi: &TxInput, index: u32) -> &mut PrevTxCtx<H> {
        self.inner = FunctionType::PrevTx(PrevTxCtx {
            index,
            prev_hash: txi.prev_hash,
            prev_index: txi.prev_index,
            claimed: txi.amount,
            meta: None,
            hasher: H::default(),
            amount: None,
        });

        match &mut self.inner {
            FunctionType::PrevTx(c) => c,
            // Just assigned
            _ => unreachable!(),
        }
    }

    /// Fetch previous transaction context
    pub fn prev_tx(&mut self) -> Option<&mut PrevTxCtx<H>> {
        match &mut self.inner {
            FunctionType::PrevTx(c) => Some(c),
            _ => None,
        }
    }

    /// Setup legacy signing context
    pub fn legacy_init(
        &mut self,
        index: u32,
        txi: TxInput,
        pubkey: PublicKey,
        script_code: Script,
        h_sign: H,
    ) -> &mut LegacyCtx<H> {
        self.inner = FunctionType::Legacy(LegacyCtx {
            index,
            txi,
            pubkey,
            script_code,
            h_sign,
            check: TxCheck::new(),
        });

        match &mut self.inner {
            FunctionType::Legacy(c) => c,
            // Just assigned
            _ => unreachable!(),
        }
    }

    /// Fetch legacy signing context
    pub fn legacy(&mut self) -> Option<&mut LegacyCtx<H>> {
        match &mut self.inner {
            FunctionType::Legacy(c) => Some(c),
            _ => None,
        }
    }

    /// Take legacy signing context, clearing the function
    pub fn take_legacy(&mut self) -> Option<LegacyCtx<H>> {
        match core::mem::replace(&mut self.inner, FunctionType::None) {
            FunctionType::Legacy(c) => Some(c),
            other => {
                self.inner = other;
                None
            }
        }
    }

    /// Clear context
    pub fn clear(&mut self) {
        self.inner = FunctionType::None;
    }

    pub fn is_none(&self) -> bool {
        matches!(self.inner, FunctionType::None)
    }
}

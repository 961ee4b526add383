// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Change output detection
//!
//! A [MatchChecker] accumulates an attribute shared by every input of the
//! transaction, allowing outputs with the same attribute to be treated as
//! change. Once an output has been checked the accumulated value is frozen.

use core::fmt::Debug;

use super::Error;
use crate::{
    multisig,
    tx::{Path, TxInput, TxOutput},
};

/// Levels of a wallet path below the account (chain and address index)
const BIP32_WALLET_DEPTH: usize = 2;

/// Attribute extracted from inputs and outputs for matching
pub trait Attribute {
    type Value: Clone + PartialEq + Debug;

    fn from_input(txi: &TxInput) -> Option<Self::Value>;

    fn from_output(txo: &TxOutput) -> Option<Self::Value>;
}

/// Accumulated match state
#[derive(Clone, PartialEq, Debug)]
pub enum MatchState<V> {
    /// No inputs seen
    Undefined,
    /// All inputs share this value
    Matching(V),
    /// Inputs disagree, terminal
    Mismatch,
}

#[derive(Clone, Debug)]
pub struct MatchChecker<A: Attribute> {
    state: MatchState<A::Value>,
    read_only: bool,
}

impl<A: Attribute> Default for MatchChecker<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Attribute> MatchChecker<A> {
    pub const fn new() -> Self {
        Self {
            state: MatchState::Undefined,
            read_only: false,
        }
    }

    pub fn state(&self) -> &MatchState<A::Value> {
        &self.state
    }

    /// Accumulate the attribute of a pass 1 input
    pub fn update_with_input(&mut self, txi: &TxInput) -> Result<(), Error> {
        if self.read_only {
            return Err(Error::InvalidState);
        }

        let state = core::mem::replace(&mut self.state, MatchState::Mismatch);

        self.state = match (state, A::from_input(txi)) {
            (MatchState::Undefined, Some(v)) => MatchState::Matching(v),
            (MatchState::Matching(a), Some(v)) if a == v => MatchState::Matching(a),
            _ => MatchState::Mismatch,
        };

        Ok(())
    }

    /// Check a pass 2 input against the accumulated attribute
    pub fn recheck_input(&self, txi: &TxInput) -> Result<(), Error> {
        match &self.state {
            MatchState::Mismatch => Ok(()),
            MatchState::Matching(v) if A::from_input(txi).as_ref() == Some(v) => Ok(()),
            _ => Err(Error::TxChanged),
        }
    }

    /// Check whether an output shares the accumulated attribute,
    /// freezing the checker
    pub fn output_matches(&mut self, txo: &TxOutput) -> bool {
        self.read_only = true;

        match &self.state {
            MatchState::Matching(v) => A::from_output(txo).as_ref() == Some(v),
            _ => false,
        }
    }
}

/// Derivation path with the chain and address index stripped
pub struct WalletPath;

fn wallet_path(address_n: &Path) -> Option<Path> {
    if address_n.len() <= BIP32_WALLET_DEPTH {
        return None;
    }

    Path::from_slice(&address_n[..address_n.len() - BIP32_WALLET_DEPTH]).ok()
}

impl Attribute for WalletPath {
    type Value = Path;

    fn from_input(txi: &TxInput) -> Option<Path> {
        wallet_path(&txi.address_n)
    }

    fn from_output(txo: &TxOutput) -> Option<Path> {
        wallet_path(&txo.address_n)
    }
}

/// Multisig key set / threshold fingerprint
pub struct MultisigFingerprint;

impl Attribute for MultisigFingerprint {
    type Value = [u8; 32];

    fn from_input(txi: &TxInput) -> Option<[u8; 32]> {
        txi.multisig.as_ref().and_then(|m| multisig::fingerprint(m).ok())
    }

    fn from_output(txo: &TxOutput) -> Option<[u8; 32]> {
        txo.multisig.as_ref().and_then(|m| multisig::fingerprint(m).ok())
    }
}

pub type WalletPathChecker = MatchChecker<WalletPath>;

pub type MultisigFingerprintChecker = MatchChecker<MultisigFingerprint>;

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signing session, driving the multi-pass signing protocol for a single
//! transaction.
//!
//! Pass 1 collects inputs (streaming previous transactions where amounts
//! are not committed by the signature hash) and outputs, building the check
//! digests, commitments and change detection state the user then confirms.
//! Pass 2 requests every item again, checking it against the confirmed data
//! while producing signatures and the serialized transaction.

use zeroize::Zeroize;

use super::{
    digest::TxCheck, function::Function, matchcheck::*, output::Chunk, weight::TxWeightCalculator,
    Driver, Error, Event, LegacyState, Output, PrevTxState, Serialized, SigningNode, State,
};
use crate::{
    coin::{CoinInfo, BIP32_CHANGE_CHAIN, BIP32_MAX_LAST_ELEMENT},
    scripts,
    serialize::{InputMode, Strategy},
    tx::{
        OutputScriptType, Path, PublicKey, Script, SignTx, Signature, TxHash, TxOutput, MAX_INPUTS,
    },
};

mod inputs;
mod outputs;
mod sign;

/// Set of input indices confirmed as segwit in pass 1
struct SegwitInputs([u32; MAX_INPUTS / 32]);

impl SegwitInputs {
    const fn new() -> Self {
        Self([0; MAX_INPUTS / 32])
    }

    fn insert(&mut self, index: u32) -> Result<(), Error> {
        let w = self
            .0
            .get_mut(index as usize / 32)
            .ok_or(Error::InvalidCount)?;
        *w |= 1 << (index % 32);

        Ok(())
    }

    fn contains(&self, index: u32) -> bool {
        match self.0.get(index as usize / 32) {
            Some(w) => w & (1 << (index % 32)) != 0,
            None => false,
        }
    }
}

/// Signing session state, discarded on completion or error
pub struct Signer<S: Strategy> {
    tx: SignTx,
    coin: &'static CoinInfo,
    strategy: S,

    /// Change detection
    wallet_path: WalletPathChecker,
    multisig: MultisigFingerprintChecker,

    /// Running totals
    total_in: u64,
    total_out: u64,
    change_out: u64,

    /// Amount and count of inputs with amounts committed by the signature
    /// hash, drawn down as they are signed
    bip143_in: u64,
    bip143_count: u32,

    any_segwit: bool,
    segwit: SegwitInputs,

    weight: TxWeightCalculator,

    /// Pass 1 check digest, the transaction as confirmed
    confirmed: TxCheck<S::Hasher>,
    /// Pass 2 check digest
    restream: TxCheck<S::Hasher>,

    /// Serialized transaction pending flush to the host
    chunk: Chunk,
    /// Signature pending flush to the host
    signature: Option<(u32, Signature)>,

    function: Function<S::Hasher>,

    progress: usize,
}

impl<S: Strategy> Signer<S> {
    /// Create a new signing session for the provided transaction
    pub fn new(coin: &'static CoinInfo, tx: &SignTx) -> Result<Self, Error> {
        if tx.inputs_count == 0
            || tx.outputs_count == 0
            || tx.inputs_count as usize > MAX_INPUTS
        {
            return Err(Error::InvalidCount);
        }

        let strategy = S::new(coin, tx)?;

        Ok(Self {
            tx: *tx,
            coin,
            strategy,
            wallet_path: WalletPathChecker::new(),
            multisig: MultisigFingerprintChecker::new(),
            total_in: 0,
            total_out: 0,
            change_out: 0,
            bip143_in: 0,
            bip143_count: 0,
            any_segwit: false,
            segwit: SegwitInputs::new(),
            weight: TxWeightCalculator::new(tx.inputs_count as usize, tx.outputs_count as usize),
            confirmed: TxCheck::new(),
            restream: TxCheck::new(),
            chunk: Chunk::new(),
            signature: None,
            function: Function::new(),
            progress: 0,
        })
    }

    /// Start the session, requesting the first input
    pub fn begin(&mut self) -> Result<(State, Output), Error> {
        self.strategy.begin(&mut self.chunk, &self.tx)?;

        Ok((State::CollectInputs(0), self.request_input(0, None)))
    }

    /// Handle an event for the current state, returning the next state
    /// and the request / confirmation to emit
    pub fn update<D: Driver>(
        &mut self,
        state: State,
        evt: &Event,
        drv: &D,
    ) -> Result<(State, Output), Error> {
        match (state, evt) {
            (State::CollectInputs(n), Event::TxInput { index, input }) => {
                self.collect_input(n, *index, input)
            }

            (State::PrevTx(PrevTxState::Meta), Event::PrevMeta { tx }) => self.prev_meta(tx),
            (State::PrevTx(PrevTxState::Input(n)), Event::PrevInput { index, input }) => {
                self.prev_input(n, *index, input)
            }
            (State::PrevTx(PrevTxState::Output(n)), Event::PrevOutput { index, output }) => {
                self.prev_output(n, *index, output)
            }

            (State::ConfirmForeignPath(n), Event::Approval(approved)) => {
                self.foreign_path_approved(n, *approved)
            }

            (State::ConfirmOutputs(n), Event::TxOutput { index, output }) => {
                self.confirm_output(n, *index, output, drv)
            }
            (State::ConfirmOutput(n), Event::Approval(approved)) => {
                self.output_approved(n, *approved)
            }
            (State::ConfirmTotal(s), Event::Approval(approved)) => self.total_approved(s, *approved),

            (State::SignInputs(n), Event::TxInput { index, input }) => {
                self.sign_input(n, *index, input, drv)
            }
            (State::SignLegacy(LegacyState::Input(n)), Event::TxInput { index, input }) => {
                self.legacy_input(n, *index, input)
            }
            (State::SignLegacy(LegacyState::Output(n)), Event::TxOutput { index, output }) => {
                self.legacy_output(n, *index, output, drv)
            }
            (State::SerializeOutputs(n), Event::TxOutput { index, output }) => {
                self.serialize_output(n, *index, output, drv)
            }
            (State::SignSegwitInputs(n), Event::TxInput { index, input }) => {
                self.sign_segwit_input(n, *index, input, drv)
            }

            _ => Err(Error::UnexpectedEvent),
        }
    }

    /// Signing progress, percent
    pub fn progress(&self) -> usize {
        let (i, o) = (self.tx.inputs_count as usize, self.tx.outputs_count as usize);

        let mut total = 2 * i + o;
        if S::SERIALIZE_OUTPUTS {
            total += o;
        }
        if S::WITNESS_STAGE && self.any_segwit {
            total += i;
        }

        (self.progress * 100 / total).min(100)
    }

    /// Take serialized data pending flush
    fn serialized(&mut self) -> Serialized {
        Serialized {
            signature: self.signature.take(),
            tx: core::mem::take(&mut self.chunk),
        }
    }

    fn request_input(&mut self, index: u32, prev_hash: Option<TxHash>) -> Output {
        Output::TxInput {
            index,
            prev_hash,
            serialized: self.serialized(),
        }
    }

    fn request_output(&mut self, index: u32, prev_hash: Option<TxHash>) -> Output {
        Output::TxOutput {
            index,
            prev_hash,
            serialized: self.serialized(),
        }
    }

    /// Attach a signature to the next request
    fn set_signature(&mut self, index: u32, signature: Signature) -> Result<(), Error> {
        if self.signature.is_some() {
            return Err(Error::InvalidState);
        }

        #[cfg(feature = "log")]
        log::info!("signed input {}", index);

        self.signature = Some((index, signature));

        Ok(())
    }

    /// Derive the signing node for a path
    fn derive<D: Driver>(&self, drv: &D, path: &Path) -> Result<D::Node, Error> {
        drv.derive(path, self.coin.curve_name)
    }

    /// Fetch the public key for a path
    fn public_key<D: Driver>(&self, drv: &D, path: &Path) -> Result<PublicKey, Error> {
        let mut node = self.derive(drv, path)?;
        let pubkey = node.public_key();
        node.zeroize();

        Ok(pubkey)
    }

    /// Resolve the locking script for an output
    fn output_script<D: Driver>(&self, drv: &D, txo: &TxOutput) -> Result<Script, Error> {
        if txo.script_type == OutputScriptType::PayToOpReturn {
            if txo.amount != 0 || txo.address.is_some() || !txo.address_n.is_empty() {
                return Err(Error::InvalidOutput);
            }

            let data = txo.op_return_data.as_ref().ok_or(Error::InvalidOutput)?;
            return scripts::output_script_op_return(data);
        }

        match (&txo.address, txo.address_n.is_empty()) {
            (Some(address), true) => scripts::address_to_script(self.coin, address),
            (None, false) => {
                let pubkey = self.public_key(drv, &txo.address_n)?;
                scripts::change_script(self.coin, txo.script_type, &pubkey, txo.multisig.as_ref())
            }
            _ => Err(Error::InvalidOutput),
        }
    }

    /// Check whether an output pays back to the wallet spending the inputs
    fn output_is_change(&mut self, txo: &TxOutput) -> bool {
        use OutputScriptType::*;

        if !matches!(
            txo.script_type,
            PayToAddress | PayToMultisig | PayToWitness | PayToP2shWitness
        ) {
            return false;
        }

        if txo.multisig.is_some() && !self.multisig.output_matches(txo) {
            return false;
        }

        let n = txo.address_n.len();

        self.wallet_path.output_matches(txo)
            && n >= 2
            && txo.address_n[n - 2] <= BIP32_CHANGE_CHAIN
            && txo.address_n[n - 1] <= BIP32_MAX_LAST_ELEMENT
            && txo.amount > 0
    }

    /// Check a pass 2 input is signed the way it was confirmed, non-segwit
    /// inputs share a single mode per coin
    fn check_mode(&self, index: u32, mode: InputMode) -> Result<(), Error> {
        if self.segwit.contains(index) != (mode == InputMode::Segwit) {
            #[cfg(feature = "log")]
            log::warn!("input {} signing mode changed to {}", index, mode);

            return Err(Error::TxChanged);
        }

        Ok(())
    }

    /// Check pass 2 data against the confirmed transaction
    fn verify_restream(&self) -> Result<(), Error> {
        if let Err(e) = self.restream.verify(&self.confirmed, S::SERIALIZE_OUTPUTS) {
            #[cfg(feature = "log")]
            log::warn!(
                "transaction changed between passes: {:?} (confirmed {:?})",
                self.restream,
                self.confirmed
            );

            return Err(e);
        }

        Ok(())
    }
}

/// Check a streamed item carries the requested index
fn expect_index(expected: u32, index: u32) -> Result<(), Error> {
    if index != expected {
        #[cfg(feature = "log")]
        log::warn!("unexpected index {} (expected {})", index, expected);

        return Err(Error::UnexpectedIndex);
    }

    Ok(())
}

/// Accumulate an amount
fn add_amount(total: u64, amount: u64) -> Result<u64, Error> {
    total.checked_add(amount).ok_or(Error::AmountOverflow)
}

/// Sign a digest with a node, returning the DER encoded signature
fn sign_digest<N: SigningNode>(node: &N, digest: &[u8; 32]) -> Result<Signature, Error> {
    let compact = node.sign(digest)?;
    crate::helpers::der_encode_signature(&compact)
}

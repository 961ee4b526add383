// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Pass 1 inputs, with previous transaction streaming for inputs whose
//! amount is not committed by the signature hash

use super::{add_amount, expect_index, Signer};
use crate::{
    coin::CoinFlags,
    engine::{Error, Output, PrevTxState, State},
    hash::HashWriter,
    multisig,
    serialize::{InputMode, Strategy},
    tx::{InputScriptType, PrevInput, PrevOutput, PrevTx, TxInput},
    writers::write_varint,
};

impl<S: Strategy> Signer<S> {
    /// Handle a pass 1 input
    pub(super) fn collect_input(
        &mut self,
        n: u32,
        index: u32,
        txi: &TxInput,
    ) -> Result<(State, Output), Error> {
        expect_index(n, index)?;

        let mode = self.strategy.input_mode(txi)?;

        if let Some(ms) = &txi.multisig {
            multisig::validate(ms)?;
        } else if txi.script_type == InputScriptType::SpendMultisig {
            return Err(Error::InvalidMultisig);
        }

        self.wallet_path.update_with_input(txi)?;
        self.multisig.update_with_input(txi)?;

        self.confirmed.add_input(txi)?;
        self.strategy.commitment_add_input(txi)?;
        self.weight.add_input(txi);

        self.strategy.input_processed(&mut self.chunk, txi)?;

        self.progress += 1;

        #[cfg(feature = "log")]
        log::debug!("input {} ({}): {:?}", index, mode, txi.amount);

        if mode.needs_prev_tx() {
            if mode == InputMode::Prefix && txi.amount.is_none() {
                return Err(Error::MissingAmount);
            }

            self.function.prev_tx_init(txi, index);
        } else if mode.commits_amount() {
            let amount = txi.amount.ok_or(Error::MissingAmount)?;

            self.total_in = add_amount(self.total_in, amount)?;
            self.bip143_in = add_amount(self.bip143_in, amount)?;
            self.bip143_count += 1;
        }

        if mode == InputMode::Segwit {
            self.any_segwit = true;
            self.segwit.insert(index)?;
        }

        if !self.coin.path_is_standard(&txi.address_n, txi.script_type) {
            #[cfg(feature = "log")]
            log::info!("confirm foreign path for input {}: {:?}", index, txi.address_n);

            return Ok((
                State::ConfirmForeignPath(index),
                Output::ConfirmForeignPath {
                    index,
                    address_n: txi.address_n.clone(),
                },
            ));
        }

        self.input_collected(index)
    }

    /// Handle the user response to a foreign path confirmation
    pub(super) fn foreign_path_approved(
        &mut self,
        index: u32,
        approved: bool,
    ) -> Result<(State, Output), Error> {
        if !approved {
            return Err(Error::UserDenied);
        }

        self.input_collected(index)
    }

    /// Stream the previous transaction where the input amount depends on
    /// it, otherwise continue with the next input
    fn input_collected(&mut self, index: u32) -> Result<(State, Output), Error> {
        if let Some(ctx) = self.function.prev_tx() {
            let prev_hash = ctx.prev_hash;

            return Ok((
                State::PrevTx(PrevTxState::Meta),
                Output::TxMeta {
                    prev_hash,
                    serialized: self.serialized(),
                },
            ));
        }

        self.next_input(index)
    }

    /// Request the next input, or move on to the outputs
    fn next_input(&mut self, index: u32) -> Result<(State, Output), Error> {
        if index + 1 < self.tx.inputs_count {
            return Ok((
                State::CollectInputs(index + 1),
                self.request_input(index + 1, None),
            ));
        }

        #[cfg(feature = "log")]
        log::debug!("inputs complete, total in: {}", self.total_in);

        self.strategy.outputs_begin(&mut self.chunk, &self.tx)?;

        Ok((State::ConfirmOutputs(0), self.request_output(0, None)))
    }

    /// Handle the previous transaction header
    pub(super) fn prev_meta(&mut self, meta: &PrevTx) -> Result<(State, Output), Error> {
        let strategy = &self.strategy;
        let ctx = self.function.prev_tx().ok_or(Error::InvalidState)?;

        if ctx.prev_index >= meta.outputs_count {
            return Err(Error::InvalidPrevIndex);
        }

        strategy.write_header(&mut ctx.hasher, meta.version, false)?;
        write_varint(&mut ctx.hasher, meta.inputs_count as u64)?;

        ctx.meta = Some(*meta);
        let prev_hash = ctx.prev_hash;

        if meta.inputs_count == 0 {
            return self.prev_outputs_begin();
        }

        Ok((
            State::PrevTx(PrevTxState::Input(0)),
            self.request_input(0, Some(prev_hash)),
        ))
    }

    /// Handle a previous transaction input
    pub(super) fn prev_input(
        &mut self,
        n: u32,
        index: u32,
        input: &PrevInput,
    ) -> Result<(State, Output), Error> {
        expect_index(n, index)?;

        let strategy = &self.strategy;
        let ctx = self.function.prev_tx().ok_or(Error::InvalidState)?;
        let meta = ctx.meta.ok_or(Error::InvalidState)?;

        strategy.write_input(&mut ctx.hasher, input, &input.script_sig)?;

        if index + 1 < meta.inputs_count {
            let prev_hash = ctx.prev_hash;

            return Ok((
                State::PrevTx(PrevTxState::Input(index + 1)),
                self.request_input(index + 1, Some(prev_hash)),
            ));
        }

        self.prev_outputs_begin()
    }

    fn prev_outputs_begin(&mut self) -> Result<(State, Output), Error> {
        let ctx = self.function.prev_tx().ok_or(Error::InvalidState)?;
        let meta = ctx.meta.ok_or(Error::InvalidState)?;

        write_varint(&mut ctx.hasher, meta.outputs_count as u64)?;
        let prev_hash = ctx.prev_hash;

        Ok((
            State::PrevTx(PrevTxState::Output(0)),
            self.request_output(0, Some(prev_hash)),
        ))
    }

    /// Handle a previous transaction output
    pub(super) fn prev_output(
        &mut self,
        n: u32,
        index: u32,
        output: &PrevOutput,
    ) -> Result<(State, Output), Error> {
        expect_index(n, index)?;

        let strategy = &self.strategy;
        let ctx = self.function.prev_tx().ok_or(Error::InvalidState)?;
        let meta = ctx.meta.ok_or(Error::InvalidState)?;

        strategy.write_output(
            &mut ctx.hasher,
            output.amount,
            output.decred_script_version,
            &output.script_pubkey,
        )?;

        if index == ctx.prev_index {
            strategy.check_prev_output(output)?;
            ctx.amount = Some(output.amount);
        }

        if index + 1 < meta.outputs_count {
            let prev_hash = ctx.prev_hash;

            return Ok((
                State::PrevTx(PrevTxState::Output(index + 1)),
                self.request_output(index + 1, Some(prev_hash)),
            ));
        }

        self.prev_tx_complete()
    }

    /// Check the streamed previous transaction against its hash, and
    /// account the spent amount
    fn prev_tx_complete(&mut self) -> Result<(State, Output), Error> {
        let double = self.coin.has(CoinFlags::SIGN_HASH_DOUBLE);

        let strategy = &self.strategy;
        let ctx = self.function.prev_tx().ok_or(Error::InvalidState)?;
        let meta = ctx.meta.ok_or(Error::InvalidState)?;

        strategy.write_footer(&mut ctx.hasher, meta.lock_time, meta.expiry)?;

        if ctx.hasher.tx_hash(double, true) != ctx.prev_hash {
            #[cfg(feature = "log")]
            log::warn!("previous transaction hash mismatch for input {}", ctx.index);

            return Err(Error::InvalidPrevHash);
        }

        let amount = ctx.amount.ok_or(Error::InvalidPrevIndex)?;

        if let Some(claimed) = ctx.claimed {
            if claimed != amount {
                return Err(Error::InvalidAmount);
            }
        }

        let index = ctx.index;
        self.function.clear();

        self.total_in = add_amount(self.total_in, amount)?;

        self.next_input(index)
    }
}

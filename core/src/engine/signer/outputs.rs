// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Pass 1 outputs and user confirmations

use super::{add_amount, expect_index, Signer};
use crate::{
    coin::CoinFlags,
    engine::{Driver, Error, Output, State, TotalState},
    serialize::Strategy,
    tx::TxOutput,
};

/// Fee rate threshold scale, `maxfee_kb` is per 1000 bytes and weight
/// counts four units per byte
const FEE_THRESHOLD_SCALE: u128 = 4000;

impl<S: Strategy> Signer<S> {
    /// Handle a pass 1 output, requesting confirmation where it is not change
    pub(super) fn confirm_output<D: Driver>(
        &mut self,
        n: u32,
        index: u32,
        txo: &TxOutput,
        drv: &D,
    ) -> Result<(State, Output), Error> {
        expect_index(n, index)?;

        self.strategy.check_output(txo)?;

        let script = self.output_script(drv, txo)?;
        let version = txo.decred_script_version;

        self.weight.add_output(&script);
        self.confirmed.add_output(txo.amount, &script)?;
        self.strategy
            .commitment_add_output(txo.amount, version, &script)?;
        self.strategy
            .output_processed(&mut self.chunk, txo.amount, version, &script)?;

        self.total_out = add_amount(self.total_out, txo.amount)?;
        self.progress += 1;

        // Inputs are complete, so outputs may never exceed them
        if self.total_out > self.total_in && !self.coin.has(CoinFlags::NEGATIVE_FEE) {
            #[cfg(feature = "log")]
            log::error!(
                "outputs exceed inputs ({} > {})",
                self.total_out,
                self.total_in
            );

            return Err(Error::NotEnoughFunds);
        }

        // Only the first change output is treated as such
        if self.change_out == 0 && self.output_is_change(txo) {
            #[cfg(feature = "log")]
            log::info!(
                "output {} is change: {}",
                index,
                crate::helpers::fmt_amount(txo.amount, self.coin)
            );

            self.change_out = txo.amount;

            return self.next_output(index);
        }

        #[cfg(feature = "log")]
        log::info!(
            "confirm output {}: {} to {:?}",
            index,
            crate::helpers::fmt_amount(txo.amount, self.coin),
            txo.address
        );

        Ok((
            State::ConfirmOutput(index),
            Output::ConfirmOutput {
                index,
                output: txo.clone(),
            },
        ))
    }

    /// Handle the user response to an output confirmation
    pub(super) fn output_approved(
        &mut self,
        index: u32,
        approved: bool,
    ) -> Result<(State, Output), Error> {
        if !approved {
            return Err(Error::UserDenied);
        }

        self.next_output(index)
    }

    fn next_output(&mut self, index: u32) -> Result<(State, Output), Error> {
        if index + 1 < self.tx.outputs_count {
            return Ok((
                State::ConfirmOutputs(index + 1),
                self.request_output(index + 1, None),
            ));
        }

        self.strategy.outputs_end(&mut self.chunk, &self.tx)?;

        let fee = self.fee();
        let weight = self.weight.total() as u128;

        #[cfg(feature = "log")]
        log::debug!(
            "outputs complete, total out: {} fee: {} weight: {}",
            self.total_out,
            fee,
            weight
        );

        if fee as u128 * FEE_THRESHOLD_SCALE > self.coin.maxfee_kb as u128 * weight {
            #[cfg(feature = "log")]
            log::info!(
                "confirm fee over threshold: {}",
                crate::helpers::fmt_amount(fee, self.coin)
            );

            return Ok((
                State::ConfirmTotal(TotalState::FeeOverThreshold),
                Output::ConfirmFeeOverThreshold { fee },
            ));
        }

        self.confirm_lock_time()
    }

    fn confirm_lock_time(&mut self) -> Result<(State, Output), Error> {
        if self.tx.lock_time == 0 {
            return self.confirm_total();
        }

        #[cfg(feature = "log")]
        log::info!("confirm lock time: {}", self.tx.lock_time);

        Ok((
            State::ConfirmTotal(TotalState::LockTime),
            Output::ConfirmLockTime {
                lock_time: self.tx.lock_time,
            },
        ))
    }

    fn confirm_total(&mut self) -> Result<(State, Output), Error> {
        let fee = self.fee();
        let spending = self.total_out - self.change_out + fee;

        #[cfg(feature = "log")]
        log::info!(
            "confirm total: {} fee: {}",
            crate::helpers::fmt_amount(spending, self.coin),
            crate::helpers::fmt_amount(fee, self.coin)
        );

        Ok((
            State::ConfirmTotal(TotalState::Total),
            Output::ConfirmTotal { spending, fee },
        ))
    }

    /// Handle the user response to a fee / lock time / total confirmation
    pub(super) fn total_approved(
        &mut self,
        state: TotalState,
        approved: bool,
    ) -> Result<(State, Output), Error> {
        if !approved {
            return Err(Error::UserDenied);
        }

        match state {
            TotalState::FeeOverThreshold => self.confirm_lock_time(),
            TotalState::LockTime => self.confirm_total(),
            TotalState::Total => self.begin_signing(),
        }
    }

    /// Transaction fee, zero where outputs exceed inputs
    fn fee(&self) -> u64 {
        self.total_in.saturating_sub(self.total_out)
    }
}

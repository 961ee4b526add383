// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Pass 2, signing and serialization

use zeroize::Zeroize;

use super::{expect_index, sign_digest, Signer};
use crate::{
    coin::CoinFlags,
    engine::{Driver, Error, LegacyState, Output, SigningNode, State},
    hash::HashWriter,
    scripts,
    serialize::{InputMode, Strategy},
    tx::{Signature, TxInput, TxOutput},
    writers::{write_u32, write_u8, write_varint, Writer},
};

impl<S: Strategy> Signer<S> {
    /// Start pass 2 following user approval
    pub(super) fn begin_signing(&mut self) -> Result<(State, Output), Error> {
        #[cfg(feature = "log")]
        log::info!("transaction approved, signing");

        self.strategy
            .begin_signing(&mut self.chunk, &self.tx, self.any_segwit)?;

        Ok((State::SignInputs(0), self.request_input(0, None)))
    }

    /// Handle a pass 2 input
    pub(super) fn sign_input<D: Driver>(
        &mut self,
        n: u32,
        index: u32,
        txi: &TxInput,
        drv: &D,
    ) -> Result<(State, Output), Error> {
        expect_index(n, index)?;

        let mode = self.strategy.input_mode(txi)?;
        self.check_mode(index, mode)?;

        self.wallet_path.recheck_input(txi)?;
        self.multisig.recheck_input(txi)?;

        self.restream.add_input(txi)?;
        self.progress += 1;

        let coin = self.coin;
        let hash_type = coin.hash_type();

        if mode.signs_in_pass2() {
            // Signed from the strategy commitment
            if mode.commits_amount() {
                self.draw_amount(txi)?;
            }

            let mut node = self.derive(drv, &txi.address_n)?;
            let r = self
                .commitment_digest(&node, index, txi)
                .and_then(|digest| self.write_signed(&node, txi, &digest));
            node.zeroize();

            self.set_signature(index, r?)?;
        } else if mode == InputMode::Legacy {
            // Re-stream the transaction for the legacy signature hash
            let pubkey = self.public_key(drv, &txi.address_n)?;
            let script_code = scripts::script_code(coin, txi, &pubkey)?;

            let mut h_sign = S::Hasher::default();
            self.strategy
                .write_header(&mut h_sign, self.tx.version, false)?;
            write_varint(&mut h_sign, self.tx.inputs_count as u64)?;

            self.function
                .legacy_init(index, txi.clone(), pubkey, script_code, h_sign);

            return Ok((
                State::SignLegacy(LegacyState::Input(0)),
                self.request_input(0, None),
            ));
        } else {
            // Serialized without signature, signed in the witness stage
            let pubkey = self.public_key(drv, &txi.address_n)?;
            let script_sig = scripts::input_script_sig(coin, txi, &pubkey, None, hash_type)?;

            self.strategy.write_input(&mut self.chunk, txi, &script_sig)?;
        }

        self.next_sign_input(index)
    }

    fn next_sign_input(&mut self, index: u32) -> Result<(State, Output), Error> {
        if index + 1 < self.tx.inputs_count {
            return Ok((
                State::SignInputs(index + 1),
                self.request_input(index + 1, None),
            ));
        }

        if S::SERIALIZE_OUTPUTS {
            write_varint(&mut self.chunk, self.tx.outputs_count as u64)?;

            return Ok((State::SerializeOutputs(0), self.request_output(0, None)));
        }

        self.serialization_complete()
    }

    /// Handle an input re-streamed for a legacy signature
    pub(super) fn legacy_input(
        &mut self,
        n: u32,
        index: u32,
        txi: &TxInput,
    ) -> Result<(State, Output), Error> {
        expect_index(n, index)?;

        let strategy = &self.strategy;
        let ctx = self.function.legacy().ok_or(Error::InvalidState)?;

        ctx.check.add_input(txi)?;

        // Only the input being signed carries its script code, and it must
        // be re-streamed as it was when the script code was derived
        if index == ctx.index {
            if *txi != ctx.txi {
                #[cfg(feature = "log")]
                log::warn!("input {} changed while re-streaming", index);

                return Err(Error::TxChanged);
            }

            strategy.write_input(&mut ctx.h_sign, txi, &ctx.script_code)?;
        } else {
            strategy.write_input(&mut ctx.h_sign, txi, &[])?;
        }

        if index + 1 < self.tx.inputs_count {
            return Ok((
                State::SignLegacy(LegacyState::Input(index + 1)),
                self.request_input(index + 1, None),
            ));
        }

        write_varint(&mut ctx.h_sign, self.tx.outputs_count as u64)?;

        Ok((
            State::SignLegacy(LegacyState::Output(0)),
            self.request_output(0, None),
        ))
    }

    /// Handle an output re-streamed for a legacy signature
    pub(super) fn legacy_output<D: Driver>(
        &mut self,
        n: u32,
        index: u32,
        txo: &TxOutput,
        drv: &D,
    ) -> Result<(State, Output), Error> {
        expect_index(n, index)?;

        self.strategy.check_output(txo)?;
        let script = self.output_script(drv, txo)?;

        let strategy = &self.strategy;
        let ctx = self.function.legacy().ok_or(Error::InvalidState)?;

        ctx.check.add_output(txo.amount, &script)?;
        strategy.write_output(
            &mut ctx.h_sign,
            txo.amount,
            txo.decred_script_version,
            &script,
        )?;

        if index + 1 < self.tx.outputs_count {
            return Ok((
                State::SignLegacy(LegacyState::Output(index + 1)),
                self.request_output(index + 1, None),
            ));
        }

        self.legacy_sign(drv)
    }

    /// Complete a legacy signature once the transaction has been re-streamed
    fn legacy_sign<D: Driver>(&mut self, drv: &D) -> Result<(State, Output), Error> {
        let mut ctx = self.function.take_legacy().ok_or(Error::InvalidState)?;

        write_u32(&mut ctx.h_sign, self.tx.lock_time)?;
        write_u32(&mut ctx.h_sign, self.coin.hash_type())?;

        if let Err(e) = ctx.check.verify(&self.confirmed, true) {
            #[cfg(feature = "log")]
            log::warn!("transaction changed while signing input {}", ctx.index);

            return Err(e);
        }

        let digest = ctx
            .h_sign
            .tx_hash(self.coin.has(CoinFlags::SIGN_HASH_DOUBLE), false);

        let mut node = self.derive(drv, &ctx.txi.address_n)?;
        let r = if node.public_key() == ctx.pubkey {
            self.write_signed(&node, &ctx.txi, &digest)
        } else {
            Err(Error::TxChanged)
        };
        node.zeroize();

        self.set_signature(ctx.index, r?)?;

        self.next_sign_input(ctx.index)
    }

    /// Handle a pass 2 output
    pub(super) fn serialize_output<D: Driver>(
        &mut self,
        n: u32,
        index: u32,
        txo: &TxOutput,
        drv: &D,
    ) -> Result<(State, Output), Error> {
        expect_index(n, index)?;

        self.strategy.check_output(txo)?;
        let script = self.output_script(drv, txo)?;

        self.restream.add_output(txo.amount, &script)?;
        self.strategy.write_output(
            &mut self.chunk,
            txo.amount,
            txo.decred_script_version,
            &script,
        )?;

        self.progress += 1;

        if index + 1 < self.tx.outputs_count {
            return Ok((
                State::SerializeOutputs(index + 1),
                self.request_output(index + 1, None),
            ));
        }

        self.serialization_complete()
    }

    /// Inputs and outputs serialized, move on to witnesses where required
    fn serialization_complete(&mut self) -> Result<(State, Output), Error> {
        if S::WITNESS_STAGE && self.any_segwit {
            return Ok((State::SignSegwitInputs(0), self.request_input(0, None)));
        }

        self.verify_restream()?;

        self.finish()
    }

    /// Handle an input in the witness stage
    pub(super) fn sign_segwit_input<D: Driver>(
        &mut self,
        n: u32,
        index: u32,
        txi: &TxInput,
        drv: &D,
    ) -> Result<(State, Output), Error> {
        expect_index(n, index)?;

        // No segwit signature is produced unless pass 2 matched pass 1
        if index == 0 {
            self.verify_restream()?;
        }

        let mode = self.strategy.input_mode(txi)?;
        self.check_mode(index, mode)?;
        self.progress += 1;

        if mode == InputMode::Segwit {
            self.wallet_path.recheck_input(txi)?;
            self.multisig.recheck_input(txi)?;

            self.draw_amount(txi)?;

            let mut node = self.derive(drv, &txi.address_n)?;
            let r = self
                .commitment_digest(&node, index, txi)
                .and_then(|digest| self.write_witness(&node, txi, &digest));
            node.zeroize();

            self.set_signature(index, r?)?;
        } else {
            // Empty witness
            write_u8(&mut self.chunk, 0)?;
        }

        if index + 1 < self.tx.inputs_count {
            return Ok((
                State::SignSegwitInputs(index + 1),
                self.request_input(index + 1, None),
            ));
        }

        self.finish()
    }

    /// Write the footer and release the final chunk
    fn finish(&mut self) -> Result<(State, Output), Error> {
        // Every committed amount must have been signed for
        if self.bip143_count != 0 || self.bip143_in != 0 {
            #[cfg(feature = "log")]
            log::warn!(
                "unsigned committed amounts remain: {} ({} inputs)",
                self.bip143_in,
                self.bip143_count
            );

            return Err(Error::TxChanged);
        }

        self.strategy.finish(&mut self.chunk, &self.tx)?;

        #[cfg(feature = "log")]
        log::info!("signing complete");

        Ok((
            State::Complete,
            Output::Finished {
                serialized: self.serialized(),
            },
        ))
    }

    /// Draw an input amount from the committed total
    fn draw_amount(&mut self, txi: &TxInput) -> Result<(), Error> {
        let amount = txi.amount.ok_or(Error::MissingAmount)?;

        if self.bip143_count == 0 || amount > self.bip143_in {
            #[cfg(feature = "log")]
            log::warn!("input amount {} exceeds remaining {}", amount, self.bip143_in);

            return Err(Error::TxChanged);
        }

        self.bip143_in -= amount;
        self.bip143_count -= 1;

        if self.bip143_count == 0 && self.bip143_in != 0 {
            return Err(Error::TxChanged);
        }

        Ok(())
    }

    /// Signature hash from the strategy commitment
    fn commitment_digest<N: SigningNode>(
        &self,
        node: &N,
        index: u32,
        txi: &TxInput,
    ) -> Result<[u8; 32], Error> {
        let pubkey = node.public_key();
        let script_code = scripts::script_code(self.coin, txi, &pubkey)?;

        self.strategy
            .sighash(&self.tx, index, txi, &script_code, self.coin.hash_type())
    }

    /// Sign and serialize an input with its unlocking script
    fn write_signed<N: SigningNode>(
        &mut self,
        node: &N,
        txi: &TxInput,
        digest: &[u8; 32],
    ) -> Result<Signature, Error> {
        let pubkey = node.public_key();
        let sig = sign_digest(node, digest)?;

        let script_sig =
            scripts::input_script_sig(self.coin, txi, &pubkey, Some(&sig), self.coin.hash_type())?;
        self.strategy
            .write_signed_input(&mut self.chunk, txi, &script_sig)?;

        Ok(sig)
    }

    /// Sign and serialize the witness for an input
    fn write_witness<N: SigningNode>(
        &mut self,
        node: &N,
        txi: &TxInput,
        digest: &[u8; 32],
    ) -> Result<Signature, Error> {
        let pubkey = node.public_key();
        let sig = sign_digest(node, digest)?;

        let witness = scripts::witness(txi, &pubkey, &sig, self.coin.hash_type())?;
        self.chunk.write_bytes(&witness)?;

        Ok(sig)
    }
}

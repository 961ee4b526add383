// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Scripted engine exchanges
//!
//! Each [Step] states the request the engine is expected to emit (along with
//! any serialized data it should carry) and the reply to send, allowing tests
//! to present different data on each pass.

use std::fmt::Display;

use log::debug;

use ledger_btc_core::{
    engine::{Driver, Engine, Error, Event, Output, Serialized},
    serialize::Strategy,
    tx::{PrevInput, PrevOutput, PrevTx, SignTx, TxInput, TxOutput},
};

/// Expected engine output
#[derive(Clone, PartialEq, Debug)]
pub enum Expect {
    TxInput(u32),
    TxOutput(u32),
    TxMeta,
    PrevInput(u32),
    PrevOutput(u32),
    ConfirmForeignPath(u32),
    ConfirmOutput(u32),
    ConfirmFeeOverThreshold,
    ConfirmLockTime(u32),
    ConfirmTotal { spending: u64, fee: u64 },
    Finished,
}

impl Expect {
    fn matches(&self, o: &Output) -> bool {
        use Expect::*;

        match (self, o) {
            (TxInput(i), Output::TxInput { index, prev_hash: None, .. }) => i == index,
            (TxOutput(i), Output::TxOutput { index, prev_hash: None, .. }) => i == index,
            (TxMeta, Output::TxMeta { .. }) => true,
            (PrevInput(i), Output::TxInput { index, prev_hash: Some(_), .. }) => i == index,
            (PrevOutput(i), Output::TxOutput { index, prev_hash: Some(_), .. }) => i == index,
            (ConfirmForeignPath(i), Output::ConfirmForeignPath { index, .. }) => i == index,
            (ConfirmOutput(i), Output::ConfirmOutput { index, .. }) => i == index,
            (ConfirmFeeOverThreshold, Output::ConfirmFeeOverThreshold { .. }) => true,
            (ConfirmLockTime(l), Output::ConfirmLockTime { lock_time }) => l == lock_time,
            (ConfirmTotal { spending, fee }, Output::ConfirmTotal { spending: s, fee: f }) => {
                spending == s && fee == f
            }
            (Finished, Output::Finished { .. }) => true,
            _ => false,
        }
    }
}

/// Reply to an engine output
#[derive(Clone, PartialEq, Debug)]
pub enum Reply {
    Input(TxInput),
    Output(TxOutput),
    Meta(PrevTx),
    PrevInput(PrevInput),
    PrevOutput(PrevOutput),
    Approve(bool),
    /// No reply, for the final step
    None,
}

/// Single scripted exchange
#[derive(Clone, PartialEq, Debug)]
pub struct Step {
    pub expect: Expect,
    /// Expected serialized chunk (hex)
    pub serialized: Option<&'static str>,
    /// Expected signature (input index, DER hex)
    pub signature: Option<(u32, &'static str)>,
    pub reply: Reply,
}

impl Step {
    pub fn new(expect: Expect, reply: Reply) -> Self {
        Self {
            expect,
            serialized: None,
            signature: None,
            reply,
        }
    }

    /// Expect a serialized chunk with this request
    pub fn serialized(mut self, hex: &'static str) -> Self {
        self.serialized = Some(hex);
        self
    }

    /// Expect a signature with this request
    pub fn signature(mut self, index: u32, hex: &'static str) -> Self {
        self.signature = Some((index, hex));
        self
    }
}

/// Transcript failure
#[derive(Clone, PartialEq, Debug)]
pub enum Failure {
    /// Engine returned an error for the reply to `step`
    Engine { step: usize, error: Error },
    /// Engine output did not match `step`
    Mismatch {
        step: usize,
        expected: String,
        actual: String,
    },
    /// Transcript ended before the engine finished
    Incomplete,
}

impl Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Engine { step, error } => write!(f, "engine error at step {step}: {error:?}"),
            Failure::Mismatch {
                step,
                expected,
                actual,
            } => write!(f, "step {step} expected {expected}, got {actual}"),
            Failure::Incomplete => write!(f, "transcript incomplete"),
        }
    }
}

impl std::error::Error for Failure {}

/// Run a transcript against an engine, returning serialized data received
pub fn run<DRV: Driver, S: Strategy>(
    engine: &mut Engine<DRV, S>,
    tx: SignTx,
    steps: &[Step],
) -> Result<Vec<Serialized>, Failure> {
    let mut received = vec![];
    run_into(engine, tx, steps, &mut received)?;
    Ok(received)
}

/// Run a transcript, collecting serialized data into `received` so it
/// remains available when the transcript fails
pub fn run_into<DRV: Driver, S: Strategy>(
    engine: &mut Engine<DRV, S>,
    tx: SignTx,
    steps: &[Step],
    received: &mut Vec<Serialized>,
) -> Result<(), Failure> {
    let mut out = engine
        .update(&Event::TxInit { tx })
        .map_err(|error| Failure::Engine { step: 0, error })?;

    for (n, step) in steps.iter().enumerate() {
        debug!("step {}: {:?}", n, step.expect);

        if !step.expect.matches(&out) {
            return Err(Failure::Mismatch {
                step: n,
                expected: format!("{:?}", step.expect),
                actual: format!("{:?}", out),
            });
        }

        let serialized = out.serialized().cloned().unwrap_or_default();
        check_serialized(n, step, &serialized)?;
        received.push(serialized);

        let index = match &out {
            Output::TxInput { index, .. } | Output::TxOutput { index, .. } => *index,
            _ => 0,
        };

        let evt = match &step.reply {
            Reply::Input(input) => Event::TxInput { index, input },
            Reply::Output(output) => Event::TxOutput { index, output },
            Reply::Meta(tx) => Event::PrevMeta { tx: *tx },
            Reply::PrevInput(input) => Event::PrevInput { index, input },
            Reply::PrevOutput(output) => Event::PrevOutput { index, output },
            Reply::Approve(v) => Event::Approval(*v),
            Reply::None => return Ok(()),
        };

        out = engine
            .update(&evt)
            .map_err(|error| Failure::Engine { step: n, error })?;
    }

    Err(Failure::Incomplete)
}

fn check_serialized(n: usize, step: &Step, s: &Serialized) -> Result<(), Failure> {
    if let Some(expected) = step.serialized {
        let actual = hex::encode(&s.tx);
        if actual != expected {
            return Err(Failure::Mismatch {
                step: n,
                expected: expected.to_string(),
                actual,
            });
        }
    }

    if let Some((index, expected)) = step.signature {
        let actual = s
            .signature
            .as_ref()
            .map(|(i, sig)| (*i, hex::encode(sig)));

        if actual != Some((index, expected.to_string())) {
            return Err(Failure::Mismatch {
                step: n,
                expected: format!("signature {index}: {expected}"),
                actual: format!("{:?}", actual),
            });
        }
    }

    Ok(())
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

use crate::{
    hash::HashWriter,
    tx::TxInput,
    writers::{write_tx_input_check, write_tx_output},
};

use super::Error;

/// Transaction check digest, a running digest over every input and output
/// field the host supplies, used to ensure data streamed in later passes
/// matches the data the user confirmed.
#[derive(Clone, Default)]
pub struct TxCheck<H: HashWriter> {
    inputs: H,
    outputs: H,
}

impl<H: HashWriter> core::fmt::Debug for TxCheck<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "TxCheck {{ inputs: ")?;
        for b in self.inputs.digest() {
            write!(f, "{b:02x}")?;
        }
        write!(f, ", outputs: ")?;
        for b in self.outputs.digest() {
            write!(f, "{b:02x}")?;
        }
        write!(f, " }}")
    }
}

impl<H: HashWriter> TxCheck<H> {
    /// Create a new (empty) check digest
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input in check form
    pub fn add_input(&mut self, txi: &TxInput) -> Result<(), Error> {
        write_tx_input_check(&mut self.inputs, txi)
    }

    /// Add an output with its resolved script
    pub fn add_output(&mut self, amount: u64, script_pubkey: &[u8]) -> Result<(), Error> {
        write_tx_output(&mut self.outputs, amount, script_pubkey)
    }

    pub fn inputs_digest(&self) -> [u8; 32] {
        self.inputs.digest()
    }

    pub fn outputs_digest(&self) -> [u8; 32] {
        self.outputs.digest()
    }

    /// Check inputs (and optionally outputs) against a confirmed digest
    pub fn verify(&self, confirmed: &Self, outputs: bool) -> Result<(), Error> {
        if self.inputs_digest() != confirmed.inputs_digest() {
            return Err(Error::TxChanged);
        }

        if outputs && self.outputs_digest() != confirmed.outputs_digest() {
            return Err(Error::TxChanged);
        }

        Ok(())
    }
}

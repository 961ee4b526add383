// Copyright (c) 2022-2023 The MobileCoin Foundation

use crate::tx::{PrevInput, PrevOutput, PrevTx, SignTx, TxInput, TxOutput};

/// [`Engine`][super::Engine] input events, typically decoded from host responses
#[derive(Clone, Debug)]
pub enum Event<'a> {
    None,

    /// Initialise transaction signing session
    TxInit { tx: SignTx },

    /// Input of the transaction being signed
    TxInput { index: u32, input: &'a TxInput },

    /// Output of the transaction being signed
    TxOutput { index: u32, output: &'a TxOutput },

    /// Previous transaction header
    PrevMeta { tx: PrevTx },

    /// Previous transaction input
    PrevInput { index: u32, input: &'a PrevInput },

    /// Previous transaction output
    PrevOutput { index: u32, output: &'a PrevOutput },

    /// User response to a pending confirmation
    Approval(bool),

    /// Fetch transaction state / information
    TxGetInfo,
}

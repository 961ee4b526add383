// Copyright (c) 2022-2023 The MobileCoin Foundation

use strum::Display;

/// [Engine][super::Engine] errors
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[repr(u8)]
pub enum Error {
    /// Invalid argument length
    #[cfg_attr(feature = "thiserror", error("invalid argument length"))]
    InvalidLength = 0x00,

    /// Unexpected event
    #[cfg_attr(feature = "thiserror", error("unexpected event"))]
    UnexpectedEvent = 0x01,

    /// Response for an index other than the one requested
    #[cfg_attr(feature = "thiserror", error("unexpected index"))]
    UnexpectedIndex = 0x02,

    /// Invalid engine state
    #[cfg_attr(feature = "thiserror", error("invalid engine state"))]
    InvalidState = 0x03,

    /// Serialization buffer exhausted
    #[cfg_attr(feature = "thiserror", error("buffer full"))]
    BufferFull = 0x04,

    /// Transaction must have at least one input and one output
    #[cfg_attr(feature = "thiserror", error("invalid input or output count"))]
    InvalidCount = 0x05,

    /// Script type not supported for this coin / input
    #[cfg_attr(feature = "thiserror", error("unsupported script type"))]
    UnsupportedScriptType = 0x10,

    /// Input amount required but not provided
    #[cfg_attr(feature = "thiserror", error("input amount missing"))]
    MissingAmount = 0x11,

    /// Outputs exceed inputs
    #[cfg_attr(feature = "thiserror", error("not enough funds"))]
    NotEnoughFunds = 0x12,

    /// Non-zero script version
    #[cfg_attr(feature = "thiserror", error("cannot use script version other than 0"))]
    ScriptVersion = 0x13,

    /// Address could not be decoded for this coin
    #[cfg_attr(feature = "thiserror", error("invalid address"))]
    InvalidAddress = 0x14,

    /// Invalid multisig parameters
    #[cfg_attr(feature = "thiserror", error("invalid multisig parameters"))]
    InvalidMultisig = 0x15,

    /// Output has no valid destination
    #[cfg_attr(feature = "thiserror", error("invalid output"))]
    InvalidOutput = 0x16,

    /// Previous output index out of range
    #[cfg_attr(feature = "thiserror", error("invalid previous output index"))]
    InvalidPrevIndex = 0x17,

    /// Amount overflow
    #[cfg_attr(feature = "thiserror", error("amount overflow"))]
    AmountOverflow = 0x18,

    /// Input amount disagrees with the previous transaction
    #[cfg_attr(feature = "thiserror", error("invalid amount specified"))]
    InvalidAmount = 0x19,

    /// Transaction changed between passes
    #[cfg_attr(feature = "thiserror", error("transaction has changed during signing"))]
    TxChanged = 0x20,

    /// Streamed previous transaction does not match its hash
    #[cfg_attr(feature = "thiserror", error("encountered invalid prev_hash"))]
    InvalidPrevHash = 0x21,

    /// User denied the transaction
    #[cfg_attr(feature = "thiserror", error("user denied"))]
    UserDenied = 0x30,

    /// Key derivation failed
    #[cfg_attr(feature = "thiserror", error("key derivation failed"))]
    DeriveFailed = 0x40,

    /// Signing error
    #[cfg_attr(feature = "thiserror", error("signing error"))]
    SignError = 0x41,

    /// Unknown / unhandled error
    #[cfg_attr(feature = "thiserror", error("unknown error"))]
    Unknown = 0xFF,
}

/// Error classes, allowing callers to tell user messaging from bugs
#[derive(Copy, Clone, PartialEq, Debug, Display)]
pub enum ErrorKind {
    /// Transaction can not be signed as provided
    Validation,
    /// Host data changed between passes or arrived out of order
    Tamper,
    /// User declined, normal termination
    Declined,
    /// Protocol or engine contract violation
    Protocol,
}

impl Error {
    /// Fetch the [ErrorKind] for an error
    pub const fn kind(&self) -> ErrorKind {
        use Error::*;

        match self {
            InvalidLength | BufferFull | InvalidCount | UnsupportedScriptType | MissingAmount
            | NotEnoughFunds | ScriptVersion | InvalidAddress | InvalidMultisig
            | InvalidOutput | InvalidPrevIndex | AmountOverflow | InvalidAmount => {
                ErrorKind::Validation
            }
            UnexpectedIndex | TxChanged | InvalidPrevHash => ErrorKind::Tamper,
            UserDenied => ErrorKind::Declined,
            UnexpectedEvent | InvalidState | DeriveFailed | SignError | Unknown => {
                ErrorKind::Protocol
            }
        }
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Host simulator and common test vectors for the signing engine.
//!
//! [host] answers engine requests from a fully known transaction, as a
//! wallet would, while [transcript] replays a scripted exchange so tests can
//! supply different data between passes.
//!

use ledger_btc_core::tx::TxHash;

pub mod driver;
pub use driver::{TestDriver, TestNode, MNEMONIC};

pub mod host;
pub use host::{HostTx, PrevTxData, Signed};

pub mod transcript;
pub use transcript::{Expect, Failure, Reply, Step};

pub mod vectors;

/// Setup logging for tests, may be called more than once
pub fn init_logging() {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());
}

/// Parse a display-order transaction hash
pub fn tx_hash(s: &str) -> anyhow::Result<TxHash> {
    let mut h = [0u8; 32];
    hex::decode_to_slice(s, &mut h)?;
    Ok(h)
}

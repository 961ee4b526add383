// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Incremental hashing over serialized transaction data

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::{engine::Error, writers::Writer};

mod blake256;
pub use blake256::Blake256;

/// Incremental digest over serialized bytes, pluggable per coin
pub trait HashWriter: Writer + Clone + Default {
    /// Feed bytes into the digest
    fn update(&mut self, data: &[u8]);

    /// Digest of all data written so far, the writer remains usable
    fn digest(&self) -> [u8; 32];

    /// Single round of the underlying hash function
    fn hash(data: &[u8]) -> [u8; 32] {
        let mut h = Self::default();
        h.update(data);
        h.digest()
    }

    /// Transaction hash, optionally double-rounded and reversed to display order
    fn tx_hash(&self, double: bool, reverse: bool) -> [u8; 32] {
        let mut d = self.digest();
        if double {
            d = Self::hash(&d);
        }
        if reverse {
            d.reverse();
        }
        d
    }
}

/// SHA-256 [HashWriter]
#[derive(Clone, Default, Debug)]
pub struct Sha256Writer(Sha256);

impl Writer for Sha256Writer {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        self.0.update(data);
        Ok(())
    }
}

impl HashWriter for Sha256Writer {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn digest(&self) -> [u8; 32] {
        self.0.clone().finalize().into()
    }
}

impl Writer for Blake256 {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        Blake256::update(self, data);
        Ok(())
    }
}

impl HashWriter for Blake256 {
    fn update(&mut self, data: &[u8]) {
        Blake256::update(self, data);
    }

    fn digest(&self) -> [u8; 32] {
        self.clone().finalize()
    }
}

/// SHA-256 helper
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// RIPEMD-160 helper
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

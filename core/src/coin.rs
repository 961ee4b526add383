// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Coin parameter tables

use bitflags::bitflags;

use crate::{
    hash::{ripemd160, sha256, Blake256, HashWriter},
    tx::{InputScriptType, HARDENED},
};

bitflags! {
    /// Coin feature flags
    pub struct CoinFlags: u32 {
        /// Coin supports segwit inputs / outputs
        const SEGWIT = 1 << 0;
        /// Non-segwit inputs are signed with a BIP143 digest (fork-id coins)
        const FORCE_BIP143 = 1 << 1;
        /// Signature and transaction hashes use a double round
        const SIGN_HASH_DOUBLE = 1 << 2;
        /// Decred serialization and hashing
        const DECRED = 1 << 3;
        /// Outputs may exceed inputs
        const NEGATIVE_FEE = 1 << 4;
    }
}

/// Signature hash type, all inputs and outputs
pub const SIGHASH_ALL: u32 = 0x01;

/// Signature hash flag for fork-id coins
pub const SIGHASH_FORKID: u32 = 0x40;

/// Highest chain index in a wallet path (0: receive, 1: change)
pub const BIP32_CHANGE_CHAIN: u32 = 1;

/// Highest address index in a wallet path
pub const BIP32_MAX_LAST_ELEMENT: u32 = 1_000_000;

/// Highest account index in a wallet path
pub const BIP32_MAX_ACCOUNT: u32 = 100;

/// Read-only coin parameters
#[derive(Clone, PartialEq, Debug)]
pub struct CoinInfo {
    pub name: &'static str,
    pub shortcut: &'static str,
    pub decimals: u8,
    /// SLIP-0044 coin type
    pub slip44: u32,
    /// P2PKH address version
    pub address_type: u32,
    /// P2SH address version
    pub address_type_p2sh: u32,
    /// Fee rate above which the user must confirm the fee, per kilobyte
    pub maxfee_kb: u64,
    pub bech32_prefix: Option<&'static str>,
    pub curve_name: &'static str,
    pub fork_id: Option<u32>,
    pub flags: CoinFlags,
}

pub static BITCOIN: CoinInfo = CoinInfo {
    name: "Bitcoin",
    shortcut: "BTC",
    decimals: 8,
    slip44: 0,
    address_type: 0,
    address_type_p2sh: 5,
    maxfee_kb: 2_000_000,
    bech32_prefix: Some("bc"),
    curve_name: "secp256k1",
    fork_id: None,
    flags: CoinFlags::SEGWIT.union(CoinFlags::SIGN_HASH_DOUBLE),
};

pub static TESTNET: CoinInfo = CoinInfo {
    name: "Testnet",
    shortcut: "TEST",
    decimals: 8,
    slip44: 1,
    address_type: 111,
    address_type_p2sh: 196,
    maxfee_kb: 10_000_000,
    bech32_prefix: Some("tb"),
    curve_name: "secp256k1",
    fork_id: None,
    flags: CoinFlags::SEGWIT.union(CoinFlags::SIGN_HASH_DOUBLE),
};

pub static BCASH: CoinInfo = CoinInfo {
    name: "Bcash",
    shortcut: "BCH",
    decimals: 8,
    slip44: 145,
    address_type: 0,
    address_type_p2sh: 5,
    maxfee_kb: 500_000,
    bech32_prefix: None,
    curve_name: "secp256k1",
    fork_id: Some(0),
    flags: CoinFlags::FORCE_BIP143.union(CoinFlags::SIGN_HASH_DOUBLE),
};

pub static DECRED: CoinInfo = CoinInfo {
    name: "Decred",
    shortcut: "DCR",
    decimals: 8,
    slip44: 42,
    address_type: 0x073f,
    address_type_p2sh: 0x071a,
    maxfee_kb: 1_000_000,
    bech32_prefix: None,
    curve_name: "secp256k1-decred",
    fork_id: None,
    flags: CoinFlags::DECRED,
};

pub static DECRED_TESTNET: CoinInfo = CoinInfo {
    name: "Decred Testnet",
    shortcut: "TDCR",
    decimals: 8,
    slip44: 1,
    address_type: 0x0f21,
    address_type_p2sh: 0x0efc,
    maxfee_kb: 10_000_000,
    bech32_prefix: None,
    curve_name: "secp256k1-decred",
    fork_id: None,
    flags: CoinFlags::DECRED,
};

/// Bundled coin tables
pub static COINS: &[&CoinInfo] = &[&BITCOIN, &TESTNET, &BCASH, &DECRED, &DECRED_TESTNET];

/// Find a bundled coin by name
pub fn by_name(name: &str) -> Option<&'static CoinInfo> {
    COINS.iter().find(|c| c.name == name).copied()
}

impl CoinInfo {
    pub const fn has(&self, f: CoinFlags) -> bool {
        self.flags.contains(f)
    }

    pub const fn is_decred(&self) -> bool {
        self.has(CoinFlags::DECRED)
    }

    /// Signature hash type, including fork id where applicable
    pub const fn hash_type(&self) -> u32 {
        match self.fork_id {
            Some(id) => SIGHASH_ALL | (id << 8) | SIGHASH_FORKID,
            None => SIGHASH_ALL,
        }
    }

    /// Check an input path follows the purpose / coin type / account layout
    /// for its script type, other paths spend coins from another chain or
    /// wallet and must be confirmed by the user
    pub fn path_is_standard(&self, path: &[u32], script_type: InputScriptType) -> bool {
        use InputScriptType::*;

        match (path, script_type) {
            // m/45'/cosigner/change/index
            ([purpose, cosigner, change, index], SpendMultisig) if *purpose == 45 | HARDENED => {
                *cosigner < HARDENED && address_is_standard(*change, *index)
            }
            // m/48'/coin'/account'/script'/change/index
            (
                [purpose, coin, account, script, change, index],
                SpendMultisig | SpendP2shWitness | SpendWitness,
            ) if *purpose == 48 | HARDENED => {
                self.account_is_standard(*coin, *account)
                    && (HARDENED..=2 | HARDENED).contains(script)
                    && address_is_standard(*change, *index)
            }
            // m/purpose'/coin'/account'/change/index
            ([purpose, coin, account, change, index], _) => {
                let expected = match script_type {
                    SpendAddress | SpendMultisig => 44,
                    SpendP2shWitness => 49,
                    SpendWitness => 84,
                    External => return false,
                };

                *purpose == expected | HARDENED
                    && self.account_is_standard(*coin, *account)
                    && address_is_standard(*change, *index)
            }
            _ => false,
        }
    }

    fn account_is_standard(&self, coin: u32, account: u32) -> bool {
        coin == self.slip44 | HARDENED
            && (HARDENED..=BIP32_MAX_ACCOUNT | HARDENED).contains(&account)
    }

    /// Key / script hash used in addresses
    pub fn hash160(&self, data: &[u8]) -> [u8; 20] {
        if self.is_decred() {
            ripemd160(&Blake256::hash(data))
        } else {
            ripemd160(&sha256(data))
        }
    }

    /// Base58 checksum over an address payload
    pub fn b58_checksum(&self, payload: &[u8]) -> [u8; 4] {
        let d = if self.is_decred() {
            Blake256::hash(&Blake256::hash(payload))
        } else {
            sha256(&sha256(payload))
        };

        let mut c = [0u8; 4];
        c.copy_from_slice(&d[..4]);
        c
    }
}

fn address_is_standard(change: u32, index: u32) -> bool {
    change <= BIP32_CHANGE_CHAIN && index <= BIP32_MAX_LAST_ELEMENT
}

/// Number of bytes used to encode an address version prefix
pub const fn address_type_len(address_type: u32) -> usize {
    match address_type {
        0..=0xff => 1,
        0x100..=0xffff => 2,
        0x1_0000..=0xff_ffff => 3,
        _ => 4,
    }
}

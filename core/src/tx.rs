// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Transaction data model, as streamed from the host

use heapless::{String, Vec};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::{Display, EnumIter, EnumString};

/// BIP-32 hardened derivation flag
pub const HARDENED: u32 = 0x8000_0000;

/// Maximum derivation path depth
pub const MAX_PATH_DEPTH: usize = 8;

/// Maximum inputs per transaction
pub const MAX_INPUTS: usize = 4096;

/// Maximum script length (fits a 15-of-15 multisig script_sig)
pub const MAX_SCRIPT_SIZE: usize = 1650;

/// Maximum number of multisig cosigners
pub const MAX_COSIGNERS: usize = 15;

/// Maximum encoded address length
pub const MAX_ADDRESS_LEN: usize = 130;

/// Maximum OP_RETURN payload
pub const MAX_OP_RETURN_SIZE: usize = 80;

/// Maximum DER signature length
pub const MAX_SIGNATURE_SIZE: usize = 72;

/// Transaction hash, in display (big-endian) order
pub type TxHash = [u8; 32];

/// Compressed secp256k1 public key
pub type PublicKey = [u8; 33];

/// BIP-32 derivation path
pub type Path = Vec<u32, MAX_PATH_DEPTH>;

/// Script bytes
pub type Script = Vec<u8, MAX_SCRIPT_SIZE>;

/// DER-encoded ECDSA signature (without hash type)
pub type Signature = Vec<u8, MAX_SIGNATURE_SIZE>;

/// Encoded address
pub type Address = String<MAX_ADDRESS_LEN>;

/// Default input sequence
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// Input script types
#[derive(
    Copy,
    Clone,
    PartialEq,
    Debug,
    Display,
    EnumString,
    EnumIter,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[repr(u32)]
pub enum InputScriptType {
    /// Standard P2PKH
    SpendAddress = 0,
    /// P2SH multisig
    SpendMultisig = 1,
    /// Input not owned by this wallet
    External = 2,
    /// Native segwit (P2WPKH / P2WSH)
    SpendWitness = 3,
    /// Segwit wrapped in P2SH
    SpendP2shWitness = 4,
}

impl Default for InputScriptType {
    fn default() -> Self {
        Self::SpendAddress
    }
}

impl InputScriptType {
    /// Check whether this script type carries a witness
    pub const fn is_segwit(&self) -> bool {
        matches!(self, Self::SpendWitness | Self::SpendP2shWitness)
    }
}

/// Output script types
#[derive(
    Copy,
    Clone,
    PartialEq,
    Debug,
    Display,
    EnumString,
    EnumIter,
    TryFromPrimitive,
    IntoPrimitive,
)]
#[repr(u32)]
pub enum OutputScriptType {
    PayToAddress = 0,
    PayToScriptHash = 1,
    PayToMultisig = 2,
    PayToOpReturn = 3,
    PayToWitness = 4,
    PayToP2shWitness = 5,
}

impl Default for OutputScriptType {
    fn default() -> Self {
        Self::PayToAddress
    }
}

/// Multisig descriptor
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Multisig {
    /// Cosigner public keys, in redeem script order
    pub pubkeys: Vec<PublicKey, MAX_COSIGNERS>,
    /// Signatures from other cosigners, empty where missing
    pub signatures: Vec<Signature, MAX_COSIGNERS>,
    /// Required signatures
    pub m: u32,
}

/// Transaction to be signed
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SignTx {
    pub version: u32,
    pub inputs_count: u32,
    pub outputs_count: u32,
    pub lock_time: u32,
    /// Expiry height (Decred)
    pub expiry: u32,
}

impl Default for SignTx {
    fn default() -> Self {
        Self {
            version: 1,
            inputs_count: 0,
            outputs_count: 0,
            lock_time: 0,
            expiry: 0,
        }
    }
}

/// Input of the transaction being signed
#[derive(Clone, PartialEq, Debug)]
pub struct TxInput {
    pub address_n: Path,
    pub prev_hash: TxHash,
    pub prev_index: u32,
    pub script_type: InputScriptType,
    pub sequence: u32,
    /// Amount, required for inputs signed with a BIP143 digest
    pub amount: Option<u64>,
    pub multisig: Option<Multisig>,
    /// Decred tree
    pub decred_tree: u8,
}

impl Default for TxInput {
    fn default() -> Self {
        Self {
            address_n: Path::new(),
            prev_hash: [0u8; 32],
            prev_index: 0,
            script_type: InputScriptType::SpendAddress,
            sequence: SEQUENCE_FINAL,
            amount: None,
            multisig: None,
            decred_tree: 0,
        }
    }
}

/// Output of the transaction being signed
#[derive(Clone, PartialEq, Debug, Default)]
pub struct TxOutput {
    /// Destination address, for outputs not owned by this wallet
    pub address: Option<Address>,
    /// Derivation path, for change outputs
    pub address_n: Path,
    pub amount: u64,
    pub script_type: OutputScriptType,
    pub multisig: Option<Multisig>,
    pub op_return_data: Option<Vec<u8, MAX_OP_RETURN_SIZE>>,
    /// Decred script version
    pub decred_script_version: u16,
}

/// Previous transaction header
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PrevTx {
    pub version: u32,
    pub lock_time: u32,
    pub inputs_count: u32,
    pub outputs_count: u32,
    pub expiry: u32,
}

/// Previous transaction input
#[derive(Clone, PartialEq, Debug)]
pub struct PrevInput {
    pub prev_hash: TxHash,
    pub prev_index: u32,
    pub script_sig: Script,
    pub sequence: u32,
    pub decred_tree: u8,
}

/// Previous transaction output
#[derive(Clone, PartialEq, Debug)]
pub struct PrevOutput {
    pub amount: u64,
    pub script_pubkey: Script,
    pub decred_script_version: u16,
}

/// Outpoint and sequence shared by signed and previous inputs
pub trait TxIn {
    fn prev_hash(&self) -> &TxHash;
    fn prev_index(&self) -> u32;
    fn sequence(&self) -> u32;
    fn decred_tree(&self) -> u8;
}

impl TxIn for TxInput {
    fn prev_hash(&self) -> &TxHash {
        &self.prev_hash
    }
    fn prev_index(&self) -> u32 {
        self.prev_index
    }
    fn sequence(&self) -> u32 {
        self.sequence
    }
    fn decred_tree(&self) -> u8 {
        self.decred_tree
    }
}

impl TxIn for PrevInput {
    fn prev_hash(&self) -> &TxHash {
        &self.prev_hash
    }
    fn prev_index(&self) -> u32 {
        self.prev_index
    }
    fn sequence(&self) -> u32 {
        self.sequence
    }
    fn decred_tree(&self) -> u8 {
        self.decred_tree
    }
}

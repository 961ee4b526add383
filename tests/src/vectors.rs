// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Transaction vectors shared by the signing tests
//!
//! Keys are derived from [MNEMONIC][crate::MNEMONIC].

use bitcoin::{
    absolute::LockTime, hashes::Hash, transaction::Version, Amount, OutPoint, ScriptBuf, Sequence,
    Transaction, TxIn, TxOut, Txid, Witness,
};
use lazy_static::lazy_static;

use ledger_btc_core::{
    coin::{CoinInfo, DECRED_TESTNET},
    scripts,
    serialize::Decred,
    tx::{
        Address, InputScriptType, OutputScriptType, Path, PrevInput, PrevOutput, PrevTx, TxInput,
        TxOutput, HARDENED, SEQUENCE_FINAL,
    },
};

use crate::{
    host::{display_hash, HostTx, PrevTxData},
    tx_hash, TestDriver,
};

/// Build a derivation path
pub fn path(p: &[u32]) -> Path {
    // Vector paths never exceed the maximum depth
    Path::from_slice(p).unwrap()
}

/// Build an address
pub fn address(s: &str) -> Address {
    Address::try_from(s).unwrap()
}

/// Output paying an external address
pub fn external_output(addr: &str, amount: u64) -> TxOutput {
    TxOutput {
        address: Some(address(addr)),
        amount,
        script_type: OutputScriptType::PayToAddress,
        ..Default::default()
    }
}

/// Output paying back to a wallet path
pub fn change_output(p: &[u32], script_type: OutputScriptType, amount: u64) -> TxOutput {
    TxOutput {
        address_n: path(p),
        amount,
        script_type,
        ..Default::default()
    }
}

/// P2SH wrapped segwit spend, paying an external P2PKH address and a P2SH
/// address belonging to the spending account
pub mod p2sh_segwit {
    use super::*;

    pub const PREV_HASH: &str = "20912f98ea3ed849042efed0fdac8cb4fc301961c5988cba56902d8ffb61c337";

    pub const INPUT_PATH: [u32; 5] = [49 | HARDENED, 1 | HARDENED, HARDENED, 1, 0];
    pub const INPUT_AMOUNT: u64 = 123_456_789;

    pub const OUTPUT_1_ADDRESS: &str = "mhRx1CeVfaayqRwq5zgRQmD7W5aWBfD5mC";
    pub const OUTPUT_1_AMOUNT: u64 = 12_300_000;

    /// Address of [INPUT_PATH] as P2SH segwit
    pub const OUTPUT_2_ADDRESS: &str = "2N1LGaGg836mqSQqiuUBLfcyGBhyZbremDX";
    pub const OUTPUT_2_AMOUNT: u64 = 111_145_789;

    pub const FEE: u64 = 11_000;

    /// Serialized chunks, header / input / outputs / witness and lock time
    pub const HEADER: &str = "01000000000101";
    pub const INPUT: &str = "37c361fb8f2d9056ba8c98c5611930fcb48cacfdd0fe2e0449d83eea982f91200000000017160014d16b8c0680c61fc6ed2e407455715055e41052f5ffffffff02";
    pub const OUTPUT_1: &str = "e0aebb00000000001976a91414fdede0ddc3be652a0ce1afbc1b509a55b6b94888ac";
    pub const OUTPUT_2: &str = "3df39f060000000017a91458b53ea7f832e8f096e896b8713a8c6df0e892ca87";
    pub const WITNESS: &str = "02483045022100ccd253bfdf8a5593cd7b6701370c531199f0f05a418cd547dfc7da3f21515f0f02203fa08a0753688871c220648f9edadbdb98af42e5d8269364a326572cf703895b012103e7bfe10708f715e8538c92d46ca50db6f657bbc455b7494e6a0303ccdb868b7900000000";

    pub const SIGNATURE: &str = "3045022100ccd253bfdf8a5593cd7b6701370c531199f0f05a418cd547dfc7da3f21515f0f02203fa08a0753688871c220648f9edadbdb98af42e5d8269364a326572cf703895b";

    pub fn input(amount: u64) -> TxInput {
        TxInput {
            address_n: path(&INPUT_PATH),
            prev_hash: tx_hash(PREV_HASH).unwrap(),
            prev_index: 0,
            script_type: InputScriptType::SpendP2shWitness,
            sequence: SEQUENCE_FINAL,
            amount: Some(amount),
            ..Default::default()
        }
    }

    pub fn output_1(amount: u64) -> TxOutput {
        external_output(OUTPUT_1_ADDRESS, amount)
    }

    pub fn output_2(amount: u64) -> TxOutput {
        external_output(OUTPUT_2_ADDRESS, amount)
    }

    /// Output 2 as change, by path rather than address
    pub fn output_2_change(amount: u64) -> TxOutput {
        change_output(&INPUT_PATH, OutputScriptType::PayToP2shWitness, amount)
    }

    /// Full signed transaction
    pub fn signed() -> String {
        [HEADER, INPUT, OUTPUT_1, OUTPUT_2, WITNESS].concat()
    }
}

/// Legacy P2PKH spend of a funding transaction paying this wallet
pub struct LegacyVector {
    pub host: HostTx,
    pub funding: Transaction,
}

pub mod legacy {
    use super::*;

    pub const INPUT_PATH: [u32; 5] = [44 | HARDENED, 1 | HARDENED, HARDENED, 0, 0];
    pub const CHANGE_PATH: [u32; 5] = [44 | HARDENED, 1 | HARDENED, HARDENED, 1, 0];

    pub const FUNDING_AMOUNT: u64 = 50_000;
    pub const EXTERNAL_AMOUNT: u64 = 30_000;
    pub const CHANGE_AMOUNT: u64 = 19_000;
    pub const FEE: u64 = 1_000;

    /// Funding transaction paying [INPUT_PATH], with an unrelated second output
    pub fn funding(drv: &TestDriver) -> Transaction {
        let pubkey = bitcoin::PublicKey::new(drv.public_key(&INPUT_PATH).unwrap());

        Transaction {
            version: Version::ONE,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint {
                    txid: Txid::from_byte_array([0x11; 32]),
                    vout: 3,
                },
                script_sig: ScriptBuf::from_bytes(vec![0x51, 0x51]),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![
                TxOut {
                    value: Amount::from_sat(FUNDING_AMOUNT),
                    script_pubkey: ScriptBuf::new_p2pkh(&pubkey.pubkey_hash()),
                },
                TxOut {
                    value: Amount::from_sat(20_000),
                    script_pubkey: ScriptBuf::from_bytes(vec![0x51]),
                },
            ],
        }
    }

    pub fn vector(drv: &TestDriver) -> LegacyVector {
        let funding = funding(drv);
        let prev_hash = display_hash(funding.compute_txid().to_byte_array());

        let input = TxInput {
            address_n: path(&INPUT_PATH),
            prev_hash,
            prev_index: 0,
            script_type: InputScriptType::SpendAddress,
            ..Default::default()
        };

        let host = HostTx::new(
            1,
            0,
            vec![input],
            vec![
                external_output(p2sh_segwit::OUTPUT_1_ADDRESS, EXTERNAL_AMOUNT),
                change_output(&CHANGE_PATH, OutputScriptType::PayToAddress, CHANGE_AMOUNT),
            ],
        )
        .with_prev(prev_hash, PrevTxData::from_bitcoin(&funding).unwrap());

        LegacyVector { host, funding }
    }
}

/// Decred spend, the previous transaction hashed with the prefix
/// serialization
pub mod decred {
    use super::*;

    pub static COIN: &CoinInfo = &DECRED_TESTNET;

    pub const INPUT_PATH: [u32; 5] = [44 | HARDENED, 1 | HARDENED, HARDENED, 0, 0];
    pub const EXTERNAL_PATH: [u32; 5] = [44 | HARDENED, 1 | HARDENED, 1 | HARDENED, 0, 0];
    pub const CHANGE_PATH: [u32; 5] = [44 | HARDENED, 1 | HARDENED, HARDENED, 1, 3];

    pub const FUNDING_AMOUNT: u64 = 200_000_000;
    pub const EXTERNAL_AMOUNT: u64 = 150_000_000;
    pub const CHANGE_AMOUNT: u64 = 49_990_000;
    pub const FEE: u64 = 10_000;

    /// P2PKH script for a wallet path
    pub fn p2pkh_script(drv: &TestDriver, p: &[u32]) -> ledger_btc_core::tx::Script {
        let pubkey = drv.public_key(p).unwrap().serialize();
        scripts::output_script_p2pkh(&COIN.hash160(&pubkey)).unwrap()
    }

    /// Testnet P2PKH address for a wallet path
    pub fn p2pkh_address(drv: &TestDriver, p: &[u32]) -> String {
        let pubkey = drv.public_key(p).unwrap().serialize();

        let mut payload = vec![0x0f, 0x21];
        payload.extend_from_slice(&COIN.hash160(&pubkey));
        let checksum = COIN.b58_checksum(&payload);
        payload.extend_from_slice(&checksum);

        bitcoin::base58::encode(&payload)
    }

    pub fn funding(drv: &TestDriver) -> PrevTxData {
        PrevTxData {
            meta: PrevTx {
                version: 1,
                lock_time: 0,
                inputs_count: 1,
                outputs_count: 2,
                expiry: 0,
            },
            inputs: vec![PrevInput {
                prev_hash: [0x42; 32],
                prev_index: 1,
                script_sig: Default::default(),
                sequence: SEQUENCE_FINAL,
                decred_tree: 0,
            }],
            outputs: vec![
                PrevOutput {
                    amount: 1_000,
                    script_pubkey: p2pkh_script(drv, &EXTERNAL_PATH),
                    decred_script_version: 0,
                },
                PrevOutput {
                    amount: FUNDING_AMOUNT,
                    script_pubkey: p2pkh_script(drv, &INPUT_PATH),
                    decred_script_version: 0,
                },
            ],
        }
    }

    /// Spend of [funding] output 1, with the amount claimed by the host
    pub fn vector(drv: &TestDriver, funding: PrevTxData) -> HostTx {
        let prev_hash = funding.hash::<Decred>(COIN).unwrap();

        let input = TxInput {
            address_n: path(&INPUT_PATH),
            prev_hash,
            prev_index: 1,
            script_type: InputScriptType::SpendAddress,
            amount: Some(FUNDING_AMOUNT),
            ..Default::default()
        };

        HostTx::new(
            1,
            0,
            vec![input],
            vec![
                external_output(&p2pkh_address(drv, &EXTERNAL_PATH), EXTERNAL_AMOUNT),
                change_output(&CHANGE_PATH, OutputScriptType::PayToAddress, CHANGE_AMOUNT),
            ],
        )
        .with_prev(prev_hash, funding)
    }
}

lazy_static! {
    /// P2SH segwit spend with two external outputs
    pub static ref P2SH_SEGWIT: HostTx = {
        use p2sh_segwit::*;

        HostTx::new(
            1,
            0,
            vec![input(INPUT_AMOUNT)],
            vec![output_1(OUTPUT_1_AMOUNT), output_2(OUTPUT_2_AMOUNT)],
        )
    };

    /// P2SH segwit spend with output 2 as change
    pub static ref P2SH_SEGWIT_CHANGE: HostTx = {
        use p2sh_segwit::*;

        HostTx::new(
            1,
            0,
            vec![input(INPUT_AMOUNT)],
            vec![output_1(OUTPUT_1_AMOUNT), output_2_change(OUTPUT_2_AMOUNT)],
        )
    };
}

#[cfg(test)]
mod test {
    use super::*;

    use ledger_btc_core::{
        coin::TESTNET,
        serialize::{Bitcoin, Strategy},
    };

    #[test]
    fn change_matches_external_script() {
        let drv = TestDriver::default();
        let pubkey = drv.public_key(&p2sh_segwit::INPUT_PATH).unwrap().serialize();

        let change = scripts::change_script(
            &TESTNET,
            OutputScriptType::PayToP2shWitness,
            &pubkey,
            None,
        )
        .unwrap();
        let external = scripts::address_to_script(&TESTNET, p2sh_segwit::OUTPUT_2_ADDRESS).unwrap();

        assert_eq!(change, external);
    }

    #[test]
    fn funding_hash_matches_txid() {
        let drv = TestDriver::default();

        let v = legacy::vector(&drv);
        let prev = &v.host.prev_txs[&v.host.inputs[0].prev_hash];

        assert_eq!(
            prev.hash::<Bitcoin>(&TESTNET).unwrap(),
            display_hash(v.funding.compute_txid().to_byte_array())
        );
    }

    #[test]
    fn decred_address_decodes() {
        let drv = TestDriver::default();

        let a = decred::p2pkh_address(&drv, &decred::EXTERNAL_PATH);
        assert!(a.starts_with("Ts"));

        let s = scripts::address_to_script(decred::COIN, &a).unwrap();
        assert_eq!(s, decred::p2pkh_script(&drv, &decred::EXTERNAL_PATH));
    }

    #[test]
    fn strategy_coin_mismatch() {
        assert!(Decred::new(&TESTNET, &Default::default()).is_err());
    }
}

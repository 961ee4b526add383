// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Locking / unlocking scripts, witnesses and address decoding

use alloc::vec::Vec as AllocVec;

use bech32::{FromBase32, Variant};

use crate::{
    coin::{address_type_len, CoinInfo, CoinFlags},
    engine::Error,
    hash::sha256,
    multisig,
    tx::{InputScriptType, Multisig, OutputScriptType, PublicKey, Script, Signature, TxInput},
    writers::{write_op_push, write_u8, write_varint, Writer},
};

const OP_0: u8 = 0x00;
const OP_1: u8 = 0x51;
const OP_RETURN: u8 = 0x6a;
const OP_DUP: u8 = 0x76;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_HASH160: u8 = 0xa9;
const OP_CHECKSIG: u8 = 0xac;
const OP_CHECKMULTISIG: u8 = 0xae;

/// P2PKH locking script
pub fn output_script_p2pkh(h: &[u8; 20]) -> Result<Script, Error> {
    let mut s = Script::new();
    s.write_bytes(&[OP_DUP, OP_HASH160, 0x14])?;
    s.write_bytes(h)?;
    s.write_bytes(&[OP_EQUALVERIFY, OP_CHECKSIG])?;
    Ok(s)
}

/// P2SH locking script
pub fn output_script_p2sh(h: &[u8; 20]) -> Result<Script, Error> {
    let mut s = Script::new();
    s.write_bytes(&[OP_HASH160, 0x14])?;
    s.write_bytes(h)?;
    write_u8(&mut s, OP_EQUAL)?;
    Ok(s)
}

/// Native segwit locking script for a witness program
pub fn output_script_native_segwit(version: u8, program: &[u8]) -> Result<Script, Error> {
    let mut s = Script::new();
    match version {
        0 => write_u8(&mut s, OP_0)?,
        1..=16 => write_u8(&mut s, OP_1 + version - 1)?,
        _ => return Err(Error::InvalidAddress),
    }
    write_op_push(&mut s, program.len())?;
    s.write_bytes(program)?;
    Ok(s)
}

/// Bare multisig script (used as the P2SH / P2WSH redeem script)
pub fn output_script_multisig(pubkeys: &[PublicKey], m: u32) -> Result<Script, Error> {
    let n = pubkeys.len();
    if n < 1 || n > 15 || m < 1 || m as usize > n {
        return Err(Error::InvalidMultisig);
    }

    let mut s = Script::new();
    write_u8(&mut s, OP_1 + m as u8 - 1)?;
    for k in pubkeys {
        write_op_push(&mut s, k.len())?;
        s.write_bytes(k)?;
    }
    write_u8(&mut s, OP_1 + n as u8 - 1)?;
    write_u8(&mut s, OP_CHECKMULTISIG)?;
    Ok(s)
}

/// Provably unspendable data carrier
pub fn output_script_op_return(data: &[u8]) -> Result<Script, Error> {
    let mut s = Script::new();
    write_u8(&mut s, OP_RETURN)?;
    write_op_push(&mut s, data.len())?;
    s.write_bytes(data)?;
    Ok(s)
}

/// Decode an address to its locking script
pub fn address_to_script(coin: &CoinInfo, address: &str) -> Result<Script, Error> {
    if let Some(hrp) = coin.bech32_prefix {
        let b = address.as_bytes();
        if b.len() > hrp.len()
            && b[..hrp.len()].eq_ignore_ascii_case(hrp.as_bytes())
            && b[hrp.len()] == b'1'
        {
            return decode_segwit(hrp, address);
        }
    }

    decode_base58(coin, address)
}

fn decode_segwit(hrp: &str, address: &str) -> Result<Script, Error> {
    let (decoded_hrp, data, variant) =
        bech32::decode(address).map_err(|_| Error::InvalidAddress)?;
    if decoded_hrp != hrp {
        return Err(Error::InvalidAddress);
    }

    let (version, program) = data.split_first().ok_or(Error::InvalidAddress)?;
    let version = version.to_u8();
    let program = AllocVec::<u8>::from_base32(program).map_err(|_| Error::InvalidAddress)?;

    let valid = match (version, variant) {
        (0, Variant::Bech32) => program.len() == 20 || program.len() == 32,
        (1..=16, Variant::Bech32m) => (2..=40).contains(&program.len()),
        _ => false,
    };
    if !valid {
        return Err(Error::InvalidAddress);
    }

    output_script_native_segwit(version, &program)
}

fn decode_base58(coin: &CoinInfo, address: &str) -> Result<Script, Error> {
    let mut buff = [0u8; 64];
    let n = bs58::decode(address)
        .into(&mut buff[..])
        .map_err(|_| Error::InvalidAddress)?;
    if n < 4 {
        return Err(Error::InvalidAddress);
    }

    let (payload, checksum) = buff[..n].split_at(n - 4);
    if coin.b58_checksum(payload)[..] != checksum[..] {
        return Err(Error::InvalidAddress);
    }

    let check_prefix = |address_type: u32| -> Option<[u8; 20]> {
        let l = address_type_len(address_type);
        if payload.len() != l + 20 {
            return None;
        }
        let prefix = payload[..l]
            .iter()
            .fold(0u32, |a, b| (a << 8) | *b as u32);
        if prefix != address_type {
            return None;
        }
        let mut h = [0u8; 20];
        h.copy_from_slice(&payload[l..]);
        Some(h)
    };

    if let Some(h) = check_prefix(coin.address_type) {
        output_script_p2pkh(&h)
    } else if let Some(h) = check_prefix(coin.address_type_p2sh) {
        output_script_p2sh(&h)
    } else {
        Err(Error::InvalidAddress)
    }
}

/// Witness program for a single key or multisig redeem script
fn witness_program(coin: &CoinInfo, pubkey: &PublicKey, ms: Option<&Multisig>) -> Result<Script, Error> {
    match ms {
        Some(ms) => {
            let redeem = multisig::redeem_script(ms)?;
            output_script_native_segwit(0, &sha256(&redeem))
        }
        None => output_script_native_segwit(0, &coin.hash160(pubkey)),
    }
}

/// Locking script for an output paying back to this wallet
pub fn change_script(
    coin: &CoinInfo,
    script_type: OutputScriptType,
    pubkey: &PublicKey,
    ms: Option<&Multisig>,
) -> Result<Script, Error> {
    use OutputScriptType::*;

    match script_type {
        PayToAddress => output_script_p2pkh(&coin.hash160(pubkey)),
        PayToMultisig => {
            let ms = ms.ok_or(Error::InvalidMultisig)?;
            let redeem = multisig::redeem_script(ms)?;
            output_script_p2sh(&coin.hash160(&redeem))
        }
        PayToWitness if coin.has(CoinFlags::SEGWIT) => witness_program(coin, pubkey, ms),
        PayToP2shWitness if coin.has(CoinFlags::SEGWIT) => {
            let program = witness_program(coin, pubkey, ms)?;
            output_script_p2sh(&coin.hash160(&program))
        }
        _ => Err(Error::UnsupportedScriptType),
    }
}

/// Previous output script committed to by an input signature
/// (key hash, or multisig redeem script)
pub fn script_code(coin: &CoinInfo, txi: &TxInput, pubkey: &PublicKey) -> Result<Script, Error> {
    use InputScriptType::*;

    match (txi.script_type, &txi.multisig) {
        (SpendMultisig, Some(ms)) | (SpendWitness | SpendP2shWitness, Some(ms)) => {
            multisig::redeem_script(ms)
        }
        (SpendAddress | SpendWitness | SpendP2shWitness, None) => {
            output_script_p2pkh(&coin.hash160(pubkey))
        }
        _ => Err(Error::UnsupportedScriptType),
    }
}

/// Push a signature with its hash type
fn append_signature(w: &mut impl Writer, sig: &[u8], hash_type: u32) -> Result<(), Error> {
    write_op_push(w, sig.len() + 1)?;
    w.write_bytes(sig)?;
    write_u8(w, hash_type as u8)
}

/// Witness stack item for a signature with its hash type
fn write_signature_prefixed(w: &mut impl Writer, sig: &[u8], hash_type: u32) -> Result<(), Error> {
    write_varint(w, sig.len() as u64 + 1)?;
    w.write_bytes(sig)?;
    write_u8(w, hash_type as u8)
}

/// Cosigner signatures with ours in place, skipping empty slots
fn multisig_signatures<'a>(
    ms: &'a Multisig,
    sig: &'a Signature,
    index: usize,
) -> Result<impl Iterator<Item = &'a Signature> + 'a, Error> {
    let n = multisig::validate(ms)?;

    if ms.signatures.get(index).map(|s| !s.is_empty()).unwrap_or(false) {
        return Err(Error::InvalidMultisig);
    }

    Ok((0..n).filter_map(move |i| {
        if i == index {
            Some(sig)
        } else {
            ms.signatures.get(i).filter(|s| !s.is_empty())
        }
    }))
}

/// Unlocking script for an input. Signature-less forms are produced for
/// segwit inputs, whose signatures live in the witness.
pub fn input_script_sig(
    coin: &CoinInfo,
    txi: &TxInput,
    pubkey: &PublicKey,
    sig: Option<&Signature>,
    hash_type: u32,
) -> Result<Script, Error> {
    use InputScriptType::*;

    let mut s = Script::new();

    match (txi.script_type, &txi.multisig) {
        (SpendAddress, _) => {
            let sig = sig.ok_or(Error::InvalidState)?;
            append_signature(&mut s, sig, hash_type)?;
            write_op_push(&mut s, pubkey.len())?;
            s.write_bytes(pubkey)?;
        }
        (SpendMultisig, Some(ms)) => {
            let sig = sig.ok_or(Error::InvalidState)?;
            let index = multisig::pubkey_index(ms, pubkey)?;

            // Leading OP_0 for the CHECKMULTISIG extra pop, not present on Decred
            if !coin.is_decred() {
                write_u8(&mut s, OP_0)?;
            }
            for sig in multisig_signatures(ms, sig, index)? {
                append_signature(&mut s, sig, hash_type)?;
            }

            let redeem = multisig::redeem_script(ms)?;
            write_op_push(&mut s, redeem.len())?;
            s.write_bytes(&redeem)?;
        }
        (SpendP2shWitness, ms) => {
            let program = witness_program(coin, pubkey, ms.as_ref())?;
            write_op_push(&mut s, program.len())?;
            s.write_bytes(&program)?;
        }
        (SpendWitness, _) => (),
        _ => return Err(Error::UnsupportedScriptType),
    }

    Ok(s)
}

/// Serialized witness stack for a segwit input
pub fn witness(
    txi: &TxInput,
    pubkey: &PublicKey,
    sig: &Signature,
    hash_type: u32,
) -> Result<Script, Error> {
    let mut w = Script::new();

    match &txi.multisig {
        None => {
            write_varint(&mut w, 2)?;
            write_signature_prefixed(&mut w, sig, hash_type)?;
            write_varint(&mut w, pubkey.len() as u64)?;
            w.write_bytes(pubkey)?;
        }
        Some(ms) => {
            let index = multisig::pubkey_index(ms, pubkey)?;
            let count = multisig_signatures(ms, sig, index)?.count();

            // Empty item for the CHECKMULTISIG extra pop, signatures, redeem script
            write_varint(&mut w, count as u64 + 2)?;
            write_varint(&mut w, 0)?;
            for sig in multisig_signatures(ms, sig, index)? {
                write_signature_prefixed(&mut w, sig, hash_type)?;
            }

            let redeem = multisig::redeem_script(ms)?;
            write_varint(&mut w, redeem.len() as u64)?;
            w.write_bytes(&redeem)?;
        }
    }

    Ok(w)
}

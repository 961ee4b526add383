// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Multisig descriptor validation and fingerprinting

use heapless::Vec;

use crate::{
    engine::Error,
    hash::{HashWriter, Sha256Writer},
    scripts,
    tx::{Multisig, PublicKey, Script, MAX_COSIGNERS},
    writers::write_u32,
};

/// Validate a multisig descriptor, returning the number of cosigners
pub fn validate(ms: &Multisig) -> Result<usize, Error> {
    let n = ms.pubkeys.len();

    if n == 0 || n > MAX_COSIGNERS || ms.m == 0 || ms.m as usize > n {
        return Err(Error::InvalidMultisig);
    }

    if ms.signatures.len() > n {
        return Err(Error::InvalidMultisig);
    }

    if ms.pubkeys.iter().any(|k| k[0] != 0x02 && k[0] != 0x03) {
        return Err(Error::InvalidMultisig);
    }

    Ok(n)
}

/// Canonical digest of the key set and threshold, independent of key order
pub fn fingerprint(ms: &Multisig) -> Result<[u8; 32], Error> {
    let n = validate(ms)?;

    let mut keys: Vec<PublicKey, MAX_COSIGNERS> = ms.pubkeys.clone();
    keys.sort_unstable();

    let mut h = Sha256Writer::default();
    write_u32(&mut h, ms.m)?;
    write_u32(&mut h, n as u32)?;
    for k in &keys {
        h.update(k);
    }

    Ok(h.digest())
}

/// Position of `pubkey` within the descriptor
pub fn pubkey_index(ms: &Multisig, pubkey: &PublicKey) -> Result<usize, Error> {
    ms.pubkeys
        .iter()
        .position(|k| k == pubkey)
        .ok_or(Error::InvalidMultisig)
}

/// Redeem script for the descriptor
pub fn redeem_script(ms: &Multisig) -> Result<Script, Error> {
    validate(ms)?;
    scripts::output_script_multisig(&ms.pubkeys, ms.m)
}

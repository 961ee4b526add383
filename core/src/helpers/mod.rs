// Copyright (c) 2022-2023 The MobileCoin Foundation

use core::fmt::Write;

use heapless::String;

use crate::{
    coin::CoinInfo,
    engine::Error,
    tx::{Signature, MAX_SIGNATURE_SIZE},
};

/// Formatted amount buffer
pub type AmountStr = String<40>;

/// Format helper for amounts, using the coin's decimals and shortcut
pub fn fmt_amount(value: u64, coin: &CoinInfo) -> AmountStr {
    let mut s = AmountStr::new();

    let scalar = 10u64.pow(coin.decimals as u32);
    let (whole, frac) = (value / scalar, value % scalar);

    let r = if frac == 0 {
        write!(&mut s, "{} {}", whole, coin.shortcut)
    } else {
        // Trim trailing zeros from the fractional part
        let mut digits = coin.decimals as usize;
        let mut frac = frac;
        while frac % 10 == 0 {
            frac /= 10;
            digits -= 1;
        }
        write!(&mut s, "{}.{:0width$} {}", whole, frac, coin.shortcut, width = digits)
    };

    if r.is_err() {
        s.clear();
        let _ = s.push_str("ENCODE_ERR");
    }

    s
}

/// DER-encode a compact `r || s` ECDSA signature
pub fn der_encode_signature(compact: &[u8; 64]) -> Result<Signature, Error> {
    let mut out = Signature::new();

    let (r, s) = compact.split_at(32);
    let (r_len, s_len) = (der_int_len(r), der_int_len(s));

    let seq_len = 2 + r_len + 2 + s_len;
    if seq_len + 2 > MAX_SIGNATURE_SIZE {
        return Err(Error::SignError);
    }

    push(&mut out, 0x30)?;
    push(&mut out, seq_len as u8)?;
    der_write_int(&mut out, r, r_len)?;
    der_write_int(&mut out, s, s_len)?;

    Ok(out)
}

fn push(out: &mut Signature, b: u8) -> Result<(), Error> {
    out.push(b).map_err(|_| Error::SignError)
}

/// Strip leading zeros, keeping one byte for zero values
fn der_int_trim(v: &[u8]) -> &[u8] {
    let start = v.iter().position(|b| *b != 0).unwrap_or(v.len() - 1);
    &v[start..]
}

/// Encoded integer length, including a sign padding byte where required
fn der_int_len(v: &[u8]) -> usize {
    let t = der_int_trim(v);
    t.len() + (t[0] >= 0x80) as usize
}

fn der_write_int(out: &mut Signature, v: &[u8], len: usize) -> Result<(), Error> {
    let t = der_int_trim(v);

    push(out, 0x02)?;
    push(out, len as u8)?;
    if t[0] >= 0x80 {
        push(out, 0x00)?;
    }
    out.extend_from_slice(t).map_err(|_| Error::SignError)
}

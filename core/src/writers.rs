// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Consensus serialization primitives

use byteorder::{ByteOrder, LittleEndian};
use heapless::Vec;

use crate::{
    engine::Error,
    tx::{TxHash, TxIn, TxInput},
};

/// Sink for serialized transaction data (buffers and hashers)
pub trait Writer {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Error>;
}

impl<const N: usize> Writer for Vec<u8, N> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        self.extend_from_slice(data).map_err(|_| Error::BufferFull)
    }
}

impl<T: Writer> Writer for &mut T {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        T::write_bytes(self, data)
    }
}

pub fn write_u8(w: &mut impl Writer, v: u8) -> Result<(), Error> {
    w.write_bytes(&[v])
}

pub fn write_u16(w: &mut impl Writer, v: u16) -> Result<(), Error> {
    let mut b = [0u8; 2];
    LittleEndian::write_u16(&mut b, v);
    w.write_bytes(&b)
}

pub fn write_u32(w: &mut impl Writer, v: u32) -> Result<(), Error> {
    let mut b = [0u8; 4];
    LittleEndian::write_u32(&mut b, v);
    w.write_bytes(&b)
}

pub fn write_u64(w: &mut impl Writer, v: u64) -> Result<(), Error> {
    let mut b = [0u8; 8];
    LittleEndian::write_u64(&mut b, v);
    w.write_bytes(&b)
}

/// Bitcoin CompactSize integer
pub fn write_varint(w: &mut impl Writer, n: u64) -> Result<(), Error> {
    match n {
        0..=0xfc => write_u8(w, n as u8),
        0xfd..=0xffff => {
            write_u8(w, 0xfd)?;
            write_u16(w, n as u16)
        }
        0x1_0000..=0xffff_ffff => {
            write_u8(w, 0xfe)?;
            write_u32(w, n as u32)
        }
        _ => {
            write_u8(w, 0xff)?;
            write_u64(w, n)
        }
    }
}

/// Length of a CompactSize encoding
pub const fn varint_size(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Write a script push opcode for `n` bytes of data
pub fn write_op_push(w: &mut impl Writer, n: usize) -> Result<(), Error> {
    if n < 0x4c {
        write_u8(w, n as u8)
    } else if n < 0x100 {
        write_u8(w, 0x4c)?;
        write_u8(w, n as u8)
    } else if n < 0x1_0000 {
        write_u8(w, 0x4d)?;
        write_u16(w, n as u16)
    } else {
        write_u8(w, 0x4e)?;
        write_u32(w, n as u32)
    }
}

/// Length of a script push opcode for `n` bytes of data
pub const fn op_push_size(n: usize) -> usize {
    if n < 0x4c {
        1
    } else if n < 0x100 {
        2
    } else if n < 0x1_0000 {
        3
    } else {
        5
    }
}

/// Write a length-prefixed byte string
pub fn write_bytes_prefixed(w: &mut impl Writer, b: &[u8]) -> Result<(), Error> {
    write_varint(w, b.len() as u64)?;
    w.write_bytes(b)
}

/// Write a transaction hash in serialization (reversed) order
pub fn write_tx_hash(w: &mut impl Writer, h: &TxHash) -> Result<(), Error> {
    let mut b = *h;
    b.reverse();
    w.write_bytes(&b)
}

/// Standard transaction input
pub fn write_tx_input(w: &mut impl Writer, txi: &impl TxIn, script_sig: &[u8]) -> Result<(), Error> {
    write_tx_hash(w, txi.prev_hash())?;
    write_u32(w, txi.prev_index())?;
    write_bytes_prefixed(w, script_sig)?;
    write_u32(w, txi.sequence())
}

/// Input form used for pass consistency digests, covering every field the
/// host could alter between passes
pub fn write_tx_input_check(w: &mut impl Writer, txi: &TxInput) -> Result<(), Error> {
    w.write_bytes(&txi.prev_hash)?;
    write_u32(w, txi.prev_index)?;
    write_u32(w, txi.script_type.into())?;
    write_u32(w, txi.address_n.len() as u32)?;
    for n in &txi.address_n {
        write_u32(w, *n)?;
    }
    write_u32(w, txi.sequence)?;
    write_u64(w, txi.amount.unwrap_or(0))
}

/// Standard transaction output
pub fn write_tx_output(w: &mut impl Writer, amount: u64, script_pubkey: &[u8]) -> Result<(), Error> {
    write_u64(w, amount)?;
    write_bytes_prefixed(w, script_pubkey)
}

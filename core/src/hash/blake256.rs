// Copyright (c) 2022-2023 The MobileCoin Foundation

//! BLAKE-256 (14 rounds), as used by Decred

use byteorder::{BigEndian, ByteOrder};

const IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

const C: [u32; 16] = [
    0x243f6a88, 0x85a308d3, 0x13198a2e, 0x03707344, 0xa4093822, 0x299f31d0, 0x082efa98, 0xec4e6c89,
    0x452821e6, 0x38d01377, 0xbe5466cf, 0x34e90c6c, 0xc0ac29b7, 0xc97c50dd, 0x3f84d5b5, 0xb5470917,
];

const SIGMA: [[usize; 16]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
];

const ROUNDS: usize = 14;

const BLOCK_SIZE: usize = 64;

/// Incremental BLAKE-256 hasher
#[derive(Clone)]
pub struct Blake256 {
    h: [u32; 8],
    buf: [u8; BLOCK_SIZE],
    buf_len: usize,
    /// Message bits compressed so far
    t: u64,
}

impl Default for Blake256 {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Blake256 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Blake256").field("t", &self.t).finish()
    }
}

impl Blake256 {
    pub const fn new() -> Self {
        Self {
            h: IV,
            buf: [0u8; BLOCK_SIZE],
            buf_len: 0,
            t: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let n = (BLOCK_SIZE - self.buf_len).min(data.len());
            self.buf[self.buf_len..][..n].copy_from_slice(&data[..n]);
            self.buf_len += n;
            data = &data[n..];

            if self.buf_len == BLOCK_SIZE {
                self.t += (BLOCK_SIZE * 8) as u64;
                let block = self.buf;
                self.compress(&block, self.t);
                self.buf_len = 0;
            }
        }
    }

    pub fn finalize(mut self) -> [u8; 32] {
        let n = self.buf_len;
        let bits = self.t + (n as u64) * 8;

        let mut len = [0u8; 8];
        BigEndian::write_u64(&mut len, bits);

        let mut block = [0u8; BLOCK_SIZE];
        block[..n].copy_from_slice(&self.buf[..n]);

        if n < 56 {
            // Padding and length fit in the final block, which only carries a
            // counter when it contains message bits
            block[n] |= 0x80;
            block[55] |= 0x01;
            block[56..].copy_from_slice(&len);

            let t = if n == 0 { 0 } else { bits };
            self.compress(&block, t);
        } else {
            block[n] = 0x80;
            self.compress(&block, bits);

            let mut last = [0u8; BLOCK_SIZE];
            last[55] = 0x01;
            last[56..].copy_from_slice(&len);
            self.compress(&last, 0);
        }

        let mut out = [0u8; 32];
        for (i, h) in self.h.iter().enumerate() {
            BigEndian::write_u32(&mut out[i * 4..][..4], *h);
        }
        out
    }

    fn compress(&mut self, block: &[u8; BLOCK_SIZE], t: u64) {
        let mut m = [0u32; 16];
        for (i, w) in m.iter_mut().enumerate() {
            *w = BigEndian::read_u32(&block[i * 4..][..4]);
        }

        let t0 = t as u32;
        let t1 = (t >> 32) as u32;

        let mut v = [0u32; 16];
        v[..8].copy_from_slice(&self.h);
        v[8..12].copy_from_slice(&C[..4]);
        v[12] = t0 ^ C[4];
        v[13] = t0 ^ C[5];
        v[14] = t1 ^ C[6];
        v[15] = t1 ^ C[7];

        for r in 0..ROUNDS {
            let s = &SIGMA[r % 10];

            g(&mut v, &m, s, 0, 0, 4, 8, 12);
            g(&mut v, &m, s, 1, 1, 5, 9, 13);
            g(&mut v, &m, s, 2, 2, 6, 10, 14);
            g(&mut v, &m, s, 3, 3, 7, 11, 15);

            g(&mut v, &m, s, 4, 0, 5, 10, 15);
            g(&mut v, &m, s, 5, 1, 6, 11, 12);
            g(&mut v, &m, s, 6, 2, 7, 8, 13);
            g(&mut v, &m, s, 7, 3, 4, 9, 14);
        }

        for i in 0..8 {
            self.h[i] ^= v[i] ^ v[i + 8];
        }
    }
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn g(v: &mut [u32; 16], m: &[u32; 16], s: &[usize; 16], i: usize, a: usize, b: usize, c: usize, d: usize) {
    let (x, y) = (s[2 * i], s[2 * i + 1]);

    v[a] = v[a].wrapping_add(v[b]).wrapping_add(m[x] ^ C[y]);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(12);

    v[a] = v[a].wrapping_add(v[b]).wrapping_add(m[y] ^ C[x]);
    v[d] = (v[d] ^ v[a]).rotate_right(8);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(7);
}

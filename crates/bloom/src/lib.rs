//! # Bloom Filter
//!
//! Answers "is this key definitely absent?" for a sorted table without
//! touching any data block. False positives are permitted (they cost one
//! wasted block read); false negatives are forbidden — every key inserted
//! must report [`Bloom::may_contain`] = `true` forever.
//!
//! Each SSTable reserves a filter region between its data blocks and its
//! index. An empty region means "no filter", which readers treat as
//! "always may contain".
//!
//! ## Serialized region layout (little-endian)
//!
//! ```text
//! u32 num_hashes   k
//! u32 num_bits     m
//! bytes bits       ceil(m / 8) bytes
//! ```

use std::io::{self, Read, Write};

/// Safety cap when deserializing: a filter region larger than this is
/// treated as corrupt rather than allocated.
const MAX_FILTER_BYTES: u32 = 64 * 1024 * 1024;

/// A bloom filter over a fixed bit array with `k` derived hash positions.
///
/// Hashing is FNV-1a double hashing: two independent 64-bit digests `h1`,
/// `h2`, probing `h1 + i * h2 (mod m)` for `i in 0..k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bloom {
    bits: Vec<u8>,
    num_bits: u32,
    num_hashes: u32,
}

impl Bloom {
    /// Sizes a filter for `expected_items` insertions at a target false
    /// positive rate, using the standard optimal formulas
    /// `m = -n·ln(p) / ln(2)²` and `k = (m/n)·ln(2)`.
    ///
    /// # Panics
    ///
    /// Panics if `expected_items` is zero or `fpr` is outside `(0, 1)`.
    pub fn with_fpr(expected_items: usize, fpr: f64) -> Self {
        assert!(expected_items > 0, "expected_items must be > 0");
        assert!(fpr > 0.0 && fpr < 1.0, "fpr must be in (0, 1)");

        let n = expected_items as f64;
        let m = (-n * fpr.ln() / (std::f64::consts::LN_2 * std::f64::consts::LN_2)).ceil();
        let num_bits = (m as u32).max(8);
        let num_hashes = (((num_bits as f64 / n) * std::f64::consts::LN_2).ceil() as u32).max(1);

        Self {
            bits: vec![0u8; num_bits.div_ceil(8) as usize],
            num_bits,
            num_hashes,
        }
    }

    /// Marks `key` as present.
    pub fn insert(&mut self, key: &[u8]) {
        let (h1, h2) = digests(key);
        for i in 0..self.num_hashes {
            let pos = probe(h1, h2, i, self.num_bits);
            self.bits[(pos / 8) as usize] |= 1 << (pos % 8);
        }
    }

    /// Returns `false` only if `key` was never inserted.
    #[must_use]
    pub fn may_contain(&self, key: &[u8]) -> bool {
        let (h1, h2) = digests(key);
        (0..self.num_hashes).all(|i| {
            let pos = probe(h1, h2, i, self.num_bits);
            self.bits[(pos / 8) as usize] & (1 << (pos % 8)) != 0
        })
    }

    /// Size of the serialized region in bytes.
    #[must_use]
    pub fn region_len(&self) -> usize {
        4 + 4 + self.bits.len()
    }

    /// Serializes the filter region to `w`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.num_hashes.to_le_bytes())?;
        w.write_all(&self.num_bits.to_le_bytes())?;
        w.write_all(&self.bits)?;
        Ok(())
    }

    /// Deserializes a filter region from `r`.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut word = [0u8; 4];

        r.read_exact(&mut word)?;
        let num_hashes = u32::from_le_bytes(word);

        r.read_exact(&mut word)?;
        let num_bits = u32::from_le_bytes(word);

        let byte_len = num_bits.div_ceil(8);
        if num_bits == 0 || num_hashes == 0 || byte_len > MAX_FILTER_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("implausible filter geometry: k={num_hashes} m={num_bits}"),
            ));
        }

        let mut bits = vec![0u8; byte_len as usize];
        r.read_exact(&mut bits)?;

        Ok(Self {
            bits,
            num_bits,
            num_hashes,
        })
    }

    #[must_use]
    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }
}

/// Two independent FNV-1a digests of `key`; the second folds in a salt byte
/// and is forced non-zero so the probe stride never degenerates.
fn digests(key: &[u8]) -> (u64, u64) {
    let h1 = fnv1a(key, None);
    let mut h2 = fnv1a(key, Some(0x01));
    if h2 == 0 {
        h2 = 1;
    }
    (h1, h2)
}

fn probe(h1: u64, h2: u64, i: u32, num_bits: u32) -> u32 {
    (h1.wrapping_add((i as u64).wrapping_mul(h2)) % num_bits as u64) as u32
}

fn fnv1a(data: &[u8], salt: Option<u8>) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET_BASIS;
    for &byte in data {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    if let Some(salt) = salt {
        hash ^= u64::from(salt);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests;

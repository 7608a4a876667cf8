//! PangYa's XTEA variant — block primitive, buffer ops, and stream modes.
//!
//! # Differences from textbook XTEA
//!
//! - 16 rounds instead of 32.
//! - Encryption starts `sum` at 0 and **subtracts** `delta = 0x61C88647`
//!   each round; decryption starts `sum` at `0xE3779B90` and adds it back.
//! - Block halves are little-endian u32; all arithmetic wraps.
//!
//! These conventions are frozen — they are what the game client ships with,
//! and every pak file table and update-list stream depends on them.
//!
//! # Stream modes
//!
//! The plain stream functions transform exactly eight bytes per iteration
//! and fail with [`CipherError::Length`] on a trailing partial block.  The
//! `_pad_null` / `_trim_null` pair exists for payloads that are not
//! block-aligned: the encipher side right-pads the final short read with
//! zero bytes, and the decipher side elides trailing zeros so the original
//! byte stream round-trips exactly (provided it did not itself end in a
//! zero byte — update-list XML never does).

use std::io::{self, Read, Write};
use thiserror::Error;

/// Number of bytes in an XTEA block.
pub const BLOCK_SIZE: usize = 8;

const NUM_ROUNDS: usize = 16;
const DELTA: u32 = 0x61C8_8647;
/// Initial `sum` for decryption: the value `sum` holds after 16 encrypt
/// rounds of subtracting `DELTA` from 0.
const DECRYPT_SUM: u32 = 0xE377_9B90;

// ── Keys ─────────────────────────────────────────────────────────────────────

/// A 128-bit XTEA key, viewed as four little-endian u32 words.
///
/// Keys are plain values: `Copy`, comparable, and safe to share across
/// threads.  The six regional release keys below are the only keys the
/// formats ever use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub [u32; 4]);

impl Key {
    #[inline]
    fn word(self, i: u32) -> u32 {
        self.0[(i & 3) as usize]
    }
}

/// Key for the Global (US) client.
pub const KEY_US: Key = Key([0x3B1E_E355, 0x0908_D97A, 0x5A64_D2FB, 0xFBE1_C61E]);
/// Key for the Japanese client.
pub const KEY_JP: Key = Key([0xE2E7_4299, 0x9DA3_1A56, 0x0B3D_63F5, 0x642C_255A]);
/// Key for the Thai client.
pub const KEY_TH: Key = Key([0xAD7C_0AD5, 0x9D76_08F8, 0x57B2_83FD, 0xADA4_227C]);
/// Key for the European client.
pub const KEY_EU: Key = Key([0x4378_9E90, 0xAF7A_8ED7, 0x95C1_F124, 0x0853_EE1B]);
/// Key for the Indonesian client.
pub const KEY_ID: Key = Key([0x704E_3796, 0x40FF_CA5B, 0x8EE9_A3DE, 0xA342_0376]);
/// Key for the Korean client.
pub const KEY_KR: Key = Key([0xF761_7B69, 0x0916_7E42, 0x44E8_88F8, 0xE70F_476B]);

/// Every regional key, in the order detection tries them.
pub const ALL_KEYS: [Key; 6] = [KEY_US, KEY_JP, KEY_TH, KEY_EU, KEY_ID, KEY_KR];

/// A regional release of the game, naming one entry of [`ALL_KEYS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Us,
    Jp,
    Th,
    Eu,
    Id,
    Kr,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::Us,
        Region::Jp,
        Region::Th,
        Region::Eu,
        Region::Id,
        Region::Kr,
    ];

    /// The key this region's client uses.
    #[inline]
    pub fn key(self) -> Key {
        match self {
            Region::Us => KEY_US,
            Region::Jp => KEY_JP,
            Region::Th => KEY_TH,
            Region::Eu => KEY_EU,
            Region::Id => KEY_ID,
            Region::Kr => KEY_KR,
        }
    }

    /// Two-letter region code, as used on the command line.
    pub fn code(self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Jp => "jp",
            Region::Th => "th",
            Region::Eu => "eu",
            Region::Id => "id",
            Region::Kr => "kr",
        }
    }

    /// Parse a region code.
    pub fn from_code(s: &str) -> Option<Region> {
        match s.to_lowercase().as_str() {
            "us" => Some(Region::Us),
            "jp" => Some(Region::Jp),
            "th" => Some(Region::Th),
            "eu" => Some(Region::Eu),
            "id" => Some(Region::Id),
            "kr" => Some(Region::Kr),
            _ => None,
        }
    }

    /// Reverse-map a key back to its region, if it is one of the six.
    pub fn from_key(key: Key) -> Option<Region> {
        Region::ALL.into_iter().find(|r| r.key() == key)
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CipherError {
    /// A buffer or stream ended on a non-empty partial block.  Use the
    /// `_pad_null` / `_trim_null` stream pair for unaligned payloads.
    #[error("cipher input ends on a partial block ({0} trailing bytes, need 8)")]
    Length(usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Block primitive ──────────────────────────────────────────────────────────

/// Encrypt a single 8-byte block in place.
pub fn encrypt_block(key: Key, block: &mut [u8; BLOCK_SIZE]) {
    let mut data0 = u32::from_le_bytes(block[0..4].try_into().unwrap());
    let mut data1 = u32::from_le_bytes(block[4..8].try_into().unwrap());
    let mut sum = 0u32;
    for _ in 0..NUM_ROUNDS {
        data0 = data0.wrapping_add(
            (((data1 << 4) ^ (data1 >> 5)).wrapping_add(data1))
                ^ sum.wrapping_add(key.word(sum)),
        );
        sum = sum.wrapping_sub(DELTA);
        data1 = data1.wrapping_add(
            (((data0 << 4) ^ (data0 >> 5)).wrapping_add(data0))
                ^ sum.wrapping_add(key.word(sum >> 11)),
        );
    }
    block[0..4].copy_from_slice(&data0.to_le_bytes());
    block[4..8].copy_from_slice(&data1.to_le_bytes());
}

/// Decrypt a single 8-byte block in place.
pub fn decrypt_block(key: Key, block: &mut [u8; BLOCK_SIZE]) {
    let mut data0 = u32::from_le_bytes(block[0..4].try_into().unwrap());
    let mut data1 = u32::from_le_bytes(block[4..8].try_into().unwrap());
    let mut sum = DECRYPT_SUM;
    for _ in 0..NUM_ROUNDS {
        data1 = data1.wrapping_sub(
            (((data0 << 4) ^ (data0 >> 5)).wrapping_add(data0))
                ^ sum.wrapping_add(key.word(sum >> 11)),
        );
        sum = sum.wrapping_add(DELTA);
        data0 = data0.wrapping_sub(
            (((data1 << 4) ^ (data1 >> 5)).wrapping_add(data1))
                ^ sum.wrapping_add(key.word(sum)),
        );
    }
    block[0..4].copy_from_slice(&data0.to_le_bytes());
    block[4..8].copy_from_slice(&data1.to_le_bytes());
}

// ── Buffer ops ───────────────────────────────────────────────────────────────

/// Encrypt a whole buffer in place.  The length must be a multiple of 8.
pub fn encipher(key: Key, buf: &mut [u8]) -> Result<(), CipherError> {
    transform_buffer(key, buf, encrypt_block)
}

/// Decrypt a whole buffer in place.  The length must be a multiple of 8.
pub fn decipher(key: Key, buf: &mut [u8]) -> Result<(), CipherError> {
    transform_buffer(key, buf, decrypt_block)
}

fn transform_buffer(
    key: Key,
    buf: &mut [u8],
    block_fn: fn(Key, &mut [u8; BLOCK_SIZE]),
) -> Result<(), CipherError> {
    let rem = buf.len() % BLOCK_SIZE;
    if rem != 0 {
        return Err(CipherError::Length(rem));
    }
    for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
        block_fn(key, chunk.try_into().unwrap());
    }
    Ok(())
}

// ── Stream ops ───────────────────────────────────────────────────────────────

/// Encrypt a stream, eight bytes at a time.
///
/// Fails with [`CipherError::Length`] if the stream ends on a non-empty
/// partial block.
pub fn encipher_stream<R: Read, W: Write>(key: Key, r: R, w: W) -> Result<(), CipherError> {
    transform_stream(key, r, w, encrypt_block)
}

/// Decrypt a stream, eight bytes at a time.
///
/// Fails with [`CipherError::Length`] if the stream ends on a non-empty
/// partial block.
pub fn decipher_stream<R: Read, W: Write>(key: Key, r: R, w: W) -> Result<(), CipherError> {
    transform_stream(key, r, w, decrypt_block)
}

/// Encrypt a stream whose length need not be block-aligned; the final short
/// read is right-padded with zero bytes before encryption.  An empty stream
/// stays empty.
pub fn encipher_stream_pad_null<R: Read, W: Write>(
    key: Key,
    r: R,
    w: W,
) -> Result<(), CipherError> {
    transform_stream(key, NullPadReader::new(r), w, encrypt_block)
}

/// Decrypt a stream produced by [`encipher_stream_pad_null`], dropping the
/// zero-byte padding again.
///
/// A run of zero bytes is held back until a non-zero byte arrives; a run
/// still pending at end-of-stream is discarded as padding.
pub fn decipher_stream_trim_null<R: Read, W: Write>(
    key: Key,
    mut r: R,
    mut w: W,
) -> Result<(), CipherError> {
    let mut buf = [0u8; BLOCK_SIZE];
    let mut pending_zeros = 0usize;
    loop {
        let n = read_block(&mut r, &mut buf)?;
        if n == 0 {
            return Ok(());
        } else if n != BLOCK_SIZE {
            return Err(CipherError::Length(n));
        }
        decrypt_block(key, &mut buf);
        for &b in &buf {
            if b == 0 {
                pending_zeros += 1;
            } else {
                while pending_zeros > 0 {
                    w.write_all(&[0])?;
                    pending_zeros -= 1;
                }
                w.write_all(&[b])?;
            }
        }
    }
}

fn transform_stream<R: Read, W: Write>(
    key: Key,
    mut r: R,
    mut w: W,
    block_fn: fn(Key, &mut [u8; BLOCK_SIZE]),
) -> Result<(), CipherError> {
    let mut buf = [0u8; BLOCK_SIZE];
    loop {
        let n = read_block(&mut r, &mut buf)?;
        if n == 0 {
            return Ok(());
        } else if n != BLOCK_SIZE {
            return Err(CipherError::Length(n));
        }
        block_fn(key, &mut buf);
        w.write_all(&buf)?;
    }
}

/// Read up to one block, retrying short reads until the buffer is full or
/// the stream is exhausted.  Returns the number of bytes obtained.
fn read_block<R: Read>(r: &mut R, buf: &mut [u8; BLOCK_SIZE]) -> io::Result<usize> {
    let mut n = 0;
    while n < BLOCK_SIZE {
        match r.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(m) => n += m,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(n)
}

// ── Null padding ─────────────────────────────────────────────────────────────

/// Reader adapter that zero-pads the final short read to the requested
/// length.  An empty terminal read stays empty, so padding is only ever
/// appended to real data.
struct NullPadReader<R> {
    inner: R,
    eof: bool,
}

impl<R: Read> NullPadReader<R> {
    fn new(inner: R) -> Self {
        NullPadReader { inner, eof: false }
    }
}

impl<R: Read> Read for NullPadReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.eof || buf.is_empty() {
            return Ok(0);
        }
        let mut n = 0;
        while n < buf.len() {
            match self.inner.read(&mut buf[n..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(m) => n += m,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        if n > 0 && n < buf.len() {
            buf[n..].fill(0);
            n = buf.len();
        }
        Ok(n)
    }
}

//! Single-pak reader: trailer parsing, file-table iteration with metadata
//! deobfuscation, and payload reads.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use encoding_rs::EUC_KR;
use memmap2::Mmap;

use super::decompress::{decompress, decompressed_len};
use super::format::{
    FileEntry, RawEntry, Trailer, CLASS_PLAIN, CLASS_XTEA, ENTRY_LEN, SIGNATURE, TRAILER_LEN,
    XOR_MASK,
};
use super::{Error, Result};
use crate::xtea::{self, Key};

// ── Backing storage ──────────────────────────────────────────────────────────

/// The bytes of one pak file.
///
/// Normally a memory mapping, so payload reads are page-fault cheap and the
/// whole archive never has to be resident at once; an owned buffer is
/// accepted for callers that already hold the bytes.  Wrapped in an [`Arc`]
/// by the reader so region detection can trial several keys against the
/// same mapping without reopening the file.
#[derive(Debug)]
pub enum PakData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl PakData {
    /// Map a pak file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<PakData> {
        let file = File::open(path)?;
        // Safety: pak files are immutable game assets; nothing rewrites
        // them while mounted.
        let map = unsafe { Mmap::map(&file)? };
        Ok(PakData::Mapped(map))
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            PakData::Mapped(map) => map,
            PakData::Owned(buf) => buf,
        }
    }
}

impl AsRef<[u8]> for PakData {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

// ── Reader ───────────────────────────────────────────────────────────────────

/// Reads one pak file: the trailer, the file table, and entry payloads.
pub struct Reader {
    key: Key,
    data: Arc<PakData>,
    trailer: Trailer,
}

impl Reader {
    /// Map `path` and parse its trailer.
    pub fn open<P: AsRef<Path>>(key: Key, path: P) -> Result<Reader> {
        Reader::new(key, Arc::new(PakData::open(path)?))
    }

    /// Construct a reader over bytes already in memory.
    pub fn from_bytes(key: Key, bytes: Vec<u8>) -> Result<Reader> {
        Reader::new(key, Arc::new(PakData::Owned(bytes)))
    }

    /// Parse the trailer of `data` and reject non-pak files.
    pub fn new(key: Key, data: Arc<PakData>) -> Result<Reader> {
        let bytes = data.as_slice();
        if bytes.len() < TRAILER_LEN {
            return Err(Error::Truncated {
                offset: 0,
                needed: TRAILER_LEN as u64,
            });
        }
        let tail: &[u8; TRAILER_LEN] = bytes[bytes.len() - TRAILER_LEN..].try_into().unwrap();
        let trailer = Trailer::parse(tail);
        if trailer.signature != SIGNATURE {
            return Err(Error::InvalidSignature(trailer.signature));
        }
        Ok(Reader { key, data, trailer })
    }

    #[inline]
    pub fn trailer(&self) -> Trailer {
        self.trailer
    }

    /// Shared handle to the backing bytes.
    #[inline]
    pub fn data(&self) -> Arc<PakData> {
        Arc::clone(&self.data)
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    // ── File table ───────────────────────────────────────────────────────────

    /// Walk the file table, invoking `callback` with each decoded path and
    /// entry.  Returning `false` from the callback stops the walk early;
    /// that is not an error.
    pub fn read_file_table<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(&str, FileEntry) -> bool,
    {
        match self.walk_file_table(&mut callback) {
            Err(Error::Stopped) => Ok(()),
            other => other,
        }
    }

    fn walk_file_table<F>(&self, callback: &mut F) -> Result<()>
    where
        F: FnMut(&str, FileEntry) -> bool,
    {
        let bytes = self.bytes();
        let mut pos = self.trailer.file_list_offset as usize;

        for _ in 0..self.trailer.file_count {
            let mut buf: [u8; ENTRY_LEN] = read_array(bytes, pos)?;
            pos += ENTRY_LEN;

            // XTEA metadata: offset and real_size travel as one enciphered
            // block assembled from bytes 2..6 and 10..14; packed_size and
            // the two leading bytes stay in clear.
            if buf[1] & 0xF0 == CLASS_XTEA {
                let mut scratch = [0u8; 8];
                scratch[..4].copy_from_slice(&buf[2..6]);
                scratch[4..].copy_from_slice(&buf[10..14]);
                xtea::decrypt_block(self.key, &mut scratch);
                buf[2..6].copy_from_slice(&scratch[..4]);
                buf[10..14].copy_from_slice(&scratch[4..]);
            }

            let mut raw = RawEntry::parse(&buf);
            let path_len = raw.path_length as usize;

            let raw_path: Vec<u8> = match raw.entry_type & 0xF0 {
                CLASS_XTEA => {
                    if path_len % xtea::BLOCK_SIZE != 0 {
                        return Err(Error::PathDecode(path_len));
                    }
                    let mut path: Vec<u8> = read_slice(bytes, pos, path_len)?.to_vec();
                    pos += path_len;
                    xtea::decipher(self.key, &mut path)
                        .map_err(|_| Error::PathDecode(path_len))?;
                    // Enciphered paths are padded to the block size with
                    // 0xCD (sometimes 0x00); strip the filler.
                    while matches!(path.last(), Some(&(0xCD | 0x00))) {
                        path.pop();
                    }
                    path
                }
                CLASS_PLAIN => {
                    // Plain debug entries still carry a terminator byte.
                    let path = read_slice(bytes, pos, path_len + 1)?;
                    pos += path_len + 1;
                    path[..path_len].to_vec()
                }
                // High nibble 0 (and anything unrecognised) is the legacy
                // XOR class.
                _ => {
                    let path = read_slice(bytes, pos, path_len + 1)?;
                    pos += path_len + 1;
                    raw.real_size ^= XOR_MASK as u32;
                    path[..path_len].iter().map(|b| b ^ XOR_MASK).collect()
                }
            };

            let path = decode_path(&raw_path);
            let entry = FileEntry {
                offset: raw.offset,
                packed_size: raw.packed_size,
                real_size: raw.real_size,
                compression: raw.entry_type & 0x0F,
            };

            if !callback(&path, entry) {
                return Err(Error::Stopped);
            }
        }

        Ok(())
    }

    // ── Payload access ───────────────────────────────────────────────────────

    /// Read and decode an entry's entire payload.
    pub fn read_file(&self, entry: FileEntry) -> Result<Vec<u8>> {
        decompress(entry, self.bytes())
    }

    /// The entry's plaintext length.  Stored entries answer from metadata;
    /// compressed entries run the size-only decoder pass.
    pub fn file_size(&self, entry: FileEntry) -> Result<u64> {
        if entry.is_stored() {
            Ok(entry.real_size as u64)
        } else {
            decompressed_len(entry, self.bytes())
        }
    }
}

/// Transcode an archive path from EUC-KR and normalise separators.
/// Undecodable sequences become U+FFFD — region detection feeds on those.
fn decode_path(raw: &[u8]) -> String {
    let (decoded, _, _) = EUC_KR.decode(raw);
    if decoded.contains('\\') {
        decoded.replace('\\', "/")
    } else {
        decoded.into_owned()
    }
}

fn read_slice(bytes: &[u8], pos: usize, len: usize) -> Result<&[u8]> {
    bytes.get(pos..pos + len).ok_or(Error::Truncated {
        offset: pos as u64,
        needed: len as u64,
    })
}

fn read_array<const N: usize>(bytes: &[u8], pos: usize) -> Result<[u8; N]> {
    Ok(read_slice(bytes, pos, N)?.try_into().unwrap())
}

//! On-disk layout of a pak file.
//!
//! ```text
//! [payload bytes ...] [file table: count × (entry + path)] [trailer]
//! ```
//!
//! # Trailer (9 bytes, at end of file, all fields little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0      4   file_list_offset   absolute offset of the file table
//!    4      4   file_count         number of file-table entries
//!    8      1   signature          = 0x12
//! ```
//!
//! # File entry (14 bytes + variable path, little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0      1   path_length        bytes of path that follow the entry
//!    1      1   type               two orthogonal nibbles, see below
//!    2      4   offset             absolute offset of the payload
//!    6      4   packed_size        on-disk payload bytes
//!   10      4   real_size          stored: plaintext bytes; LZ kinds:
//!                                  compressed stream length
//! ```
//!
//! # The type byte
//!
//! The low nibble is the compression/content kind: 0 = stored, 1 = LZ,
//! 2 = directory entry, 3 = LZ with stream obfuscation.  The high nibble is
//! the metadata obfuscation class: 0x10 = legacy XOR (path bytes and
//! `real_size` XOR'd with 0x71), 0x20 = XTEA (`offset`/`real_size` and the
//! path enciphered with the region key), 0x80 = plain.  A high nibble of 0
//! on disk means the legacy XOR class.
//!
//! Path bytes are EUC-KR encoded prior to deobfuscation; `/` is the
//! in-archive separator.

use byteorder::{ByteOrder, LittleEndian};

/// Byte length of the trailer record.
pub const TRAILER_LEN: usize = 9;

/// The trailer signature byte every pak carries.
pub const SIGNATURE: u8 = 0x12;

/// Byte length of the fixed portion of a file entry.
pub const ENTRY_LEN: usize = 14;

// Compression/content kinds (low nibble of the type byte).
pub const KIND_STORED: u8 = 0;
pub const KIND_LZ: u8 = 1;
pub const KIND_DIR: u8 = 2;
pub const KIND_LZ_OBFUSCATED: u8 = 3;

// Metadata obfuscation classes (high nibble of the type byte).
pub const CLASS_XOR: u8 = 0x10;
pub const CLASS_XTEA: u8 = 0x20;
pub const CLASS_PLAIN: u8 = 0x80;

/// The XOR mask the legacy obfuscation class applies to path bytes and
/// `real_size`.
pub const XOR_MASK: u8 = 0x71;

// ── Trailer ──────────────────────────────────────────────────────────────────

/// The nine-byte record at the end of every pak file.
#[derive(Debug, Clone, Copy)]
pub struct Trailer {
    pub file_list_offset: u32,
    pub file_count: u32,
    pub signature: u8,
}

impl Trailer {
    /// Unpack a trailer from its on-disk bytes.  The signature is not
    /// validated here; the reader rejects mismatches with a dedicated error.
    pub fn parse(buf: &[u8; TRAILER_LEN]) -> Trailer {
        Trailer {
            file_list_offset: LittleEndian::read_u32(&buf[0..4]),
            file_count: LittleEndian::read_u32(&buf[4..8]),
            signature: buf[8],
        }
    }
}

// ── File entry ───────────────────────────────────────────────────────────────

/// The fixed 14-byte portion of a file-table entry, as stored on disk
/// (after any XTEA metadata descrambling, before path decoding).
#[derive(Debug, Clone, Copy)]
pub struct RawEntry {
    pub path_length: u8,
    pub entry_type: u8,
    pub offset: u32,
    pub packed_size: u32,
    pub real_size: u32,
}

impl RawEntry {
    pub fn parse(buf: &[u8; ENTRY_LEN]) -> RawEntry {
        RawEntry {
            path_length: buf[0],
            entry_type: buf[1],
            offset: LittleEndian::read_u32(&buf[2..6]),
            packed_size: LittleEndian::read_u32(&buf[6..10]),
            real_size: LittleEndian::read_u32(&buf[10..14]),
        }
    }
}

/// A decoded file entry, ready for lookup and reading.
///
/// `compression` is the low nibble of the on-disk type byte; the
/// obfuscation class has already been resolved and stripped by the reader.
#[derive(Debug, Clone, Copy)]
pub struct FileEntry {
    pub offset: u32,
    pub packed_size: u32,
    pub real_size: u32,
    pub compression: u8,
}

impl FileEntry {
    /// Directory placeholder entries carry no payload and are skipped when
    /// building the filesystem.
    #[inline]
    pub fn is_directory(self) -> bool {
        self.compression == KIND_DIR
    }

    /// Stored entries are a verbatim byte range; everything else runs
    /// through the LZ decoder.
    #[inline]
    pub fn is_stored(self) -> bool {
        self.compression == KIND_STORED
    }
}

//! # pangpak — PangYa pak archives as a read-only filesystem
//!
//! Reads the proprietary archive files ("pak") the game ships, layering
//! any number of them into one unified namespace, and handles the
//! encrypted update-list XML the patcher consumes.
//!
//! Format facts the implementation is built around:
//! - All numeric fields are little-endian; paths are EUC-KR on disk
//! - A nine-byte trailer (signature 0x12) locates the file table
//! - File metadata and names are obfuscated per entry: legacy XOR, a
//!   16-round XTEA variant keyed by region, or plain (debug builds)
//! - Payloads are stored verbatim or LZ77-flag-stream compressed, with an
//!   optional obfuscation layer over the compressed stream itself
//! - Later paks supersede earlier ones **by basename** — the incremental
//!   patch chain depends on this
//! - The filesystem is immutable once loaded; there is no write path
//! - The region can be auto-detected by trial-decoding file tables with
//!   each of the six known keys
//!
//! The update-list side is independent of the pak engine: a tolerant
//! schema-driven XML codec plus the same block cipher in its null-padded
//! stream mode.

pub mod crc;
pub mod litexml;
pub mod pak;
pub mod updatelist;
pub mod xtea;

// Flat re-exports for the most common types.
pub use pak::{detect_region, FileEntry, PakFs, Reader};
pub use xtea::{Key, Region, ALL_KEYS};

//! The pak archive engine: on-disk format, payload decoder, single-archive
//! reader, the layered filesystem index, and region auto-detection.

pub mod decompress;
pub mod format;
pub mod reader;
pub mod region;
pub mod vfs;

pub use format::{FileEntry, Trailer};
pub use reader::{PakData, Reader};
pub use region::detect_region;
pub use vfs::{DirEntry, Node, NodeKind, PakFs, Stat};

use std::io;
use thiserror::Error;

/// Errors surfaced by the pak engine.
#[derive(Error, Debug)]
pub enum Error {
    /// The trailer's magic byte is wrong — this is not a pak file.
    #[error("invalid pak signature 0x{0:02X}")]
    InvalidSignature(u8),
    /// A read needed bytes past the end of the pak.
    #[error("pak truncated: {needed} byte(s) at offset {offset} overrun the file")]
    Truncated { offset: u64, needed: u64 },
    /// A back-reference pointed before the start of the decoded output.
    #[error("corrupt compressed stream: back-reference before start of output")]
    BadBackRef,
    /// An enciphered path had a length that cannot hold whole cipher blocks.
    #[error("enciphered path of {0} byte(s) is not block-aligned")]
    PathDecode(usize),
    /// An iteration callback requested an early stop.  Internal sentinel —
    /// converted back to success before leaving the reader.
    #[error("file table iteration stopped")]
    Stopped,
    /// Filesystem lookup miss.
    #[error("no such file or directory: {0:?}")]
    NotFound(String),
    /// A region could not be auto-detected: no candidate key decoded every
    /// file table cleanly.
    #[error("no candidate key matches the pak files")]
    RegionNone,
    /// Region auto-detection matched more than one (but not every)
    /// candidate key.
    #[error("pak files match {0} candidate keys; specify a region")]
    RegionAmbiguous(usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

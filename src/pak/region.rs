//! Region auto-detection by trial-decoding pak file tables.
//!
//! Only the XTEA obfuscation class depends on the region key, and a wrong
//! key turns enciphered paths into bytes that rarely survive EUC-KR
//! decoding: the transcoder substitutes U+FFFD for invalid sequences.  A
//! replacement character in the *interior* of a path is therefore the
//! wrong-key signal.  Trailing runs of replacements are tolerated — real
//! archives contain names truncated mid-sequence, which decode with a
//! ragged tail even under the right key.

use std::path::Path;
use std::sync::Arc;

use log::debug;

use super::reader::{PakData, Reader};
use super::{Error, Result};
use crate::xtea::Key;

/// Pick the single region key that decodes every given pak cleanly.
///
/// Every pak is opened once; each candidate key then dry-runs the full
/// file-table iteration against the shared bytes.  Outcomes:
///
/// - no key passes → [`Error::RegionNone`]
/// - exactly one key passes → that key
/// - every key passes (archives with no XTEA entries cannot discriminate)
///   → the first candidate
/// - several but not all pass → [`Error::RegionAmbiguous`]
pub fn detect_region<P: AsRef<Path>>(paths: &[P], candidates: &[Key]) -> Result<Key> {
    if candidates.is_empty() {
        return Err(Error::RegionNone);
    }

    let mut paks: Vec<Arc<PakData>> = Vec::with_capacity(paths.len());
    for path in paths {
        let data = Arc::new(PakData::open(path)?);
        // Validate the container shape up front; the trailer does not
        // depend on the key.
        Reader::new(candidates[0], Arc::clone(&data))?;
        paks.push(data);
    }

    let passing: Vec<Key> = candidates
        .iter()
        .copied()
        .filter(|&key| {
            let ok = paks.iter().all(|data| pak_decodes_cleanly(key, data));
            debug!("candidate key trial: {}", if ok { "pass" } else { "fail" });
            ok
        })
        .collect();

    match passing.len() {
        0 => Err(Error::RegionNone),
        1 => Ok(passing[0]),
        n if n == candidates.len() => Ok(candidates[0]),
        n => Err(Error::RegionAmbiguous(n)),
    }
}

fn pak_decodes_cleanly(key: Key, data: &Arc<PakData>) -> bool {
    let reader = match Reader::new(key, Arc::clone(data)) {
        Ok(r) => r,
        Err(_) => return false,
    };
    let mut clean = true;
    let result = reader.read_file_table(|path, _| {
        if has_interior_replacement(path) {
            clean = false;
            false
        } else {
            true
        }
    });
    result.is_ok() && clean
}

/// True if the decoded path carries a U+FFFD anywhere but a trailing run.
fn has_interior_replacement(path: &str) -> bool {
    path.trim_end_matches('\u{FFFD}').contains('\u{FFFD}')
}

//! The update-list document: the manifest the patcher downloads to decide
//! which game files changed.
//!
//! Canonical form (served EUC-KR-declared, padded to the cipher block size
//! and enciphered with the region key):
//!
//! ```text
//! <?xml version="1.0" encoding="euc-kr" standalone="yes" ?>
//! <patchVer value="KR.Q4.548.00" />
//! <patchNum value="1" />
//! <updatelistVer value="20090331" />
//! <updatefiles count="1">
//!         <fileinfo fname="test01.txt" fdir="" fsize="45" fcrc="-90216330"
//!                   fdate="2020-06-28" ftime="06:01:35"
//!                   pname="test01.txt.zip" psize="154" />
//! </updatefiles>
//! ```
//!
//! `fcrc` is the file-flavour CRC32 reinterpreted as a signed 32-bit
//! decimal; `psize` is the packed (zip) size the server supplies.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use log::{info, warn};

use crate::crc::FileHasher;
use crate::litexml::{self, Child, DocumentInfo, Element, Emitter};
use crate::xtea::{self, CipherError, Key};

/// Chunk size for streaming file checksums.
const CRC_BUF_LEN: usize = 1 << 12;

// ── Schema records ───────────────────────────────────────────────────────────

/// Per-file row of the update list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileInfo {
    pub filename: String,
    pub directory: String,
    pub size: i64,
    pub crc: i32,
    pub date: String,
    pub time: String,
    pub packed_name: String,
    pub packed_size: i64,
}

impl Element for FileInfo {
    fn open_child(&mut self, _tag: &str) -> Option<Child<'_>> {
        None
    }

    fn set_attr(&mut self, key: &str, value: &str) {
        use crate::litexml::Scalar;
        match key {
            "fname" => self.filename.parse_xml(value),
            "fdir" => self.directory.parse_xml(value),
            "fsize" => self.size.parse_xml(value),
            "fcrc" => self.crc.parse_xml(value),
            "fdate" => self.date.parse_xml(value),
            "ftime" => self.time.parse_xml(value),
            "pname" => self.packed_name.parse_xml(value),
            "psize" => self.packed_size.parse_xml(value),
            _ => {}
        }
    }

    fn emit(&self, w: &mut Emitter<'_>) -> io::Result<()> {
        w.attr("fname", &self.filename)?;
        w.attr("fdir", &self.directory)?;
        w.attr("fsize", &self.size)?;
        w.attr("fcrc", &self.crc)?;
        w.attr("fdate", &self.date)?;
        w.attr("ftime", &self.time)?;
        w.attr("pname", &self.packed_name)?;
        w.attr("psize", &self.packed_size)
    }
}

/// The `<updatefiles>` container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateFiles {
    pub count: i32,
    pub files: Vec<FileInfo>,
}

impl Element for UpdateFiles {
    fn open_child(&mut self, tag: &str) -> Option<Child<'_>> {
        match tag {
            "fileinfo" => {
                self.files.push(FileInfo::default());
                Some(Child::Node(self.files.last_mut().unwrap()))
            }
            _ => None,
        }
    }

    fn set_attr(&mut self, key: &str, value: &str) {
        use crate::litexml::Scalar;
        if key == "count" {
            self.count.parse_xml(value);
        }
    }

    fn emit(&self, w: &mut Emitter<'_>) -> io::Result<()> {
        w.attr("count", &self.count)?;
        for file in &self.files {
            w.nested("fileinfo", file)?;
        }
        Ok(())
    }
}

/// The complete update-list document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub info: DocumentInfo,
    pub patch_ver: String,
    pub patch_num: i32,
    pub updatelist_ver: String,
    pub update_files: UpdateFiles,
}

impl Element for Document {
    fn open_child(&mut self, tag: &str) -> Option<Child<'_>> {
        match tag {
            "patchVer" => Some(Child::Leaf {
                attr: "value",
                slot: &mut self.patch_ver,
            }),
            "patchNum" => Some(Child::Leaf {
                attr: "value",
                slot: &mut self.patch_num,
            }),
            "updatelistVer" => Some(Child::Leaf {
                attr: "value",
                slot: &mut self.updatelist_ver,
            }),
            "updatefiles" => Some(Child::Node(&mut self.update_files)),
            _ => None,
        }
    }

    fn set_attr(&mut self, _key: &str, _value: &str) {}

    fn set_doc_info(&mut self, info: DocumentInfo) {
        self.info = info;
    }

    fn emit(&self, w: &mut Emitter<'_>) -> io::Result<()> {
        w.doc_info(&self.info)?;
        w.unary_tag("patchVer", "value", &self.patch_ver)?;
        w.unary_tag("patchNum", "value", &self.patch_num)?;
        w.unary_tag("updatelistVer", "value", &self.updatelist_ver)?;
        w.nested("updatefiles", &self.update_files)
    }
}

// ── File-info computation ────────────────────────────────────────────────────

/// Build a [`FileInfo`] for one file on disk.
///
/// The checksum streams through the file in 4 KiB chunks; date and time
/// come from the local modification timestamp.  `packed_size` is an input
/// — the serving side knows the zip it will hand out, this side does not.
pub fn make_file_info(
    base_dir: &Path,
    dir: &str,
    name: &str,
    packed_size: i64,
) -> io::Result<FileInfo> {
    let path = base_dir.join(dir).join(name);
    let mut file = File::open(&path)?;
    let metadata = file.metadata()?;

    let mut hasher = FileHasher::new();
    let mut size = 0i64;
    let mut buf = [0u8; CRC_BUF_LEN];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as i64;
    }

    let modified: DateTime<Local> = metadata.modified()?.into();

    Ok(FileInfo {
        filename: name.to_owned(),
        directory: dir.to_owned(),
        size,
        crc: hasher.finalize() as i32,
        date: modified.format("%Y-%m-%d").to_string(),
        time: modified.format("%H:%M:%S").to_string(),
        packed_name: format!("{name}.zip"),
        packed_size,
    })
}

// ── Serving-side assembly ────────────────────────────────────────────────────

/// Document header values supplied by whoever operates the patch server.
#[derive(Debug, Clone)]
pub struct ListVersion {
    pub patch_ver: String,
    pub patch_num: i32,
    pub updatelist_ver: String,
}

struct CacheEntry {
    modified: SystemTime,
    size: u64,
    info: FileInfo,
}

/// Builds update-list documents for a game folder, caching per-file rows.
///
/// Checksumming a folder of client assets is the expensive part of serving
/// an update list, so rows are cached by filename and recomputed only when
/// a file's modification time or size changes.  Stale rows are recomputed
/// concurrently, one worker per file.
pub struct ListCache {
    dir: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl ListCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> ListCache {
        ListCache {
            dir: dir.into(),
            entries: HashMap::new(),
        }
    }

    /// Build a document describing the folder's current contents.
    ///
    /// Files are listed in name order.  A file that cannot be read
    /// contributes a row carrying only its name, mirroring how the serving
    /// side degrades rather than dropping the whole list.
    pub fn build(&mut self, version: &ListVersion) -> io::Result<Document> {
        let mut listing: Vec<(String, SystemTime, u64)> = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let meta = entry.metadata()?;
            listing.push((
                entry.file_name().to_string_lossy().into_owned(),
                meta.modified()?,
                meta.len(),
            ));
        }
        listing.sort_by(|a, b| a.0.cmp(&b.0));

        let mut rows: Vec<Option<FileInfo>> = vec![None; listing.len()];
        let mut stale: Vec<usize> = Vec::new();
        let mut hits = 0usize;

        for (i, (name, modified, size)) in listing.iter().enumerate() {
            match self.entries.get(name) {
                Some(cached) if cached.modified == *modified && cached.size == *size => {
                    rows[i] = Some(cached.info.clone());
                    hits += 1;
                }
                _ => stale.push(i),
            }
        }

        // Recompute stale rows concurrently; the packed size defaults to
        // the plain size, as the serving side does when no zip exists.
        let dir = self.dir.as_path();
        let computed: Vec<(usize, io::Result<FileInfo>)> = thread::scope(|scope| {
            let handles: Vec<_> = stale
                .iter()
                .map(|&i| {
                    let (name, _, size) = &listing[i];
                    scope.spawn(move || (i, make_file_info(dir, "", name, *size as i64)))
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|handle| handle.join().ok())
                .collect()
        });

        for (i, result) in computed {
            let (name, modified, size) = &listing[i];
            match result {
                Ok(info) => {
                    self.entries.insert(
                        name.clone(),
                        CacheEntry {
                            modified: *modified,
                            size: *size,
                            info: info.clone(),
                        },
                    );
                    rows[i] = Some(info);
                }
                Err(err) => {
                    warn!("update-list row for {name}: {err}");
                    rows[i] = Some(FileInfo {
                        filename: name.clone(),
                        ..FileInfo::default()
                    });
                }
            }
        }

        info!(
            "update list assembled: {} file(s), {} cached, {} recomputed",
            listing.len(),
            hits,
            listing.len() - hits,
        );

        let mut doc = Document {
            info: DocumentInfo {
                version: "1.0".to_owned(),
                encoding: "euc-kr".to_owned(),
                standalone: "yes".to_owned(),
            },
            patch_ver: version.patch_ver.clone(),
            patch_num: version.patch_num,
            updatelist_ver: version.updatelist_ver.clone(),
            ..Document::default()
        };
        doc.update_files.files = rows.into_iter().flatten().collect();
        doc.update_files.count = doc.update_files.files.len() as i32;
        Ok(doc)
    }

    /// Build, serialise, and encipher the document the way it goes over the
    /// wire: null-padded to the cipher block size, then enciphered with the
    /// region key.
    pub fn build_enciphered(
        &mut self,
        key: Key,
        version: &ListVersion,
    ) -> Result<Vec<u8>, CipherError> {
        let doc = self.build(version)?;
        let xml = litexml::to_vec(&doc)?;
        let mut out = Vec::with_capacity(xml.len() + 8);
        xtea::encipher_stream_pad_null(key, xml.as_slice(), &mut out)?;
        Ok(out)
    }
}

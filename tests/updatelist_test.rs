use pangpak::litexml::{self, DocumentInfo};
use pangpak::updatelist::{make_file_info, Document, FileInfo, ListCache, ListVersion};
use pangpak::xtea::{self, KEY_US};

fn sample_document() -> Document {
    let mut doc = Document {
        info: DocumentInfo {
            version: "1.0".to_owned(),
            encoding: "euc-kr".to_owned(),
            standalone: "yes".to_owned(),
        },
        patch_ver: "KR.Q4.548.00".to_owned(),
        patch_num: 1,
        updatelist_ver: "20090331".to_owned(),
        ..Document::default()
    };
    let rows = [
        ("test01.txt", -90216330, "06:01:35", 154),
        ("test02.txt", -109573984, "06:01:43", 155),
        ("test03.txt", -61144858, "06:14:13", 158),
    ];
    for (name, crc, time, packed_size) in rows {
        doc.update_files.files.push(FileInfo {
            filename: name.to_owned(),
            directory: String::new(),
            size: 45,
            crc,
            date: "2020-06-28".to_owned(),
            time: time.to_owned(),
            packed_name: format!("{name}.zip"),
            packed_size,
        });
        doc.update_files.count += 1;
    }
    doc
}

const EXPECTED_XML: &str = "<?xml version=\"1.0\" encoding=\"euc-kr\" standalone=\"yes\" ?>\n\
<patchVer value=\"KR.Q4.548.00\" />\n\
<patchNum value=\"1\" />\n\
<updatelistVer value=\"20090331\" />\n\
<updatefiles count=\"3\">\n\
        <fileinfo fname=\"test01.txt\" fdir=\"\" fsize=\"45\" fcrc=\"-90216330\" fdate=\"2020-06-28\" ftime=\"06:01:35\" pname=\"test01.txt.zip\" psize=\"154\" />\n\
        <fileinfo fname=\"test02.txt\" fdir=\"\" fsize=\"45\" fcrc=\"-109573984\" fdate=\"2020-06-28\" ftime=\"06:01:43\" pname=\"test02.txt.zip\" psize=\"155\" />\n\
        <fileinfo fname=\"test03.txt\" fdir=\"\" fsize=\"45\" fcrc=\"-61144858\" fdate=\"2020-06-28\" ftime=\"06:14:13\" pname=\"test03.txt.zip\" psize=\"158\" />\n\
</updatefiles>\n";

#[test]
fn encode_matches_canonical_form() {
    assert_eq!(litexml::to_string(&sample_document()).unwrap(), EXPECTED_XML);
}

#[test]
fn decode_restores_the_document() {
    let decoded: Document = litexml::from_str(EXPECTED_XML).unwrap();
    assert_eq!(decoded, sample_document());
}

#[test]
fn encode_decode_round_trip() {
    let doc = sample_document();
    let encoded = litexml::to_string(&doc).unwrap();
    let decoded: Document = litexml::from_str(&encoded).unwrap();
    assert_eq!(decoded, doc);
}

/// The serving path: serialise, pad-and-encipher, then decipher-and-trim
/// back to the exact XML bytes.
#[test]
fn enciphered_round_trip_restores_exact_bytes() {
    let xml = litexml::to_vec(&sample_document()).unwrap();

    let mut enciphered = Vec::new();
    xtea::encipher_stream_pad_null(KEY_US, xml.as_slice(), &mut enciphered).unwrap();
    assert_eq!(enciphered.len() % 8, 0);
    assert_ne!(enciphered, xml);

    let mut restored = Vec::new();
    xtea::decipher_stream_trim_null(KEY_US, enciphered.as_slice(), &mut restored).unwrap();
    assert_eq!(restored, xml);
}

#[test]
fn list_cache_builds_sorted_rows_and_tracks_changes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.txt"), b"bravo").unwrap();
    std::fs::write(dir.path().join("a.txt"), b"alpha").unwrap();

    let version = ListVersion {
        patch_ver: "KR.Q4.548.00".to_owned(),
        patch_num: 1,
        updatelist_ver: "20090331".to_owned(),
    };
    let mut cache = ListCache::new(dir.path());

    let doc = cache.build(&version).unwrap();
    assert_eq!(doc.update_files.count, 2);
    let names: Vec<&str> = doc
        .update_files
        .files
        .iter()
        .map(|f| f.filename.as_str())
        .collect();
    assert_eq!(names, ["a.txt", "b.txt"]);
    assert_eq!(doc.update_files.files[0].size, 5);
    let crc_before = doc.update_files.files[0].crc;

    // A rebuild over unchanged files reproduces the same rows.
    let again = cache.build(&version).unwrap();
    assert_eq!(again, doc);

    // Rewriting a file with different contents must change its checksum.
    std::fs::write(dir.path().join("a.txt"), b"ALPHA!").unwrap();
    let changed = cache.build(&version).unwrap();
    assert_eq!(changed.update_files.files[0].size, 6);
    assert_ne!(changed.update_files.files[0].crc, crc_before);
}

#[test]
fn list_cache_enciphered_output_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("patch.bin"), b"payload").unwrap();

    let version = ListVersion {
        patch_ver: "FakeVer".to_owned(),
        patch_num: 9999,
        updatelist_ver: "20090331".to_owned(),
    };
    let mut cache = ListCache::new(dir.path());
    let wire = cache.build_enciphered(KEY_US, &version).unwrap();
    assert_eq!(wire.len() % 8, 0);

    let mut xml = Vec::new();
    xtea::decipher_stream_trim_null(KEY_US, wire.as_slice(), &mut xml).unwrap();
    let text = String::from_utf8(xml).unwrap();
    let decoded: Document = litexml::from_str(&text).unwrap();
    assert_eq!(decoded, cache.build(&version).unwrap());
    assert_eq!(decoded.update_files.files[0].filename, "patch.bin");
}

#[test]
fn file_info_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("0001"), b"0001").unwrap();

    let info = make_file_info(dir.path(), "", "0001", 99).unwrap();
    assert_eq!(info.filename, "0001");
    assert_eq!(info.directory, "");
    assert_eq!(info.size, 4);
    // 0xFC62A689 reinterpreted as signed.
    assert_eq!(info.crc, -60643703);
    assert_eq!(info.packed_name, "0001.zip");
    assert_eq!(info.packed_size, 99);
    // Local mtime, formatted as date and wall-clock time.
    assert_eq!(info.date.len(), 10);
    assert_eq!(info.date.as_bytes()[4], b'-');
    assert_eq!(info.time.len(), 8);
    assert_eq!(info.time.as_bytes()[2], b':');
}

//! Shared fixtures for integration tests: fake host ports and zip helpers.

pub mod harness;

#[allow(dead_code)]
pub mod fakes;

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::PathBuf;

/// Returns the path to the fixtures directory.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Every entry of a zip, keyed by path.
///
/// # Panics
///
/// Panics if the bytes are not a valid zip.
#[allow(dead_code)]
pub fn read_zip(bytes: &[u8]) -> BTreeMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("Not a zip archive");
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).expect("Failed to read zip entry");
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .expect("Failed to read zip entry contents");
        entries.insert(file.name().to_string(), contents);
    }
    entries
}

/// Text of one zip entry.
///
/// # Panics
///
/// Panics if the entry is missing or not UTF-8.
#[allow(dead_code)]
pub fn entry_text(entries: &BTreeMap<String, Vec<u8>>, path: &str) -> String {
    let bytes = entries
        .get(path)
        .unwrap_or_else(|| panic!("Missing entry {path}; have {:?}", entries.keys()));
    String::from_utf8(bytes.clone()).expect("Entry was not valid UTF-8")
}

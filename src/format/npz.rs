//! Loading of multi-array archive containers: a standard ZIP file whose
//! entries are each a single binary array payload.
//!
//! Entries are decompressed and parsed one at a time, in enumeration order,
//! and collected under their suffix-stripped names. The load is fail-fast: a
//! single malformed entry fails the whole call, so a partially-populated
//! result map is never observable.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::config::LoadOptions;
use crate::error::NdPackError;
use crate::format::{npy, ArrayRecord, ARCHIVE_ENTRY_SUFFIX};

//==================================================================================
// 1. Archive Loading
//==================================================================================

/// Decompresses and parses every array entry of an in-memory archive.
///
/// The result is keyed by entry name with the array-file suffix stripped,
/// in sorted key order. Directory entries are skipped.
pub fn load_npz_bytes(
    bytes: &[u8],
    options: &LoadOptions,
) -> Result<BTreeMap<String, ArrayRecord>, NdPackError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| NdPackError::InvalidArchive(e.to_string()))?;

    let mut records = BTreeMap::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| NdPackError::InvalidArchive(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let mut payload = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut payload)
            .map_err(|e| NdPackError::InvalidArchive(format!("entry '{}': {}", name, e)))?;

        let key = name
            .strip_suffix(ARCHIVE_ENTRY_SUFFIX)
            .unwrap_or(&name)
            .to_string();
        let record = npy::parse(&payload, options)?;
        records.insert(key, record);
    }

    log::info!("loaded {} array entries from archive", records.len());
    Ok(records)
}

//==================================================================================
// 2. File Wrappers
//==================================================================================

/// Reads an archive from disk and delegates to `load_npz_bytes`.
pub fn load_npz_file(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<BTreeMap<String, ArrayRecord>, NdPackError> {
    let bytes = std::fs::read(path)?;
    load_npz_bytes(&bytes, options)
}

/// Reads a single array payload from disk and parses it.
pub fn load_npy_file(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<ArrayRecord, NdPackError> {
    let bytes = std::fs::read(path)?;
    npy::parse(&bytes, options)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

//! Archive extractor for the zipped dataset snapshot.

use std::io::{Cursor, Read};

use crate::errors::AppError;

/// Upper bound on deflate expansion; a claimed entry size beyond
/// `archive length * ratio` cannot be genuine.
const MAX_EXPANSION_RATIO: u64 = 1032;

/// Decode the first entry of a zip container as UTF-8 text.
///
/// The producer ships exactly one entry; only entry 0 is read. The archive
/// handle is dropped on every exit path.
pub fn extract_first_entry_text(archive_bytes: &[u8]) -> Result<String, AppError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes))?;

    if archive.is_empty() {
        return Err(AppError::Extraction("Archive contains no entries".to_string()));
    }

    let mut entry = archive.by_index(0)?;
    let limit = (archive_bytes.len() as u64).saturating_mul(MAX_EXPANSION_RATIO);
    if entry.size() > limit {
        return Err(AppError::Extraction(format!(
            "Entry '{}' claims {} bytes from a {} byte archive",
            entry.name(),
            entry.size(),
            archive_bytes.len()
        )));
    }

    let mut text = String::with_capacity(entry.size() as usize);
    entry.read_to_string(&mut text).map_err(|e| {
        AppError::Extraction(format!("Entry '{}' is not readable text: {}", entry.name(), e))
    })?;

    tracing::debug!("Extracted {} bytes from '{}'", text.len(), entry.name());
    Ok(text)
}

/// Build an in-memory zip with the given entries.
#[cfg(test)]
pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

// src/archive.rs

//! Component archives (component.zip)
//!
//! Archives are built deterministically: entries are written in manifest
//! order with the zip epoch as timestamp and 0644 permissions, and no
//! directory entries are emitted. The same manifest and sources therefore
//! always produce byte-identical archives and the same archive digest.
//!
//! The reading side lists entries into memory, checks them against the
//! manifest, and writes the component's files into a directory.

use crate::component::{archive_prefix, dest_file_name, ComponentSource, LogicalFile};
use crate::error::{Error, Result};
use crate::hash::{verify_bytes, Integrity};
use crate::manifest::Manifest;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Permissions of every archive entry
const ENTRY_MODE: u32 = 0o644;

/// Largest archive accepted from a registry (64 MB)
pub const MAX_ARCHIVE_SIZE: u64 = 64 * 1024 * 1024;

/// Largest total of uncompressed entry content read from one archive (256 MB)
pub const MAX_EXTRACTED_SIZE: u64 = 256 * 1024 * 1024;

/// A built archive and its digest
#[derive(Debug, Clone)]
pub struct ComponentArchive {
    pub bytes: Vec<u8>,
    pub integrity: Integrity,
}

/// Build the archive for a manifest from the component's files
///
/// Every manifest file is written at its `path`. A file listed by the
/// manifest but absent from `source` aborts the build.
pub fn build_archive(manifest: &Manifest, source: &ComponentSource) -> Result<ComponentArchive> {
    let prefix = archive_prefix(&manifest.name);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(ENTRY_MODE);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for file in &manifest.files {
        let missing = || Error::MissingSourceFile {
            component: manifest.name.clone(),
            file: file.source_path.clone(),
        };
        let content = file
            .source_path
            .strip_prefix(&prefix)
            .and_then(LogicalFile::from_file_name)
            .and_then(|logical| source.get(logical))
            .ok_or_else(missing)?;

        writer.start_file(file.source_path.as_str(), options)?;
        writer.write_all(content)?;
    }

    let bytes = writer.finish()?.into_inner();
    let integrity = Integrity::sha256(&bytes);
    debug!(
        "Built archive for {}@{}: {} bytes, {}",
        manifest.name,
        manifest.version,
        bytes.len(),
        integrity
    );

    Ok(ComponentArchive { bytes, integrity })
}

/// A file read out of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub content: Vec<u8>,
}

/// Read every file entry of an archive into memory
///
/// Directory entries are skipped. Entries whose names are absolute or
/// escape the archive root are rejected, as are archives that inflate past
/// [`MAX_EXTRACTED_SIZE`].
pub fn read_entries(bytes: &[u8]) -> Result<Vec<ArchiveEntry>> {
    read_entries_limited(bytes, MAX_EXTRACTED_SIZE)
}

fn read_entries_limited(bytes: &[u8], limit: u64) -> Result<Vec<ArchiveEntry>> {
    let mut remaining = limit;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let path = file.name().to_string();
        if file.enclosed_name().is_none() {
            return Err(Error::ExtractionFailed(format!(
                "Archive entry '{}' escapes the archive root",
                path
            )));
        }

        // The declared size is untrusted; read at most one byte past the budget
        let mut content = Vec::new();
        (&mut file)
            .take(remaining + 1)
            .read_to_end(&mut content)
            .map_err(|e| Error::ExtractionFailed(format!("Failed to read {}: {}", path, e)))?;
        if content.len() as u64 > remaining {
            return Err(Error::ExtractionFailed(format!(
                "Archive content exceeds {} bytes at '{}'",
                limit, path
            )));
        }
        remaining -= content.len() as u64;
        entries.push(ArchiveEntry { path, content });
    }

    Ok(entries)
}

/// Check that every manifest file is in the archive with matching integrity
pub fn verify_entries(manifest: &Manifest, entries: &[ArchiveEntry]) -> Result<()> {
    for file in &manifest.files {
        let entry = entries
            .iter()
            .find(|e| e.path == file.source_path)
            .ok_or_else(|| {
                Error::ExtractionFailed(format!(
                    "{}@{}: archive is missing {}",
                    manifest.name, manifest.version, file.source_path
                ))
            })?;

        verify_bytes(&entry.content, &file.integrity).map_err(|e| Error::IntegrityMismatch {
            subject: format!("{}@{} file {}", manifest.name, manifest.version, file.source_path),
            expected: e.expected,
            actual: e.actual,
        })?;
    }
    Ok(())
}

/// Relative path of an entry below the component prefix, if it is one
fn component_relative<'a>(prefix: &str, path: &'a str) -> Result<Option<&'a str>> {
    let Some(relative) = path.strip_prefix(prefix) else {
        return Ok(None);
    };
    if relative.is_empty()
        || relative.starts_with('/')
        || relative.contains('\\')
        || relative.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(Error::ExtractionFailed(format!(
            "Archive entry '{}' is not a clean relative path",
            path
        )));
    }
    Ok(Some(relative))
}

/// Write the component's entries into `target_dir`
///
/// Entries under `template-parts/components/<name>/` are written with the
/// prefix stripped and the rename table applied; other entries are ignored.
/// Returns the written paths.
pub fn extract_component(
    name: &str,
    entries: &[ArchiveEntry],
    target_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let prefix = archive_prefix(name);
    let mut written = Vec::new();

    for entry in entries {
        let Some(relative) = component_relative(&prefix, &entry.path)? else {
            debug!("Skipping archive entry outside {}: {}", prefix, entry.path);
            continue;
        };

        let dest = target_dir.join(dest_file_name(name, relative));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::ExtractionFailed(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(&dest, &entry.content).map_err(|e| {
            Error::ExtractionFailed(format!("Failed to write {}: {}", dest.display(), e))
        })?;
        written.push(dest);
    }

    if written.is_empty() {
        return Err(Error::ExtractionFailed(format!(
            "Archive contains no files under {}",
            prefix
        )));
    }

    Ok(written)
}

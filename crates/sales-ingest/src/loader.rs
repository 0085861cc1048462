//! Multi-source loading.
//!
//! A data directory may mix flat CSV files and zip archives of CSV files.
//! Every file (and every CSV entry inside an archive) is an independent
//! source: a malformed or empty source is reported and skipped without
//! failing the session. Surviving sources are concatenated in path order,
//! duplicates included.

use std::fs;
use std::io::Read;
use std::path::Path;

use sales_domain::RecordSet;

use crate::csv_source::{SourceBatch, read_csv_source};
use crate::error::{IngestError, Result};

/// Per-source row count for the load summary.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: String,
    pub rows: usize,
}

/// Result of loading a data directory.
#[derive(Debug)]
pub struct LoadOutcome {
    /// All surviving sources concatenated in path order
    pub record_set: RecordSet,
    /// Sources that loaded, with their row counts
    pub sources: Vec<SourceReport>,
    /// Sources that were reported and skipped
    pub skipped: Vec<(String, IngestError)>,
}

/// Load every CSV and zip source under `dir` into one record set.
///
/// Returns `NoUsableData` when the directory holds no recognizable files
/// or every source failed. Partial failure is not fatal: the outcome lists
/// skipped sources next to the loaded ones.
pub fn load_dir(dir: &Path) -> Result<LoadOutcome> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                extension_of(path).as_deref(),
                Some("csv") | Some("zip")
            )
        })
        .collect();
    paths.sort();

    let mut batches = Vec::new();
    let mut skipped = Vec::new();

    for path in &paths {
        if extension_of(path).as_deref() == Some("zip") {
            load_archive(path, &mut batches, &mut skipped);
        } else {
            let source = display_name(path);
            match load_csv_file(path, &source) {
                Ok(batch) => batches.push(batch),
                Err(err) => {
                    tracing::warn!(source = %source, error = %err, "skipping source");
                    skipped.push((source, err));
                }
            }
        }
    }

    if batches.is_empty() {
        return Err(IngestError::NoUsableData);
    }

    let sources: Vec<SourceReport> = batches
        .iter()
        .map(|batch| SourceReport {
            source: batch.source.clone(),
            rows: batch.records.len(),
        })
        .collect();

    let record_set = RecordSet::concat(
        batches
            .into_iter()
            .map(|batch| RecordSet::new(batch.records, batch.has_transactions))
            .collect(),
    );

    tracing::info!(
        sources = sources.len(),
        skipped = skipped.len(),
        rows = record_set.len(),
        "data directory loaded"
    );

    Ok(LoadOutcome {
        record_set,
        sources,
        skipped,
    })
}

/// Load a single flat CSV file.
pub fn load_csv_file(path: &Path, source: &str) -> Result<SourceBatch> {
    let text = fs::read_to_string(path)?;
    read_csv_source(&text, source)
}

/// Load every CSV entry of a zip archive as an independent source.
fn load_archive(
    path: &Path,
    batches: &mut Vec<SourceBatch>,
    skipped: &mut Vec<(String, IngestError)>,
) {
    let archive_name = display_name(path);
    let mut archive = match fs::File::open(path).map_err(IngestError::from).and_then(|file| {
        zip::ZipArchive::new(file).map_err(IngestError::from)
    }) {
        Ok(archive) => archive,
        Err(err) => {
            tracing::warn!(source = %archive_name, error = %err, "skipping archive");
            skipped.push((archive_name, err));
            return;
        }
    };

    for index in 0..archive.len() {
        let entry_result = read_archive_entry(&mut archive, index, &archive_name);
        match entry_result {
            Ok(Some(batch)) => batches.push(batch),
            Ok(None) => {} // not a CSV entry
            Err((source, err)) => {
                tracing::warn!(source = %source, error = %err, "skipping archive entry");
                skipped.push((source, err));
            }
        }
    }
}

fn read_archive_entry(
    archive: &mut zip::ZipArchive<fs::File>,
    index: usize,
    archive_name: &str,
) -> std::result::Result<Option<SourceBatch>, (String, IngestError)> {
    let mut entry = archive
        .by_index(index)
        .map_err(|err| (archive_name.to_string(), IngestError::from(err)))?;

    if !entry.name().to_ascii_lowercase().ends_with(".csv") {
        return Ok(None);
    }
    let source = format!("{archive_name}/{}", entry.name());

    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|err| (source.clone(), IngestError::from(err)))?;

    read_csv_source(&text, &source)
        .map(Some)
        .map_err(|err| (source, err))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| path.display().to_string(), str::to_string)
}

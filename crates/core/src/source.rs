//! Reads the `key,english` CSV that drives a generation run.
//!
//! The first row is always treated as a header and dropped without being
//! looked at. Every later row must carry at least a key and a text column;
//! rows that fail to parse or are too short are logged and skipped. An I/O
//! error while reading fails the whole read.

use crate::record::SourceEntry;
use csv::{ReaderBuilder, StringRecord};
use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

const LOG_TARGET: &str = "source";

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read csv input")]
    Stream(#[source] csv::Error),
}

pub fn read_entries(path: impl AsRef<Path>) -> Result<Vec<SourceEntry>, SourceError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_entries(file).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        target: LOG_TARGET,
        path = %path.display(),
        rows = entries.len(),
        "csv loaded"
    );
    Ok(entries)
}

pub fn read_entries_from<R: Read>(reader: R) -> Result<Vec<SourceEntry>, SourceError> {
    parse_entries(reader).map_err(SourceError::Stream)
}

// I/O errors end the read; anything else only costs the row it occurred on.
fn parse_entries<R: Read>(reader: R) -> Result<Vec<SourceEntry>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                if index > 0 {
                    tracing::warn!(target: LOG_TARGET, row, error = %e, "malformed row, skipping");
                }
                continue;
            }
        };
        if index == 0 {
            continue;
        }
        match entry_from_record(&record) {
            Some(entry) => entries.push(entry),
            None => {
                tracing::warn!(
                    target: LOG_TARGET,
                    row,
                    columns = record.len(),
                    "row needs a key and a text column, skipping"
                );
            }
        }
    }
    Ok(entries)
}

fn entry_from_record(record: &StringRecord) -> Option<SourceEntry> {
    match (record.get(0), record.get(1)) {
        (Some(key), Some(text)) => Some(SourceEntry::new(key, text)),
        _ => None,
    }
}

// 🗂️ Session - owns the catalog for the lifetime of the shell
// Replaced wholesale on every successful load, mutated only by delete

use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::catalog::{Catalog, DeleteOutcome, Listing};
use crate::parser::{detect_source, read_catalog, IngestError, IngestOptions, RowWarning, SourceType};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("No file has been loaded yet")]
    NoSource,
}

/// SourceFile - provenance of the catalog currently held
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source_type: SourceType,
    /// SHA-256 of the file bytes at load time
    pub fingerprint: String,
    pub loaded_at: DateTime<Local>,
    pub entries: usize,
    pub warnings: usize,
}

impl SourceFile {
    /// First 8 hex digits, enough for display
    pub fn short_fingerprint(&self) -> &str {
        &self.fingerprint[..self.fingerprint.len().min(8)]
    }
}

/// LoadSummary - what a load did, for the shell to report
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub entries: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub warnings: Vec<RowWarning>,
    /// Same path and same bytes as the previous load
    pub unchanged: bool,
}

/// Compute the SHA-256 hex digest of a file
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

#[derive(Debug, Default)]
pub struct Session {
    catalog: Catalog,
    source: Option<SourceFile>,
    options: IngestOptions,
}

impl Session {
    pub fn new(options: IngestOptions) -> Self {
        Session {
            catalog: Catalog::new(),
            source: None,
            options,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    /// Ingest `path` and replace the catalog with the result.
    ///
    /// On error the previous catalog and source are kept.
    pub fn load(&mut self, path: &Path) -> Result<LoadSummary, SessionError> {
        info!("Selected file: {}", path.display());

        let source_type = detect_source(path)?;
        // Hash before parsing so the digest never describes newer bytes
        // than the catalog was built from
        let fingerprint = fingerprint_file(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let report = read_catalog(path, &self.options)?;

        let unchanged = self
            .source
            .as_ref()
            .map(|s| s.path == path && s.fingerprint == fingerprint)
            .unwrap_or(false);

        self.catalog = report.catalog;
        info!("Barcode map size: {}", self.catalog.len());

        self.source = Some(SourceFile {
            path: path.to_path_buf(),
            source_type,
            fingerprint,
            loaded_at: Local::now(),
            entries: self.catalog.len(),
            warnings: report.warnings.len(),
        });

        Ok(LoadSummary {
            entries: self.catalog.len(),
            rows_read: report.rows_read,
            rows_skipped: report.rows_skipped,
            warnings: report.warnings,
            unchanged,
        })
    }

    /// Load the current source file again
    pub fn reload(&mut self) -> Result<LoadSummary, SessionError> {
        let path = self
            .source
            .as_ref()
            .map(|s| s.path.clone())
            .ok_or(SessionError::NoSource)?;
        self.load(&path)
    }

    pub fn list(&self) -> Listing {
        self.catalog.listing()
    }

    pub fn delete(&mut self, key: &str) -> DeleteOutcome {
        let outcome = self.catalog.remove(key);
        info!(key, found = outcome.found(), "delete");
        outcome
    }
}

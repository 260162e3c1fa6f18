//! CAD library export.
//!
//! Converts normalized footprints into a vendor library file. Eagle's XML
//! library format is the one supported backend; requesting any other format
//! fails with [`ExportError::UnsupportedFormat`] (the original editor listed
//! a KiCad export too, but it was never enabled).
//!
//! Export is atomic: the document is serialized to a temporary file in the
//! target directory and renamed over the target, so a failed export never
//! leaves a truncated library behind.

mod eagle;

use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::footprint::NormalizedFootprint;
use crate::script::FootprintMetadata;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors that can occur during library export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The requested target format is not supported.
    #[error("unsupported export format: {format}")]
    UnsupportedFormat {
        /// The format that was requested.
        format: String,
    },

    /// Failed to write the export file.
    #[error("failed to write export file: {path}")]
    Io {
        /// Path to the target file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Supported target library formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Eagle CAD XML library (`.lbr`).
    #[default]
    Eagle,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eagle" => Ok(Self::Eagle),
            other => Err(ExportError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eagle => f.write_str("eagle"),
        }
    }
}

/// One footprint to export: its identity plus its normalized shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportEntry {
    /// Identity of the footprint (id becomes the package name).
    pub metadata: FootprintMetadata,
    /// Normalized shape sequence.
    pub footprint: NormalizedFootprint,
}

/// Serializes the given footprints into a library document.
///
/// Output is deterministic: the same entry sequence produces byte-identical
/// text, with no timestamps and entries emitted in input order.
#[must_use]
pub fn serialize(format: ExportFormat, entries: &[ExportEntry]) -> String {
    match format {
        ExportFormat::Eagle => eagle::serialize(entries),
    }
}

/// Exports the given footprints to a library file.
///
/// # Errors
///
/// Returns [`ExportError::Io`] on filesystem failure. The target file is
/// replaced atomically; on error a previously existing file is untouched.
pub fn export(
    path: impl AsRef<Path>,
    format: ExportFormat,
    entries: &[ExportEntry],
) -> ExportResult<()> {
    let path = path.as_ref();
    let document = serialize(format, entries);

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ExportError::io(path, e))?;
    tmp.write_all(document.as_bytes())
        .map_err(|e| ExportError::io(path, e))?;
    tmp.flush().map_err(|e| ExportError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| ExportError::io(path, e.error))?;

    tracing::info!(
        path = %path.display(),
        format = %format,
        count = entries.len(),
        "Wrote library export"
    );

    Ok(())
}

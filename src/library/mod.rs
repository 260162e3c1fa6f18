//! Footprint library directory handling.
//!
//! A library is a named directory holding one script file per footprint,
//! with the file stem equal to the footprint's id (`<dir>/<id>.fps`). This
//! module provides the non-GUI half of library management: scanning member
//! ids, reading/writing sources, and the `new`/`clone` operations built on
//! the metadata extractor and rewrite engine.
//!
//! Concurrent writers to the same library are a caller concern; this module
//! does not lock files.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::script::{
    extract_metadata, is_valid_id, is_valid_name, rewrite_identity, template, FootprintMetadata,
    MetadataError, SCRIPT_EXTENSION,
};

/// Result type for library operations.
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Errors that can occur during library operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Filesystem access failed.
    #[error("library I/O error: {path}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A member script's identity could not be read.
    #[error("footprint `{id}`: {source}")]
    Metadata {
        /// Member id whose metadata failed.
        id: String,
        /// The extraction failure.
        #[source]
        source: MetadataError,
    },

    /// The target id already exists in the library.
    #[error("footprint `{id}` already exists")]
    Exists {
        /// The conflicting id.
        id: String,
    },

    /// The requested id is not a member of the library.
    #[error("footprint `{id}` not found")]
    NotFound {
        /// The missing id.
        id: String,
    },

    /// The id is not usable as a file stem.
    #[error("invalid footprint id `{id}`")]
    InvalidId {
        /// The rejected id.
        id: String,
    },

    /// The display name cannot be carried by a `@name` directive line.
    #[error("invalid footprint name `{name}`")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
}

impl LibraryError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A footprint library: a display name plus a directory of scripts.
#[derive(Debug, Clone)]
pub struct Library {
    /// Display name of the library.
    pub name: String,
    /// Directory holding the member scripts.
    pub directory: PathBuf,
}

impl Library {
    /// Creates a library handle. The directory is not required to exist yet.
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
        }
    }

    /// Path of the script file for `id`.
    #[must_use]
    pub fn script_path(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{id}.{SCRIPT_EXTENSION}"))
    }

    /// Lists member ids, sorted for deterministic output.
    ///
    /// Non-script files in the directory are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] when the directory cannot be read.
    pub fn scan(&self) -> LibraryResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.directory)
            .map_err(|e| LibraryError::io(&self.directory, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| LibraryError::io(&self.directory, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if is_valid_id(stem) => ids.push(stem.to_string()),
                _ => {
                    tracing::warn!(path = %path.display(), "Skipping script with unusable file stem");
                }
            }
        }
        ids.sort();

        tracing::debug!(library = %self.name, members = ids.len(), "Scanned library");

        Ok(ids)
    }

    /// Reads the source text of a member script.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::NotFound`] when `id` has no script file, and
    /// [`LibraryError::Io`] on other read failures.
    pub fn read_source(&self, id: &str) -> LibraryResult<String> {
        let path = self.script_path(id);
        std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                LibraryError::NotFound { id: id.to_string() }
            } else {
                LibraryError::io(path, e)
            }
        })
    }

    /// Writes the source text of a member script.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Io`] on write failure.
    pub fn write_source(&self, id: &str, source: &str) -> LibraryResult<()> {
        let path = self.script_path(id);
        std::fs::write(&path, source).map_err(|e| LibraryError::io(path, e))
    }

    /// Reads the identity metadata of a member script.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::Metadata`] when the script has no readable
    /// identity declaration.
    pub fn metadata(&self, id: &str) -> LibraryResult<FootprintMetadata> {
        let source = self.read_source(id)?;
        extract_metadata(&source).map_err(|e| LibraryError::Metadata {
            id: id.to_string(),
            source: e,
        })
    }

    /// Creates a new footprint from the minimal template.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::InvalidId`]/[`LibraryError::InvalidName`] for
    /// unusable identities, [`LibraryError::Exists`] when the id is taken,
    /// and [`LibraryError::Io`] on write failure.
    pub fn create(&self, id: &str, name: &str) -> LibraryResult<()> {
        self.check_free(id)?;
        check_name(name)?;
        self.write_source(id, &template(id, name))?;
        tracing::info!(library = %self.name, id, "Created footprint");
        Ok(())
    }

    /// Clones an existing footprint under a new identity.
    ///
    /// The clone's geometry and comments are byte-identical to the source;
    /// only the `@id` and `@name` directive values change.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::NotFound`] when `source_id` is absent,
    /// [`LibraryError::Metadata`] when its identity cannot be extracted,
    /// [`LibraryError::InvalidId`]/[`LibraryError::InvalidName`]/
    /// [`LibraryError::Exists`] for bad targets, and [`LibraryError::Io`] on
    /// filesystem failure.
    pub fn clone_from(&self, source_id: &str, new_id: &str, new_name: &str) -> LibraryResult<()> {
        self.check_free(new_id)?;
        check_name(new_name)?;
        let source = self.read_source(source_id)?;
        let old = extract_metadata(&source).map_err(|e| LibraryError::Metadata {
            id: source_id.to_string(),
            source: e,
        })?;
        let rewritten = rewrite_identity(&source, &old, new_id, new_name);
        self.write_source(new_id, &rewritten)?;
        tracing::info!(library = %self.name, from = source_id, to = new_id, "Cloned footprint");
        Ok(())
    }

    fn check_free(&self, id: &str) -> LibraryResult<()> {
        if !is_valid_id(id) {
            return Err(LibraryError::InvalidId { id: id.to_string() });
        }
        if self.script_path(id).exists() {
            return Err(LibraryError::Exists { id: id.to_string() });
        }
        Ok(())
    }
}

fn check_name(name: &str) -> LibraryResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(LibraryError::InvalidName {
            name: name.to_string(),
        })
    }
}

//! # contract: seams and shared data types of the sync pipeline
//!
//! This module defines the [`SourceFetcher`] trait used to acquire the
//! external repository, plus the error and report types every stage returns.
//!
//! ## Interface & Extensibility
//! - Implement [`SourceFetcher`] to acquire content some other way (e.g. a tarball).
//! - The production implementation is [`crate::download::GitFetcher`].
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; with the default `test-export-mocks`
//!   feature, `MockSourceFetcher` is available to downstream tests too.
//!
//! ## Error Handling
//! - Only conditions that leave the build without usable content are errors
//!   ([`SyncError`]). Everything skippable is logged and recorded in the report.

use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::Serialize;

use crate::classify::Category;

/// How the local snapshot of the external source was obtained for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquireOutcome {
    /// No cache existed; a fresh clone was made.
    Cloned,
    /// Cache existed and was reset and pulled.
    Updated,
    /// Cache existed but the update failed; the previous snapshot is used as-is.
    Stale,
}

/// Trait for acquiring the external content source into a local cache directory.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait SourceFetcher {
    /// Make `cache_dir` hold a working copy of the source.
    ///
    /// Returns `Err` only when no usable snapshot exists afterwards.
    fn acquire(&self, cache_dir: &Path) -> Result<AcquireOutcome, SyncError>;
}

#[derive(Debug)]
pub enum SyncError {
    /// First-time acquisition failed; nothing to build from.
    Clone { repo_url: String, message: String },
    Io { path: PathBuf, source: std::io::Error },
    Manifest { path: PathBuf, message: String },
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Clone { repo_url, message } => {
                write!(f, "failed to clone {repo_url}: {message}")
            }
            SyncError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            SyncError::Manifest { path, message } => {
                write!(f, "failed to write manifest {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// What happened to one document unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum UnitStatus {
    /// Primary file rewritten with an appendix.
    Augmented,
    /// Copied verbatim; no primary file.
    NoPrimaryFile,
    /// Copied verbatim; no code directory for this unit.
    NoCodeDirectory,
    /// Copied verbatim; code directory held no sample files.
    NoSamples,
    /// I/O failure while processing this unit only.
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub name: String,
    pub primary_file: Option<String>,
    pub samples: Vec<(Category, usize)>,
    pub status: UnitStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SynchroniseReport {
    pub acquisition: AcquireOutcome,
    /// False when the chapters tree was missing from the source.
    pub chapters_found: bool,
    pub units: Vec<UnitReport>,
    pub removed_auxiliary: Vec<PathBuf>,
}

impl SynchroniseReport {
    pub fn augmented(&self) -> usize {
        self.units
            .iter()
            .filter(|u| u.status == UnitStatus::Augmented)
            .count()
    }
}

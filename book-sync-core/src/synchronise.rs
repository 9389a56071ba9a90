//! High-level pipeline: orchestrates acquire → mirror → augment → page generation.
//!
//! This module provides the top-level orchestration for one build. It:
//!   - Acquires the external source through a [`SourceFetcher`] (clone or reset + pull)
//!   - Deletes previously synced units from the content directory
//!   - Copies each chapter unit verbatim and augments its primary file with code listings
//!   - Strips auxiliary README files from the synced units
//!   - Then (in [`run_pipeline`]) discovers renderable pages and writes the page manifests
//!
//! # Error Handling
//! Only a failed first clone, a destination that cannot be reset, or an unwritable
//! manifest abort the run. Everything else is scoped to the unit it happened in,
//! logged, and recorded in the [`SynchroniseReport`].
//!
//! # Navigation
//! - Entrypoints: [`sync_content`], [`run_pipeline`]
//! - Supporting types: [`crate::contract::SynchroniseReport`], [`PipelineReport`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::{LayoutConfig, SyncConfig};
use crate::contract::{SourceFetcher, SyncError, SynchroniseReport, UnitReport, UnitStatus};
use crate::pages::{self, Page};
use crate::preprocess::{sorted_entries, Processor};

#[derive(Debug)]
pub struct PipelineReport {
    pub sync: SynchroniseReport,
    pub pages: Vec<Page>,
}

/// Runs the whole build: `sync_content`, then `discover_units`, then `generate_pages`.
pub fn run_pipeline<F>(config: &SyncConfig, fetcher: &F) -> Result<PipelineReport, SyncError>
where
    F: SourceFetcher + ?Sized,
{
    let sync = sync_content(config, fetcher)?;
    let discovered = pages::discover_units(&config.content_dir)?;
    let pages = pages::generate_pages(discovered, &config.site)?;
    info!(
        units = sync.units.len(),
        augmented = sync.augmented(),
        pages = pages.len(),
        "Pipeline complete"
    );
    Ok(PipelineReport { sync, pages })
}

/// Mirrors the source's chapter units into `config.content_dir`.
pub fn sync_content<F>(config: &SyncConfig, fetcher: &F) -> Result<SynchroniseReport, SyncError>
where
    F: SourceFetcher + ?Sized,
{
    let layout = &config.layout;
    let cache_dir = &config.source.cache_dir;
    let content_dir = &config.content_dir;

    info!(repo_url = %config.source.repo_url, "[SYNC] Fetching latest content");
    let acquisition = fetcher.acquire(cache_dir)?;
    info!(outcome = ?acquisition, "[SYNC] Source acquired");

    reset_destination(content_dir, layout)?;

    let chapters_dir = cache_dir.join(&layout.chapters_dir);
    let code_dir = cache_dir.join(&layout.code_dir);

    if !chapters_dir.is_dir() {
        warn!(path = %chapters_dir.display(), "[SYNC] Chapters directory not found in source repository");
        return Ok(SynchroniseReport {
            acquisition,
            chapters_found: false,
            units: Vec::new(),
            removed_auxiliary: Vec::new(),
        });
    }

    let units = enumerate_units(&chapters_dir, layout)?;
    info!(count = units.len(), "[SYNC] Found chapters to process");

    let processor = Processor::new(layout, &config.samples);
    let mut reports = Vec::with_capacity(units.len());
    for unit in &units {
        info!(unit = %unit, "[SYNC] Processing unit");
        let dest = content_dir.join(unit);
        let outcome = copy_tree(&chapters_dir.join(unit), &dest)
            .and_then(|_| processor.process_unit(&dest, &code_dir.join(unit)));
        let report = match outcome {
            Ok(o) => UnitReport {
                name: unit.clone(),
                primary_file: o.primary_file,
                samples: o.samples,
                status: o.status,
            },
            Err(e) => {
                error!(unit = %unit, error = %e, "[SYNC][ERROR] Unit failed, continuing with the rest");
                UnitReport {
                    name: unit.clone(),
                    primary_file: None,
                    samples: Vec::new(),
                    status: UnitStatus::Failed(e.to_string()),
                }
            }
        };
        reports.push(report);
    }

    let removed_auxiliary = remove_auxiliary(content_dir, &units, layout);

    info!(
        units = reports.len(),
        removed = removed_auxiliary.len(),
        "[SYNC] Content sync completed"
    );
    Ok(SynchroniseReport {
        acquisition,
        chapters_found: true,
        units: reports,
        removed_auxiliary,
    })
}

/// Deletes every unit-named entry in `content_dir`, creating it if missing.
pub fn reset_destination(content_dir: &Path, layout: &LayoutConfig) -> Result<(), SyncError> {
    if !content_dir.exists() {
        fs::create_dir_all(content_dir).map_err(|e| SyncError::io(content_dir, e))?;
        debug!(path = %content_dir.display(), "Created content directory");
        return Ok(());
    }
    for entry in sorted_entries(content_dir)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !layout.is_unit_name(&name) {
            continue;
        }
        let path = entry.path();
        info!(unit = %name, "Removing existing unit");
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to remove existing unit");
            SyncError::io(&path, e)
        })?;
    }
    Ok(())
}

/// Unit directory names under `chapters_dir`, sorted.
pub fn enumerate_units(
    chapters_dir: &Path,
    layout: &LayoutConfig,
) -> Result<Vec<String>, SyncError> {
    Ok(sorted_entries(chapters_dir)?
        .into_iter()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| layout.is_unit_name(name))
        .collect())
}

/// Recursive verbatim copy of `src` into `dest`.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<(), SyncError> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
            SyncError::io(path, io)
        })?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| SyncError::io(&target, e))?;
        } else if entry.file_type().is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| SyncError::io(&target, e))?;
        }
    }
    debug!(from = %src.display(), to = %dest.display(), "Copied unit tree");
    Ok(())
}

/// Recreates the link itself rather than copying what it points at.
#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), SyncError> {
    let points_to = fs::read_link(link).map_err(|e| SyncError::io(link, e))?;
    std::os::unix::fs::symlink(&points_to, target).map_err(|e| SyncError::io(target, e))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), SyncError> {
    let points_to = fs::read_link(link).map_err(|e| SyncError::io(link, e))?;
    let resolved = link.parent().map(|p| p.join(&points_to)).unwrap_or(points_to);
    if resolved.is_dir() {
        copy_tree(&resolved, target)
    } else {
        fs::copy(&resolved, target)
            .map(|_| ())
            .map_err(|e| SyncError::io(target, e))
    }
}

/// Deletes auxiliary files left in each synced unit. Failures are logged, not fatal.
fn remove_auxiliary(content_dir: &Path, units: &[String], layout: &LayoutConfig) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for unit in units {
        let unit_dir = content_dir.join(unit);
        let entries = match sorted_entries(&unit_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(unit = %unit, error = %e, "Could not list unit for cleanup");
                continue;
            }
        };
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !entry.path().is_file() || !layout.is_auxiliary(&name) {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    info!(unit = %unit, file = %name, "Removed auxiliary file");
                    removed.push(entry.path());
                }
                Err(e) => warn!(unit = %unit, file = %name, error = ?e, "Failed to remove auxiliary file"),
            }
        }
    }
    removed
}

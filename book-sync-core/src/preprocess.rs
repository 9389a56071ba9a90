//! Per-unit processing: find the primary document, collect and classify code
//! samples, render the appendix and write it back atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::classify::{Category, Classifier};
use crate::config::{LayoutConfig, SampleConfig};
use crate::contract::{SyncError, UnitStatus};

/// A code file found next to a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSample {
    pub filename: String,
    pub code: String,
    pub category: Category,
}

/// Result of augmenting one unit, before it is folded into the report.
#[derive(Debug)]
pub struct UnitOutcome {
    pub primary_file: Option<String>,
    pub samples: Vec<(Category, usize)>,
    pub status: UnitStatus,
}

/// Directory entries sorted by file name, so every run walks them in the same order.
pub fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>, SyncError> {
    let mut entries = fs::read_dir(dir)
        .and_then(|rd| rd.collect::<Result<Vec<_>, _>>())
        .map_err(|e| SyncError::io(dir, e))?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

/// First file ending in the document extension that is not auxiliary.
pub fn find_primary_file(
    unit_dir: &Path,
    layout: &LayoutConfig,
) -> Result<Option<PathBuf>, SyncError> {
    for entry in sorted_entries(unit_dir)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file
            && name.ends_with(&layout.document_extension)
            && !name.contains(&layout.auxiliary_marker)
        {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// Reads every sample file in `code_dir` (non-recursive) and classifies it.
pub fn collect_samples(
    code_dir: &Path,
    samples: &SampleConfig,
    classifier: &Classifier,
) -> Result<Vec<CodeSample>, SyncError> {
    let mut found = Vec::new();
    for entry in sorted_entries(code_dir)? {
        let path = entry.path();
        let filename = entry.file_name().to_string_lossy().into_owned();
        if !path.is_file() || !filename.ends_with(&samples.extension) {
            continue;
        }
        let code = read_lossy(&path).map_err(|e| {
            error!(error = %e, path = %path.display(), "Failed to read code sample");
            e
        })?;
        let category = classifier.classify(&filename);
        info!(filename = %filename, category = category.as_str(), "Found code file");
        found.push(CodeSample {
            filename,
            code,
            category,
        });
    }
    Ok(found)
}

/// Reads `path` as text, replacing invalid UTF-8 sequences instead of failing.
pub fn read_lossy(path: &Path) -> Result<String, SyncError> {
    let bytes = fs::read(path).map_err(|e| SyncError::io(path, e))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!(
                path = %path.display(),
                valid_up_to = e.utf8_error().valid_up_to(),
                "File is not valid UTF-8, decoding lossily"
            );
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Renders the `# Code Examples` section. Empty input renders nothing.
///
/// Categories appear in [`Category::ALL`] order and are omitted when empty;
/// samples keep their input order within a category.
pub fn render_appendix(samples: &[CodeSample], language: &str) -> String {
    if samples.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n\n---\n\n# Code Examples\n\n");
    for category in Category::ALL {
        let mut in_category = samples.iter().filter(|s| s.category == category).peekable();
        if in_category.peek().is_none() {
            continue;
        }
        out.push_str(&format!("## {}\n\n", category.heading()));
        for sample in in_category {
            out.push_str(&format!(
                "**{}**\n\n```{}\n{}\n```\n\n",
                sample.filename, language, sample.code
            ));
        }
    }
    out
}

pub fn count_by_category(samples: &[CodeSample]) -> Vec<(Category, usize)> {
    Category::ALL
        .iter()
        .map(|c| (*c, samples.iter().filter(|s| s.category == *c).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}

/// Replace `path` with `contents` via a temp file in the same directory.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), SyncError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| SyncError::io(dir, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| SyncError::io(tmp.path(), e))?;
    // Temp files are created 0600; keep the mode of the file being replaced.
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| SyncError::io(tmp.path(), e))?;
    }
    tmp.persist(path).map_err(|e| SyncError::io(path, e.error))?;
    debug!(path = %path.display(), bytes = contents.len(), "Wrote file atomically");
    Ok(())
}

/// Augments the already-copied unit at `unit_dir` with samples from `code_dir`.
pub struct Processor<'a> {
    layout: &'a LayoutConfig,
    samples: &'a SampleConfig,
    classifier: Classifier,
}

impl<'a> Processor<'a> {
    pub fn new(layout: &'a LayoutConfig, samples: &'a SampleConfig) -> Self {
        Self {
            layout,
            samples,
            classifier: Classifier::from_config(samples),
        }
    }

    pub fn process_unit(&self, unit_dir: &Path, code_dir: &Path) -> Result<UnitOutcome, SyncError> {
        let unit = unit_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let primary = match find_primary_file(unit_dir, self.layout)? {
            Some(p) => p,
            None => {
                warn!(unit = %unit, "No main markdown file found");
                return Ok(UnitOutcome {
                    primary_file: None,
                    samples: Vec::new(),
                    status: UnitStatus::NoPrimaryFile,
                });
            }
        };
        let primary_name = primary
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());

        if !code_dir.is_dir() {
            info!(unit = %unit, code_dir = %code_dir.display(), "No code directory found");
            return Ok(UnitOutcome {
                primary_file: primary_name,
                samples: Vec::new(),
                status: UnitStatus::NoCodeDirectory,
            });
        }

        let samples = collect_samples(code_dir, self.samples, &self.classifier)?;
        if samples.is_empty() {
            info!(unit = %unit, extension = %self.samples.extension, "No sample files found in code directory");
            return Ok(UnitOutcome {
                primary_file: primary_name,
                samples: Vec::new(),
                status: UnitStatus::NoSamples,
            });
        }

        let mut content = read_lossy(&primary)?;
        content.push_str(&render_appendix(&samples, &self.samples.language));
        write_atomic(&primary, content.as_bytes())?;
        info!(unit = %unit, file = ?primary_name, samples = samples.len(), "Updated primary file with code examples");

        Ok(UnitOutcome {
            primary_file: primary_name,
            samples: count_by_category(&samples),
            status: UnitStatus::Augmented,
        })
    }
}

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::classify::{Category, ClassificationRule};

/// Everything one build needs. Loaded once and handed to every stage by reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    pub source: SourceConfig,
    /// Directory the site generator reads chapters from.
    pub content_dir: PathBuf,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub samples: SampleConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            repo_url = %self.source.repo_url,
            cache_dir = %self.source.cache_dir.display(),
            content_dir = %self.content_dir.display(),
            rules = self.samples.rules.len(),
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

/// The external repository holding the `chapters/` and `code/` trees.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub repo_url: String,
    /// Branch, tag or commit checked out after the first clone.
    #[serde(default)]
    pub reference: Option<String>,
    /// Local working copy; cloned into when absent, pulled otherwise.
    pub cache_dir: PathBuf,
}

/// Naming conventions shared by the source repository and the content directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub unit_prefix: String,
    pub chapters_dir: String,
    pub code_dir: String,
    pub document_extension: String,
    /// Files containing this marker are never primary and are stripped after sync.
    pub auxiliary_marker: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            unit_prefix: "chapter_".to_string(),
            chapters_dir: "chapters".to_string(),
            code_dir: "code".to_string(),
            document_extension: ".md".to_string(),
            auxiliary_marker: "README".to_string(),
        }
    }
}

impl LayoutConfig {
    pub fn is_unit_name(&self, name: &str) -> bool {
        name.starts_with(&self.unit_prefix)
    }

    pub fn is_auxiliary(&self, name: &str) -> bool {
        name.ends_with(&self.document_extension) && name.contains(&self.auxiliary_marker)
    }
}

/// Which code files are collected and how they are bucketed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub extension: String,
    /// Info string on the fenced code blocks.
    pub language: String,
    pub default_category: Category,
    /// Evaluated in order; the first rule whose needle occurs in the lowercased filename wins.
    pub rules: Vec<ClassificationRule>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            extension: ".py".to_string(),
            language: "python".to_string(),
            default_category: Category::Langchain,
            rules: ClassificationRule::defaults(),
        }
    }
}

/// Page-generation settings mirrored from the site generator's own config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub path_prefix: String,
    pub trailing_slash: bool,
    /// Where `pages.json` and `navigation-order.json` are written.
    pub manifest_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            path_prefix: String::new(),
            trailing_slash: false,
            manifest_dir: PathBuf::from("generated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let yaml = "source:\n  repo_url: x\n  cache_dir: c\ncontent_dir: d\nextras: true\n";
        let err = serde_yaml::from_str::<SyncConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("extras"), "got {err}");
    }

    #[test]
    fn omitted_sections_take_defaults() {
        let yaml = "source:\n  repo_url: x\n  cache_dir: c\ncontent_dir: d\n";
        let config: SyncConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.layout.chapters_dir, "chapters");
        assert_eq!(config.samples.rules, ClassificationRule::defaults());
        assert_eq!(config.site.manifest_dir, PathBuf::from("generated"));
    }
}

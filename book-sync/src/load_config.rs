/// `load_config` module: loads a YAML config file into the core [`SyncConfig`].
///
/// This is the only place user-supplied YAML is parsed. Relative paths in the
/// file are resolved against the directory holding the config file, so a build
/// behaves the same regardless of the working directory it is launched from.
///
/// # Errors
/// All errors use `anyhow::Error` for context-rich diagnostics and are surfaced
/// at the CLI boundary.
use anyhow::{bail, Result};
use book_sync_core::config::SyncConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: SyncConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let base = path_ref
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    config.source.cache_dir = resolve(base, &config.source.cache_dir);
    config.content_dir = resolve(base, &config.content_dir);
    config.site.manifest_dir = resolve(base, &config.site.manifest_dir);

    validate(&config)?;
    config.trace_loaded();
    Ok(config)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn validate(config: &SyncConfig) -> Result<()> {
    if config.source.repo_url.trim().is_empty() {
        bail!("source.repo_url must not be empty");
    }
    if config.layout.unit_prefix.is_empty() {
        bail!("layout.unit_prefix must not be empty: every content entry would be deleted");
    }
    if !config.layout.document_extension.starts_with('.') {
        bail!(
            "layout.document_extension must start with '.', got {:?}",
            config.layout.document_extension
        );
    }
    if !config.samples.extension.starts_with('.') {
        bail!(
            "samples.extension must start with '.', got {:?}",
            config.samples.extension
        );
    }
    if let Some(rule) = config.samples.rules.iter().find(|r| r.contains.is_empty()) {
        bail!(
            "samples.rules entry for {} has an empty `contains` and would match everything",
            rule.category.as_str()
        );
    }
    if config.source.cache_dir == config.content_dir {
        bail!("source.cache_dir and content_dir must differ");
    }
    Ok(())
}

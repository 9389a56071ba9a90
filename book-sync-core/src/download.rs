use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use crate::config::SourceConfig;
use crate::contract::{AcquireOutcome, SourceFetcher, SyncError};

/// Acquires the source by shelling out to the `git` CLI.
///
/// A missing cache is cloned (and the configured reference checked out);
/// an existing cache is hard-reset and pulled, or moved to the configured
/// reference when one is set. Update failures are downgraded
/// to [`AcquireOutcome::Stale`] so an offline build still runs.
pub struct GitFetcher {
    repo_url: String,
    reference: Option<String>,
}

impl GitFetcher {
    pub fn new(repo_url: impl Into<String>, reference: Option<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            reference,
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.repo_url.clone(), config.reference.clone())
    }

    fn clone_into(&self, cache_dir: &Path) -> Result<AcquireOutcome, SyncError> {
        if let Some(parent) = cache_dir.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    tracing::error!(
                        error = ?e,
                        path = %parent.display(),
                        "Failed to create cache parent directory"
                    );
                    SyncError::io(parent, e)
                })?;
            }
        }

        tracing::info!(repo_url = %self.repo_url, path = %cache_dir.display(), "Cloning repository");
        let clone = Command::new("git")
            .arg("clone")
            .arg(&self.repo_url)
            .arg(cache_dir)
            .output();
        self.expect_success(clone, "clone")?;

        if let Some(reference) = &self.reference {
            let checkout = Command::new("git")
                .arg("-C")
                .arg(cache_dir)
                .arg("checkout")
                .arg(reference)
                .output();
            if let Err(e) = self.expect_success(checkout, "checkout") {
                // A half-initialised cache would be mistaken for a valid one next run.
                let _ = fs::remove_dir_all(cache_dir);
                return Err(e);
            }
            tracing::info!(reference = %reference, "Checked out git reference");
        }

        tracing::info!(
            repo_url = %self.repo_url,
            path = %cache_dir.display(),
            "Successfully cloned git repository"
        );
        Ok(AcquireOutcome::Cloned)
    }

    fn update(&self, cache_dir: &Path) -> AcquireOutcome {
        tracing::info!(path = %cache_dir.display(), "Updating cached repository");
        let synced = self
            .git(cache_dir, &["reset", "--hard", "HEAD"])
            .and_then(|_| match &self.reference {
                None => self.git(cache_dir, &["pull"]),
                Some(reference) => self.follow_reference(cache_dir, reference),
            });
        if let Err(message) = synced {
            tracing::warn!(
                path = %cache_dir.display(),
                error = %message,
                "Failed to update repository, continuing with existing content"
            );
            return AcquireOutcome::Stale;
        }
        tracing::info!(path = %cache_dir.display(), "Repository updated successfully");
        AcquireOutcome::Updated
    }

    /// A branch is fast-forwarded to its remote; a tag or commit is re-checked out detached.
    fn follow_reference(&self, cache_dir: &Path, reference: &str) -> Result<(), String> {
        self.git(cache_dir, &["fetch", "--tags", "origin"])?;
        let remote_branch = format!("origin/{reference}");
        let is_branch = self
            .git(
                cache_dir,
                &["rev-parse", "--verify", "--quiet", &format!("refs/remotes/{remote_branch}")],
            )
            .is_ok();
        if is_branch {
            self.git(cache_dir, &["checkout", "-q", "-B", reference, &remote_branch])
        } else {
            tracing::debug!(reference, "Reference is pinned, not a branch");
            self.git(cache_dir, &["checkout", "-q", "--detach", reference])
        }
    }

    fn git(&self, cache_dir: &Path, args: &[&str]) -> Result<(), String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(cache_dir)
            .args(args)
            .output()
            .map_err(|e| format!("failed to launch git {}: {e}", args.join(" ")))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }

    fn expect_success(
        &self,
        result: std::io::Result<Output>,
        step: &str,
    ) -> Result<(), SyncError> {
        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                tracing::error!(
                    repo_url = %self.repo_url,
                    step,
                    status = ?out.status,
                    stderr = %stderr,
                    "Git exited with non-zero code"
                );
                Err(SyncError::Clone {
                    repo_url: self.repo_url.clone(),
                    message: format!("git {step} failed ({}): {stderr}", out.status),
                })
            }
            Err(e) => {
                tracing::error!(error = ?e, step, "Failed to launch git process");
                Err(SyncError::Clone {
                    repo_url: self.repo_url.clone(),
                    message: format!("failed to launch git {step}: {e}"),
                })
            }
        }
    }
}

impl SourceFetcher for GitFetcher {
    fn acquire(&self, cache_dir: &Path) -> Result<AcquireOutcome, SyncError> {
        if cache_dir.exists() {
            Ok(self.update(cache_dir))
        } else {
            self.clone_into(cache_dir)
        }
    }
}

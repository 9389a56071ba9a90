use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Writes a config next to the content it refers to; paths are relative to it.
fn write_config(dir: &Path, repo_url: &str) -> std::path::PathBuf {
    let config = dir.join("book-sync.yaml");
    fs::write(
        &config,
        format!(
            "source:\n  repo_url: \"{repo_url}\"\n  cache_dir: .cache/book\ncontent_dir: content\nsite:\n  manifest_dir: generated\n"
        ),
    )
    .expect("Writing temp config failed");
    config
}

#[test]
fn pages_cli_writes_manifests() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("content/chapter_01")).unwrap();
    fs::write(tmp.path().join("content/index.mdx"), "# Home\n").unwrap();
    fs::write(tmp.path().join("content/chapter_01/prompt_chaining.md"), "# PC\n").unwrap();
    let config = write_config(tmp.path(), "https://example.invalid/book.git");

    let mut cmd = Command::cargo_bin("book-sync").expect("Binary exists");
    cmd.arg("pages").arg("--config").arg(&config);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Generated 2 pages"));

    let nav = fs::read_to_string(tmp.path().join("generated/navigation-order.json")).unwrap();
    assert!(nav.contains("/chapter_01/prompt_chaining"));
}

#[test]
fn sync_cli_fails_when_first_clone_fails() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("no-such-repo");
    let config = write_config(tmp.path(), &missing.to_string_lossy());

    let mut cmd = Command::cargo_bin("book-sync").expect("Binary exists");
    cmd.arg("sync").arg("--config").arg(&config);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to clone"));
    assert!(!tmp.path().join("generated").exists());
}

#[test]
fn sync_cli_rejects_missing_config() {
    let mut cmd = Command::cargo_bin("book-sync").expect("Binary exists");
    cmd.arg("sync").arg("--config").arg("definitely-missing.yaml");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[test]
fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use book_sync::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Pages {
            config: std::path::PathBuf::from("dummy.yaml"),
        },
    };

    assert!(run(cli).is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

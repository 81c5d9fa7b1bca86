//! Shared test harness utilities for simple-docs crates.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
///
/// With `level` unset, logging is only enabled when `RUST_LOG` is present.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Write `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(&path, contents).expect("write fixture file");
    path
}

/// Create a temporary directory populated with `files`.
pub fn docs_tree(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    for (relative, contents) in files {
        write_file(temp.path(), relative, contents);
    }
    temp
}

/// A small documentation tree with ordinal prefixes and attributes.
pub fn sample_docs() -> TempDir {
    docs_tree(&[
        (
            "010_guide/020_intro.md",
            "[//]: # ([title]Introduction)\n[//]: # ([order]20)\n\n# Intro\n\nWelcome to {{ product }}.\n",
        ),
        (
            "010_guide/030_setup.md",
            "[//]: # ([title]Setup)\n\n# Setup\n\n## Requirements\n",
        ),
        ("readme.md", "# Readme\n\nTop-level page.\n"),
        ("assets/logo.txt", "not markdown"),
    ])
}

#![warn(missing_docs)]
//! Golden-file and metrics plumbing shared by the prediction tests and CLI.

mod chunk_worldtest;
mod metrics;
mod snapshot;

use std::path::{Path, PathBuf};

pub use chunk_worldtest::*;
pub use metrics::*;
pub use snapshot::*;

/// Path of the golden file `name` under `<manifest_dir>/tests/snapshots`.
///
/// Callers pass `env!("CARGO_MANIFEST_DIR")` so each crate keeps its own goldens.
pub fn snapshot_path(manifest_dir: impl AsRef<Path>, name: &str) -> PathBuf {
    manifest_dir
        .as_ref()
        .join("tests")
        .join("snapshots")
        .join(format!("{name}.json"))
}

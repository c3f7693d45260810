//! Chunk-sweep harness for golden snapshot tests.
//!
//! A chunk worldtest visits a fixed list of chunks, captures a snapshot per
//! chunk and compares the whole report against a golden JSON file (or
//! rewrites it when `SXR_UPDATE_SNAPSHOTS=1` is set).

use crate::snapshot::assert_json_snapshot;
use anyhow::Result;
use seedxray_core::ChunkPos;
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for a chunk worldtest.
#[derive(Debug, Clone)]
pub struct ChunkWorldtestConfig {
    /// Human-readable name (written into the snapshot report).
    pub name: String,
    /// World seed the snapshots were taken with.
    pub world_seed: i64,
    /// Path to the golden JSON file.
    pub snapshot_path: PathBuf,
}

/// Snapshot of one chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkWorldtestFrame<S> {
    /// Chunk coordinates `[x, z]`.
    pub chunk: [i32; 2],
    /// Snapshot payload.
    pub snapshot: S,
}

#[derive(Debug, Clone, Serialize)]
struct ChunkWorldtestReport<S> {
    name: String,
    world_seed: i64,
    frames: Vec<ChunkWorldtestFrame<S>>,
}

/// Snapshot every chunk in `chunks`, in order, and assert (or update) the
/// golden file at `config.snapshot_path`.
pub fn run_chunk_worldtest<Snapshot, SnapFn>(
    config: ChunkWorldtestConfig,
    chunks: &[ChunkPos],
    mut snapshot: SnapFn,
) -> Result<()>
where
    Snapshot: Serialize,
    SnapFn: FnMut(ChunkPos) -> Snapshot,
{
    let frames = chunks
        .iter()
        .map(|&chunk| ChunkWorldtestFrame {
            chunk: [chunk.x, chunk.z],
            snapshot: snapshot(chunk),
        })
        .collect();

    let report = ChunkWorldtestReport {
        name: config.name,
        world_seed: config.world_seed,
        frames,
    };
    assert_json_snapshot(config.snapshot_path, &report)
}

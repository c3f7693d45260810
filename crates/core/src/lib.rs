#![warn(missing_docs)]
//! Core primitives shared across the workspace.

mod block_key;
mod dimension;
#[allow(missing_docs)]
mod pos;
#[allow(missing_docs)]
mod seed;

pub use block_key::{BlockKey, BlockKeyError, DEFAULT_NAMESPACE};
pub use dimension::DimensionId;
pub use pos::{BlockPos, ChunkPos, Face, CHUNK_WIDTH, WORLD_MAX_Y, WORLD_MIN_Y};
pub use seed::{seed_label, string_hash, SeedError, SeedStore, WorldSeed};

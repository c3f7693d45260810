//! Seed-driven prediction of ore placement.
//!
//! [`ChunkOreSimulator`] replays the host's ore decoration for one chunk;
//! [`simulate_area`] fans that out over many chunks and [`OreTracker`]
//! keeps a cache current around a moving player.

mod cache;
mod int_provider;
mod ore;
mod random;
mod simulator;
mod sweep;
mod terrain;
mod vein;

pub use cache::*;
pub use int_provider::*;
pub use ore::*;
pub use random::*;
pub use simulator::*;
pub use sweep::*;
pub use terrain::*;
pub use vein::*;

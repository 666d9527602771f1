//! Shared scoring engine used by every pipeline.
//!
//! - duplicate averaging, weighted rollups and 0–100 projection (`aggregate`)
//! - threshold tables mapping scores to qualitative labels (`bands`)
//! - multi-level weighted trees evaluated bottom-up (`hierarchy`)

pub mod aggregate;
pub mod bands;
pub mod hierarchy;

pub use aggregate::{average_by_key, normalize, round_one, weighted_rollup, weighted_sum, ScoreMap};
pub use bands::{Band, BandTable, BandTableError};
pub use hierarchy::{Combine, Hierarchy, Level, Node};

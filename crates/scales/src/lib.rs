//! Composite index scoring for the SCALES observatory.
//!
//! Evidence rows (0–4 observations) are averaged per component, rolled up a
//! weighted hierarchy, projected to 0–100, banded and written as a JSON state
//! snapshot. The same engine drives the four-level SCALES index tree and the
//! two-level modules (AI_PEI, CAEI, ...).

pub mod check;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod telemetry;

//! Multi-source least-cost-path search over weighted 2D grids.
//!
//! Given three same-shaped fields — an origin indicator, a target indicator
//! and a per-cell traversal weight — [`seek()`] finds the cheapest route
//! from every target back to the origin set in a single sweep:
//!
//! - **[`CostModel`]** validates the inputs and fixes the entering-cost
//!   rule (stepping into a cell costs that cell's weight).
//! - **[`PathSearch`]** runs a multi-source Dijkstra sweep, producing a
//!   distance field and predecessor pointers, with deterministic
//!   tie-breaking so reruns settle identically.
//! - **[`PathAggregator`]** walks predecessors from every target and merges
//!   the routes into a path grid under a [`PathPolicy`].
//! - **[`TraceRecorder`]** optionally films the frontier as it settles, for
//!   later playback through [`TraceEncoder`] / [`TraceDecoder`].
//!
//! [`PathSearch`] reuses its internal caches across sweeps, so repeated
//! queries incur no allocations after warm-up. Custom graphs plug in
//! through the [`Terrain`] trait.
//!
//! # Path policies
//!
//! | Policy | Path grid holds |
//! |---|---|
//! | [`PathPolicy::Link`] | 1 on every route cell; routes share cells freely |
//! | [`PathPolicy::Exclusive`] | a 1-based route label; the first route keeps shared cells |
//! | [`PathPolicy::Count`] | how many routes cross the cell |

mod aggregate;
mod config;
mod cost;
mod error;
mod search;
mod seek;
mod terrain;
mod trace;

pub use aggregate::{Aggregation, PathAggregator, Route};
pub use config::{
    Connectivity, IMPASSABLE_WEIGHT, PathPolicy, SeekConfig, UnknownPolicy, WeightFill,
};
pub use cost::CostModel;
pub use error::SeekError;
pub use search::{PathSearch, SettleEvent, UNREACHABLE};
pub use seek::{SeekResult, seek};
pub use terrain::Terrain;
pub use trace::{Trace, TraceDecoder, TraceEncoder, TraceFrame, TraceRecorder};

//! Run configuration: path policy, connectivity, fill rule and flags.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use wayfield_core::Point;

/// Weight substituted for missing cells under [`WeightFill::Impassable`].
pub const IMPASSABLE_WEIGHT: f64 = 999.0;

// ---------------------------------------------------------------------------
// PathPolicy
// ---------------------------------------------------------------------------

/// How reconstructed routes are merged into the output path grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathPolicy {
    /// Mark every route cell with `1`; routes share cells freely.
    #[default]
    Link,
    /// Label cells with a 1-based route number; the first route to reach
    /// a cell keeps it.
    Exclusive,
    /// Store how many routes cross each cell.
    Count,
}

impl fmt::Display for PathPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Link => "link",
            Self::Exclusive => "exclusive",
            Self::Count => "count",
        };
        f.write_str(name)
    }
}

impl FromStr for PathPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link" => Ok(Self::Link),
            "exclusive" => Ok(Self::Exclusive),
            "count" => Ok(Self::Count),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognised [`PathPolicy`] name.
#[derive(Debug, Clone)]
pub struct UnknownPolicy(pub String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown path policy {:?}, expected \"link\", \"exclusive\" or \"count\"",
            self.0
        )
    }
}

impl std::error::Error for UnknownPolicy {}

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

const CARDINAL: [Point; 4] = [
    Point::new(0, -1),
    Point::new(1, 0),
    Point::new(0, 1),
    Point::new(-1, 0),
];

const COMPASS: [Point; 8] = [
    Point::new(0, -1),
    Point::new(1, 0),
    Point::new(0, 1),
    Point::new(-1, 0),
    Point::new(1, -1),
    Point::new(1, 1),
    Point::new(-1, 1),
    Point::new(-1, -1),
];

/// Which neighbourhood the search explores from each cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Connectivity {
    /// The four cardinal neighbours.
    #[default]
    Four,
    /// Cardinals plus diagonals.
    Eight,
}

impl Connectivity {
    /// Step offsets for this neighbourhood, cardinals first.
    pub fn offsets(self) -> &'static [Point] {
        match self {
            Self::Four => &CARDINAL,
            Self::Eight => &COMPASS,
        }
    }
}

// ---------------------------------------------------------------------------
// WeightFill
// ---------------------------------------------------------------------------

/// Replacement rule for missing (NaN) weights.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightFill {
    /// Treat missing cells as plain ground with weight `1`.
    Unit,
    /// Treat missing cells as near-impassable terrain.
    #[default]
    Impassable,
    /// Substitute a caller-chosen weight.
    Value(f64),
}

impl WeightFill {
    /// The weight substituted for a missing cell.
    pub fn value(self) -> f64 {
        match self {
            Self::Unit => 1.0,
            Self::Impassable => IMPASSABLE_WEIGHT,
            Self::Value(v) => v,
        }
    }
}

// ---------------------------------------------------------------------------
// SeekConfig
// ---------------------------------------------------------------------------

/// Tuning knobs for a [`seek()`] run.
///
/// [`seek()`]: crate::seek()
#[derive(Debug, Clone)]
pub struct SeekConfig {
    /// How routes are merged into the path grid.
    pub path_handling: PathPolicy,
    /// Neighbourhood explored from each cell.
    pub connectivity: Connectivity,
    /// Replacement rule for NaN weights.
    pub fill: WeightFill,
    /// Drop targets that sit on an origin cell.
    pub targets_exclude_origins: bool,
    /// Log per-stage diagnostics.
    pub debug: bool,
    /// Record frontier settles for later playback.
    pub film: bool,
    /// Settle events per recorded frame; minimum 1.
    pub film_every: usize,
    /// Stop the sweep once every target has settled.
    pub early_stop: bool,
    /// Cooperative cancellation flag, checked between settles.
    pub abort: Option<Arc<AtomicBool>>,
}

impl Default for SeekConfig {
    fn default() -> Self {
        Self {
            path_handling: PathPolicy::Link,
            connectivity: Connectivity::Four,
            fill: WeightFill::Impassable,
            targets_exclude_origins: false,
            debug: false,
            film: false,
            film_every: 1,
            early_stop: false,
            abort: None,
        }
    }
}

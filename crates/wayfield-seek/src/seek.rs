//! The engine boundary: validate inputs, sweep, aggregate, bundle.

use wayfield_core::{Field, Point};

use crate::aggregate::{Aggregation, PathAggregator, Route};
use crate::config::SeekConfig;
use crate::cost::CostModel;
use crate::error::SeekError;
use crate::search::PathSearch;
use crate::trace::{Trace, TraceRecorder};

/// Everything one [`seek()`] invocation produces.
#[derive(Debug, Clone)]
pub struct SeekResult {
    /// Per-cell path membership under the configured policy.
    pub paths: Field<u32>,
    /// Minimum cumulative cost from the origin set, per cell.
    pub distance: Field<f64>,
    /// Reconstructed routes, in scan order of their targets.
    pub routes: Vec<Route>,
    /// Targets no origin can reach.
    pub unreached: Vec<Point>,
    /// The recorded film, when `config.film` was set.
    pub trace: Option<Trace>,
}

/// Find least-cost routes from every target back to the origin set.
///
/// `origins` and `targets` are indicator grids (a cell is marked when its
/// value is finite and nonzero) and must have the same shape as `weights`,
/// whose entries price stepping **into** each cell. The full distance field
/// is computed in one multi-source sweep, then one route per reachable
/// target is walked back and merged into the path grid under
/// `config.path_handling`.
///
/// Unreachable targets are not an error; they are listed in
/// [`SeekResult::unreached`] with [`UNREACHABLE`] in the distance field.
/// Validation problems and cancellation are.
///
/// [`UNREACHABLE`]: crate::UNREACHABLE
pub fn seek(
    origins: &Field<f64>,
    targets: &Field<f64>,
    weights: &Field<f64>,
    config: &SeekConfig,
) -> Result<SeekResult, SeekError> {
    let model = CostModel::new(origins, targets, weights, config)?;
    if config.debug {
        log::debug!(
            "seek: {}x{} grid, {} origins, {} targets, policy {}",
            model.bounds().width(),
            model.bounds().height(),
            model.origin_cells().len(),
            model.target_cells().len(),
            config.path_handling,
        );
    }

    let mut recorder = if config.film {
        Some(TraceRecorder::new(
            model.bounds().width(),
            model.bounds().height(),
            config.film_every,
        ))
    } else {
        None
    };

    let mut search = PathSearch::new(model.bounds());
    search.seek_map(
        &model,
        model.origin_cells(),
        model.target_cells(),
        config,
        recorder.as_mut(),
    )?;

    let distance = search.distance_field();
    let Aggregation {
        paths,
        routes,
        unreached,
    } = PathAggregator::new(config.path_handling).aggregate(&search, &model);

    if config.debug {
        log::debug!(
            "seek: {} routes, {} unreached, {} cells settled",
            routes.len(),
            unreached.len(),
            search.settled().len(),
        );
    }

    Ok(SeekResult {
        paths,
        distance,
        routes,
        unreached,
        trace: recorder.map(TraceRecorder::finish),
    })
}

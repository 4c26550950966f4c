//! Input validation and the entering-cost model.

use wayfield_core::{Field, Point, Range};

use crate::config::{Connectivity, SeekConfig};
use crate::error::SeekError;
use crate::terrain::Terrain;

/// Validated view of the three input grids.
///
/// Construction checks shapes, substitutes the configured fill for NaN
/// weights, rejects negative or non-finite weights, and coerces the origin
/// and target indicator grids to cell lists (a cell is marked when its value
/// is finite and nonzero). The resulting model prices movement with the
/// entering-cost rule: stepping into a cell costs that cell's weight,
/// regardless of where the step came from.
#[derive(Debug, Clone)]
pub struct CostModel {
    bounds: Range,
    width: usize,
    weights: Vec<f64>,
    origin_cells: Vec<Point>,
    target_cells: Vec<Point>,
    connectivity: Connectivity,
}

impl CostModel {
    /// Validate the input grids against `config` and build the model.
    ///
    /// `origins` and `targets` must have the same shape as `weights`.
    pub fn new(
        origins: &Field<f64>,
        targets: &Field<f64>,
        weights: &Field<f64>,
        config: &SeekConfig,
    ) -> Result<Self, SeekError> {
        let size = weights.size();
        if origins.size() != size {
            return Err(SeekError::ShapeMismatch {
                grid: "origins",
                expected: size,
                found: origins.size(),
            });
        }
        if targets.size() != size {
            return Err(SeekError::ShapeMismatch {
                grid: "targets",
                expected: size,
                found: targets.size(),
            });
        }

        let fill = config.fill.value();
        let mut filled = Vec::with_capacity(weights.len());
        for (p, &w) in weights.iter() {
            let w = if w.is_nan() { fill } else { w };
            if !w.is_finite() || w < 0.0 {
                return Err(SeekError::InvalidWeight { pos: p, value: w });
            }
            filled.push(w);
        }

        let origin_cells = marked_cells(origins);
        let mut target_cells = marked_cells(targets);
        if config.targets_exclude_origins && !origin_cells.is_empty() {
            let before = target_cells.len();
            // Both lists are in scan order, so membership is a binary search.
            target_cells.retain(|t| origin_cells.binary_search(t).is_err());
            let dropped = before - target_cells.len();
            if config.debug && dropped > 0 {
                log::debug!("dropped {dropped} targets that sit on origin cells");
            }
        }

        Ok(Self {
            bounds: weights.bounds(),
            width: size.x.max(0) as usize,
            weights: filled,
            origin_cells,
            target_cells,
            connectivity: config.connectivity,
        })
    }

    /// The grid rectangle the model covers.
    pub fn bounds(&self) -> Range {
        self.bounds
    }

    /// Origin cells in scan order.
    pub fn origin_cells(&self) -> &[Point] {
        &self.origin_cells
    }

    /// Target cells in scan order, after any origin exclusion.
    pub fn target_cells(&self) -> &[Point] {
        &self.target_cells
    }

    /// The filled weight of `p`, or `None` outside the grid.
    pub fn weight(&self, p: Point) -> Option<f64> {
        if self.bounds.contains(p) {
            Some(self.weights[(p.y as usize) * self.width + p.x as usize])
        } else {
            None
        }
    }
}

impl Terrain for CostModel {
    fn neighbors(&self, p: Point, buf: &mut Vec<Point>) {
        for &d in self.connectivity.offsets() {
            let np = p.shift(d.x, d.y);
            if self.bounds.contains(np) {
                buf.push(np);
            }
        }
    }

    fn cost(&self, _from: Point, to: Point) -> f64 {
        self.weights[(to.y as usize) * self.width + to.x as usize]
    }
}

/// Cells whose indicator value is finite and nonzero, in scan order.
fn marked_cells(grid: &Field<f64>) -> Vec<Point> {
    let mut cells = Vec::new();
    for (p, &v) in grid.iter() {
        if v.is_finite() && v != 0.0 {
            cells.push(p);
        }
    }
    cells
}

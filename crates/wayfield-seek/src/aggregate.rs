//! Route reconstruction and path-grid aggregation.

use wayfield_core::{Field, Point};

use crate::config::PathPolicy;
use crate::cost::CostModel;
use crate::search::PathSearch;

/// One reconstructed least-cost route from a target back to an origin.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// The target cell the walk started from.
    pub target: Point,
    /// The origin cell the walk ended at.
    pub origin: Point,
    /// Total cost of the route, the target's distance-field value.
    pub cost: f64,
    /// Every cell on the route, target first, origin last.
    pub cells: Vec<Point>,
}

/// Output of [`PathAggregator::aggregate`].
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Per-cell path membership under the configured policy.
    pub paths: Field<u32>,
    /// Reconstructed routes, in scan order of their targets.
    pub routes: Vec<Route>,
    /// Targets with no route from any origin.
    pub unreached: Vec<Point>,
}

/// Walks predecessor chains from every target and merges the routes into
/// a path grid under a [`PathPolicy`].
///
/// Routes are numbered 1, 2, ... in scan order of their targets, which is
/// what makes [`PathPolicy::Exclusive`] labelling reproducible.
pub struct PathAggregator {
    policy: PathPolicy,
}

impl PathAggregator {
    pub fn new(policy: PathPolicy) -> Self {
        Self { policy }
    }

    /// Reconstruct a route for every target of `model` from the last sweep
    /// of `search`.
    ///
    /// Targets whose distance is [`UNREACHABLE`] are reported in
    /// [`Aggregation::unreached`] instead of producing a route; a target
    /// that is itself an origin yields a single-cell route of cost 0.
    ///
    /// [`UNREACHABLE`]: crate::UNREACHABLE
    pub fn aggregate(&self, search: &PathSearch, model: &CostModel) -> Aggregation {
        let bounds = model.bounds();
        let mut paths: Field<u32> = Field::new(bounds.width(), bounds.height(), 0);
        let mut routes: Vec<Route> = Vec::new();
        let mut unreached: Vec<Point> = Vec::new();

        for &target in model.target_cells() {
            let cost = search.distance_at(target);
            if !cost.is_finite() {
                unreached.push(target);
                continue;
            }

            // Walk the predecessor chain down to a source.
            let mut cells = vec![target];
            let mut cur = target;
            while let Some(prev) = search.predecessor(cur) {
                cells.push(prev);
                cur = prev;
            }
            let origin = cur;

            let label = routes.len() as u32 + 1;
            for &c in &cells {
                match self.policy {
                    PathPolicy::Link => paths.set(c, 1),
                    PathPolicy::Exclusive => {
                        if paths.at(c) == Some(0) {
                            paths.set(c, label);
                        }
                    }
                    PathPolicy::Count => {
                        if let Some(v) = paths.get_mut(c) {
                            *v += 1;
                        }
                    }
                }
            }

            routes.push(Route {
                target,
                origin,
                cost,
                cells,
            });
        }

        Aggregation {
            paths,
            routes,
            unreached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeekConfig;

    fn indicator(width: i32, height: i32, cells: &[Point]) -> Field<f64> {
        let mut field = Field::new(width, height, 0.0);
        for &c in cells {
            field.set(c, 1.0);
        }
        field
    }

    /// Build the model, run the sweep, aggregate under `policy`.
    fn run(
        origins: &[Point],
        targets: &[Point],
        weights: Field<f64>,
        policy: PathPolicy,
    ) -> Aggregation {
        let size = weights.size();
        let origins = indicator(size.x, size.y, origins);
        let targets = indicator(size.x, size.y, targets);
        let config = SeekConfig::default();
        let model = CostModel::new(&origins, &targets, &weights, &config).unwrap();

        let mut search = PathSearch::new(model.bounds());
        search
            .seek_map(
                &model,
                model.origin_cells(),
                model.target_cells(),
                &config,
                None,
            )
            .unwrap();
        PathAggregator::new(policy).aggregate(&search, &model)
    }

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn single_route_marks_its_cells() {
        let agg = run(
            &[p(0, 0)],
            &[p(2, 2)],
            Field::new(3, 3, 1.0),
            PathPolicy::Link,
        );

        assert_eq!(agg.routes.len(), 1);
        assert!(agg.unreached.is_empty());
        let route = &agg.routes[0];
        assert_eq!(route.target, p(2, 2));
        assert_eq!(route.origin, p(0, 0));
        assert_eq!(route.cost, 4.0);
        assert_eq!(route.cells.len(), 5);
        assert_eq!(route.cells.first(), Some(&p(2, 2)));
        assert_eq!(route.cells.last(), Some(&p(0, 0)));

        // Exactly the route cells carry a mark.
        assert_eq!(agg.paths.count_where(|&v| v > 0), 5);
        for &c in &route.cells {
            assert_eq!(agg.paths.at(c), Some(1));
        }
    }

    #[test]
    fn route_distances_never_increase_along_the_walk() {
        let weights = Field::from_rows(vec![
            vec![1.0, 3.0, 1.0, 2.0],
            vec![2.0, 1.0, 5.0, 1.0],
            vec![1.0, 2.0, 1.0, 1.0],
        ])
        .unwrap();
        let origins = indicator(4, 3, &[p(0, 0)]);
        let targets = indicator(4, 3, &[p(3, 2)]);
        let config = SeekConfig::default();
        let model = CostModel::new(&origins, &targets, &weights, &config).unwrap();
        let mut search = PathSearch::new(model.bounds());
        search
            .seek_map(
                &model,
                model.origin_cells(),
                model.target_cells(),
                &config,
                None,
            )
            .unwrap();
        let agg = PathAggregator::new(PathPolicy::Link).aggregate(&search, &model);

        let route = &agg.routes[0];
        assert_eq!(route.cost, search.distance_at(route.target));
        for w in route.cells.windows(2) {
            assert!(search.distance_at(w[0]) >= search.distance_at(w[1]));
        }
        assert_eq!(search.distance_at(route.origin), 0.0);
    }

    #[test]
    fn link_shares_cells_between_routes() {
        // Both targets funnel through the single corridor row.
        let agg = run(
            &[p(0, 1)],
            &[p(4, 0), p(4, 2)],
            Field::new(5, 3, 1.0),
            PathPolicy::Link,
        );

        assert_eq!(agg.routes.len(), 2);
        let marked = agg.paths.count_where(|&v| v > 0);
        let total: usize = agg.routes.iter().map(|r| r.cells.len()).sum();
        // Shared cells are marked once, so the network is smaller than the
        // sum of its routes.
        assert!(marked < total);
        for (_, &v) in agg.paths.iter() {
            assert!(v <= 1);
        }
    }

    #[test]
    fn exclusive_labels_routes_first_wins() {
        let agg = run(
            &[p(0, 0)],
            &[p(2, 0), p(2, 1)],
            Field::new(3, 2, 1.0),
            PathPolicy::Exclusive,
        );

        assert_eq!(agg.routes.len(), 2);
        // Scan order numbers (2, 0)'s route 1 and (2, 1)'s route 2.
        assert_eq!(agg.paths.at(p(2, 0)), Some(1));
        assert_eq!(agg.paths.at(p(2, 1)), Some(2));
        // The shared origin keeps the first route's label.
        assert_eq!(agg.paths.at(p(0, 0)), Some(1));
    }

    #[test]
    fn count_tallies_route_multiplicity() {
        // A 1-wide corridor forces both routes over the same cells.
        let agg = run(
            &[p(0, 0)],
            &[p(3, 0), p(4, 0)],
            Field::new(5, 1, 1.0),
            PathPolicy::Count,
        );

        assert_eq!(agg.routes.len(), 2);
        // Cells up to the nearer target carry both routes.
        assert_eq!(agg.paths.at(p(0, 0)), Some(2));
        assert_eq!(agg.paths.at(p(3, 0)), Some(2));
        // Only the farther route continues past it.
        assert_eq!(agg.paths.at(p(4, 0)), Some(1));
    }

    #[test]
    fn unreachable_targets_are_reported() {
        let agg = run(&[], &[p(2, 2)], Field::new(3, 3, 1.0), PathPolicy::Link);

        assert!(agg.routes.is_empty());
        assert_eq!(agg.unreached, vec![p(2, 2)]);
        assert_eq!(agg.paths.count_where(|&v| v > 0), 0);
    }

    #[test]
    fn target_on_origin_yields_zero_length_route() {
        let agg = run(
            &[p(1, 1)],
            &[p(1, 1)],
            Field::new(3, 3, 1.0),
            PathPolicy::Link,
        );

        assert_eq!(agg.routes.len(), 1);
        let route = &agg.routes[0];
        assert_eq!(route.cost, 0.0);
        assert_eq!(route.cells, vec![p(1, 1)]);
        assert_eq!(route.origin, p(1, 1));
        assert_eq!(agg.paths.at(p(1, 1)), Some(1));
    }
}

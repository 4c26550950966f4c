//! Multi-source least-cost sweep over a grid rectangle.

use std::collections::BinaryHeap;

use wayfield_core::{Field, Point, Range};

use crate::config::SeekConfig;
use crate::error::SeekError;
use crate::terrain::Terrain;
use crate::trace::TraceRecorder;

/// Sentinel distance meaning "not reached" in distance queries.
pub const UNREACHABLE: f64 = f64::INFINITY;

/// A settled cell with its final distance, in settle order.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SettleEvent {
    pub pos: Point,
    pub distance: f64,
}

// ---------------------------------------------------------------------------
// Internal node for the priority-queue sweep
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct Node {
    dist: f64,
    parent: usize,
    generation: u32,
    open: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            dist: 0.0,
            parent: usize::MAX,
            generation: 0,
            open: false,
        }
    }
}

/// Reference into the node array, ordered by distance for use in `BinaryHeap`.
#[derive(Clone, Copy, PartialEq)]
struct FrontierRef {
    idx: usize,
    dist: f64,
    seq: u64,
}

impl Eq for FrontierRef {}

impl Ord for FrontierRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse so BinaryHeap (max-heap) pops the smallest distance first,
        // ties going to the earliest-queued entry.
        other
            .dist
            .total_cmp(&self.dist)
            .then(other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// PathSearch
// ---------------------------------------------------------------------------

/// Coordinator for least-cost sweeps on a grid rectangle.
///
/// `PathSearch` owns all internal caches (node array, distance map, settle
/// log, scratch buffers) so that repeated sweeps incur no allocations after
/// the first use. Query methods report on the **last** [`seek_map`] call.
///
/// [`seek_map`]: PathSearch::seek_map
pub struct PathSearch {
    rng: Range,
    width: usize,
    nodes: Vec<Node>,
    generation: u32,
    dist: Vec<f64>,
    target_marks: Vec<bool>,
    settles: Vec<SettleEvent>,
    // shared scratch buffer for neighbour queries
    nbuf: Vec<Point>,
}

impl PathSearch {
    /// Create a new `PathSearch` for the given grid rectangle.
    pub fn new(rng: Range) -> Self {
        let w = rng.width().max(0) as usize;
        let len = rng.len();
        Self {
            rng,
            width: w,
            nodes: vec![Node::default(); len],
            generation: 0,
            dist: vec![UNREACHABLE; len],
            target_marks: vec![false; len],
            settles: Vec::new(),
            nbuf: Vec::with_capacity(8),
        }
    }

    /// Replace the underlying range, reallocating caches as needed.
    ///
    /// If the new size fits within existing capacity, caches are preserved
    /// and only the generation counter is bumped so stale entries are
    /// ignored. Otherwise caches are reallocated.
    pub fn set_range(&mut self, rng: Range) {
        let new_len = rng.len();
        let old_capacity = self.nodes.len();
        self.rng = rng;
        self.width = rng.width().max(0) as usize;

        if new_len <= old_capacity {
            self.generation = self.generation.wrapping_add(1);
            self.settles.clear();
            return;
        }

        self.nodes.clear();
        self.nodes.resize(new_len, Node::default());
        self.generation = 0;
        self.dist.clear();
        self.dist.resize(new_len, UNREACHABLE);
        self.target_marks.clear();
        self.target_marks.resize(new_len, false);
        self.settles.clear();
    }

    /// The grid rectangle being used.
    #[inline]
    pub fn range(&self) -> Range {
        self.rng
    }

    // -----------------------------------------------------------------------
    // Coordinate helpers
    // -----------------------------------------------------------------------

    /// Convert a `Point` to a flat index. Returns `None` if out of range.
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if !self.rng.contains(p) {
            return None;
        }
        let x = (p.x - self.rng.min.x) as usize;
        let y = (p.y - self.rng.min.y) as usize;
        Some(y * self.width + x)
    }

    /// Convert a flat index back to a `Point`.
    #[inline]
    fn point(&self, idx: usize) -> Point {
        let x = (idx % self.width) as i32 + self.rng.min.x;
        let y = (idx / self.width) as i32 + self.rng.min.y;
        Point::new(x, y)
    }

    // -----------------------------------------------------------------------
    // Sweep
    // -----------------------------------------------------------------------

    /// Run a multi-source least-cost sweep from `sources`.
    ///
    /// Every source starts at distance 0 and cells settle in nondecreasing
    /// distance order; among equal distances the earliest-queued cell wins,
    /// so reruns over the same inputs settle in the same order. `targets`
    /// is consulted only when `config.early_stop` is set, to end the sweep
    /// once every in-range target has settled. Each settle is reported to
    /// `recorder` when one is given.
    ///
    /// Returns the settle log, or [`SeekError::Aborted`] as soon as the
    /// `config.abort` flag is observed set.
    pub fn seek_map<T: Terrain>(
        &mut self,
        terrain: &T,
        sources: &[Point],
        targets: &[Point],
        config: &SeekConfig,
        mut recorder: Option<&mut TraceRecorder>,
    ) -> Result<&[SettleEvent], SeekError> {
        // Hard-reset the flat distance map.
        for v in self.dist.iter_mut() {
            *v = UNREACHABLE;
        }
        self.settles.clear();

        self.generation = self.generation.wrapping_add(1);
        let cur_gen = self.generation;

        let mut remaining = if config.early_stop {
            for v in self.target_marks.iter_mut() {
                *v = false;
            }
            let mut count = 0usize;
            for &t in targets {
                if let Some(ti) = self.idx(t) {
                    if !self.target_marks[ti] {
                        self.target_marks[ti] = true;
                        count += 1;
                    }
                }
            }
            Some(count)
        } else {
            None
        };

        let mut open: BinaryHeap<FrontierRef> = BinaryHeap::new();
        let mut seq: u64 = 0;

        // Seed sources in the order given.
        for &src in sources {
            if let Some(si) = self.idx(src) {
                let n = &mut self.nodes[si];
                n.dist = 0.0;
                n.parent = usize::MAX;
                n.generation = cur_gen;
                n.open = true;
                self.dist[si] = 0.0;
                open.push(FrontierRef { idx: si, dist: 0.0, seq });
                seq += 1;
            }
        }

        if remaining == Some(0) {
            // Every target is already settled (there are none in range).
            return Ok(&self.settles);
        }

        let mut nbuf = std::mem::take(&mut self.nbuf);

        while let Some(current) = open.pop() {
            let ci = current.idx;
            let cn = &self.nodes[ci];
            if cn.generation != cur_gen || !cn.open {
                continue;
            }
            let current_dist = cn.dist;

            if let Some(flag) = &config.abort {
                if flag.load(std::sync::atomic::Ordering::Relaxed) {
                    self.nbuf = nbuf;
                    return Err(SeekError::Aborted {
                        settled: self.settles.len(),
                    });
                }
            }

            self.nodes[ci].open = false;

            let cp = self.point(ci);
            self.settles.push(SettleEvent {
                pos: cp,
                distance: current_dist,
            });
            if let Some(rec) = recorder.as_deref_mut() {
                rec.settle(cp, current_dist);
            }

            if let Some(left) = remaining.as_mut() {
                if self.target_marks[ci] {
                    *left -= 1;
                    if *left == 0 {
                        if config.debug {
                            log::debug!(
                                "all targets settled after {} cells",
                                self.settles.len()
                            );
                        }
                        break;
                    }
                }
            }

            nbuf.clear();
            terrain.neighbors(cp, &mut nbuf);

            for &np in nbuf.iter() {
                let Some(ni) = self.idx(np) else {
                    continue;
                };
                let candidate = current_dist + terrain.cost(cp, np);

                let n = &mut self.nodes[ni];
                if n.generation == cur_gen {
                    if candidate >= n.dist {
                        continue;
                    }
                } else {
                    n.generation = cur_gen;
                }

                n.dist = candidate;
                n.parent = ci;
                n.open = true;
                self.dist[ni] = candidate;
                open.push(FrontierRef {
                    idx: ni,
                    dist: candidate,
                    seq,
                });
                seq += 1;
            }
        }

        self.nbuf = nbuf;

        if config.debug {
            log::debug!(
                "sweep settled {} of {} cells",
                self.settles.len(),
                self.rng.len()
            );
        }

        Ok(&self.settles)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Distance of `p` from the source set.
    ///
    /// Returns [`UNREACHABLE`] if the point is outside the range or was not
    /// reached by the last `seek_map` call.
    pub fn distance_at(&self, p: Point) -> f64 {
        match self.idx(p) {
            Some(i) => self.dist[i],
            None => UNREACHABLE,
        }
    }

    /// The cell `p` was reached from in the last sweep.
    ///
    /// Returns `None` for sources, unreached cells and points outside the
    /// range, so following predecessors from any reached cell walks back to
    /// a source.
    pub fn predecessor(&self, p: Point) -> Option<Point> {
        let i = self.idx(p)?;
        if !self.dist[i].is_finite() {
            return None;
        }
        let parent = self.nodes[i].parent;
        if parent == usize::MAX {
            return None;
        }
        Some(self.point(parent))
    }

    /// Settle events from the last sweep, in settle order.
    pub fn settled(&self) -> &[SettleEvent] {
        &self.settles
    }

    /// The distance map from the last sweep as a field, [`UNREACHABLE`]
    /// where no route from the sources exists.
    pub fn distance_field(&self) -> Field<f64> {
        Field::from_fn(self.rng.width(), self.rng.height(), |p| {
            self.dist[(p.y as usize) * self.width + p.x as usize]
        })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PathSearch {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rng.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for PathSearch {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let range = Range::deserialize(deserializer)?;
        Ok(PathSearch::new(range))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use super::*;

    /// Open grid where every step costs 1.
    struct Open(Range);

    impl Terrain for Open {
        fn neighbors(&self, p: Point, buf: &mut Vec<Point>) {
            for n in p.neighbors_4() {
                if self.0.contains(n) {
                    buf.push(n);
                }
            }
        }

        fn cost(&self, _from: Point, _to: Point) -> f64 {
            1.0
        }
    }

    /// Grid pricing each step at the entered cell's weight.
    struct Weighted(Field<f64>);

    impl Terrain for Weighted {
        fn neighbors(&self, p: Point, buf: &mut Vec<Point>) {
            for n in p.neighbors_4() {
                if self.0.contains(n) {
                    buf.push(n);
                }
            }
        }

        fn cost(&self, _from: Point, to: Point) -> f64 {
            self.0.at(to).unwrap()
        }
    }

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn single_source_manhattan() {
        let rng = Range::new(0, 0, 3, 3);
        let mut search = PathSearch::new(rng);
        let config = SeekConfig::default();
        search
            .seek_map(&Open(rng), &[p(0, 0)], &[], &config, None)
            .unwrap();

        assert_eq!(search.distance_at(p(0, 0)), 0.0);
        assert_eq!(search.distance_at(p(2, 2)), 4.0);
        assert_eq!(search.settled().len(), 9);
        assert_eq!(search.distance_field().at(p(2, 2)), Some(4.0));
    }

    #[test]
    fn multi_source_takes_the_nearest() {
        let rng = Range::new(0, 0, 5, 1);
        let mut search = PathSearch::new(rng);
        let config = SeekConfig::default();
        search
            .seek_map(&Open(rng), &[p(0, 0), p(4, 0)], &[], &config, None)
            .unwrap();

        assert_eq!(search.distance_at(p(1, 0)), 1.0);
        assert_eq!(search.distance_at(p(2, 0)), 2.0);
        assert_eq!(search.distance_at(p(3, 0)), 1.0);
    }

    #[test]
    fn empty_sources_reach_nothing() {
        let rng = Range::new(0, 0, 3, 3);
        let mut search = PathSearch::new(rng);
        let config = SeekConfig::default();
        let settles = search
            .seek_map(&Open(rng), &[], &[], &config, None)
            .unwrap();

        assert!(settles.is_empty());
        assert!(search.distance_at(p(1, 1)).is_infinite());
        assert_eq!(search.predecessor(p(1, 1)), None);
    }

    #[test]
    fn out_of_range_sources_are_ignored() {
        let rng = Range::new(0, 0, 3, 3);
        let mut search = PathSearch::new(rng);
        let config = SeekConfig::default();
        let settles = search
            .seek_map(&Open(rng), &[p(-3, 7)], &[], &config, None)
            .unwrap();

        assert!(settles.is_empty());
        assert!(search.distance_at(p(0, 0)).is_infinite());
    }

    #[test]
    fn weighted_sweep_detours_around_expensive_cells() {
        let weights = Field::from_rows(vec![
            vec![1.0, 999.0, 1.0],
            vec![2.0, 1.0, 2.0],
            vec![1.0, 1.0, 1.0],
        ])
        .unwrap();
        let terrain = Weighted(weights);
        let mut search = PathSearch::new(Range::new(0, 0, 3, 3));
        let config = SeekConfig::default();
        search
            .seek_map(&terrain, &[p(0, 0)], &[], &config, None)
            .unwrap();

        // The cheap route runs under the expensive cell.
        assert_eq!(search.distance_at(p(2, 0)), 6.0);
        assert_eq!(search.predecessor(p(2, 0)), Some(p(2, 1)));
        // The expensive cell itself is still reachable, just dear.
        assert_eq!(search.distance_at(p(1, 0)), 999.0);
    }

    #[test]
    fn equidistant_sources_split_deterministically() {
        let rng = Range::new(0, 0, 5, 1);
        let mut search = PathSearch::new(rng);
        let config = SeekConfig::default();
        search
            .seek_map(&Open(rng), &[p(0, 0), p(4, 0)], &[], &config, None)
            .unwrap();

        // (2, 0) is 2 away from both sources; the first-listed source
        // reaches it first, every run.
        assert_eq!(search.predecessor(p(2, 0)), Some(p(1, 0)));
        assert_eq!(search.predecessor(p(1, 0)), Some(p(0, 0)));
        assert_eq!(search.predecessor(p(0, 0)), None);
    }

    #[test]
    fn settle_order_is_nondecreasing() {
        let weights = Field::from_rows(vec![
            vec![1.0, 4.0, 0.5, 2.0],
            vec![3.0, 1.0, 7.0, 0.5],
            vec![0.5, 2.0, 1.0, 1.0],
        ])
        .unwrap();
        let terrain = Weighted(weights);
        let mut search = PathSearch::new(Range::new(0, 0, 4, 3));
        let config = SeekConfig::default();
        let settles = search
            .seek_map(&terrain, &[p(3, 2)], &[], &config, None)
            .unwrap();

        assert_eq!(settles.len(), 12);
        for w in settles.windows(2) {
            assert!(w[0].distance <= w[1].distance);
        }

        // Distances never go up when stepping back toward the source.
        for ev in search.settled() {
            assert!(ev.distance >= 0.0);
            if let Some(prev) = search.predecessor(ev.pos) {
                assert!(search.distance_at(prev) <= ev.distance);
            }
        }
    }

    #[test]
    fn rerun_is_idempotent() {
        let rng = Range::new(0, 0, 4, 4);
        let mut search = PathSearch::new(rng);
        let config = SeekConfig::default();
        let first = search
            .seek_map(&Open(rng), &[p(1, 1), p(3, 0)], &[], &config, None)
            .unwrap()
            .to_vec();
        let first_field = search.distance_field();

        let second = search
            .seek_map(&Open(rng), &[p(1, 1), p(3, 0)], &[], &config, None)
            .unwrap()
            .to_vec();

        assert_eq!(first, second);
        assert_eq!(first_field.values(), search.distance_field().values());
    }

    #[test]
    fn early_stop_halts_after_the_last_target() {
        let rng = Range::new(0, 0, 5, 5);
        let mut search = PathSearch::new(rng);
        let config = SeekConfig {
            early_stop: true,
            ..SeekConfig::default()
        };
        let settles = search
            .seek_map(&Open(rng), &[p(0, 0)], &[p(1, 1)], &config, None)
            .unwrap();

        assert_eq!(settles.last().map(|s| s.pos), Some(p(1, 1)));
        assert!(settles.len() < 25);
        assert!(search.distance_at(p(4, 4)).is_infinite());
    }

    #[test]
    fn early_stop_without_targets_returns_at_once() {
        let rng = Range::new(0, 0, 5, 5);
        let mut search = PathSearch::new(rng);
        let config = SeekConfig {
            early_stop: true,
            ..SeekConfig::default()
        };
        let settles = search
            .seek_map(&Open(rng), &[p(2, 2)], &[], &config, None)
            .unwrap();

        assert!(settles.is_empty());
        assert_eq!(search.distance_at(p(2, 2)), 0.0);
    }

    #[test]
    fn abort_flag_cancels_the_sweep() {
        let rng = Range::new(0, 0, 10, 10);
        let mut search = PathSearch::new(rng);
        let flag = Arc::new(AtomicBool::new(true));
        let config = SeekConfig {
            abort: Some(flag),
            ..SeekConfig::default()
        };
        let err = search
            .seek_map(&Open(rng), &[p(0, 0)], &[], &config, None)
            .unwrap_err();

        assert!(matches!(err, SeekError::Aborted { settled: 0 }));
    }

    #[test]
    fn set_range_smaller_preserves_capacity() {
        let mut search = PathSearch::new(Range::new(0, 0, 20, 20));
        let original_cap = search.nodes.len(); // 400

        let small = Range::new(0, 0, 5, 5);
        search.set_range(small);
        assert_eq!(search.range(), small);
        assert_eq!(search.nodes.len(), original_cap);
        assert_eq!(search.width, 5);
        assert!(search.generation > 0);
    }

    #[test]
    fn set_range_larger_reallocates() {
        let mut search = PathSearch::new(Range::new(0, 0, 5, 5));
        let old_cap = search.nodes.len(); // 25

        let big = Range::new(0, 0, 20, 20);
        search.set_range(big);
        assert_eq!(search.range(), big);
        assert_eq!(search.nodes.len(), 400);
        assert!(search.nodes.len() > old_cap);
    }

    #[test]
    fn sweep_works_after_range_changes() {
        let mut search = PathSearch::new(Range::new(0, 0, 2, 2));
        let config = SeekConfig::default();
        let rng = Range::new(0, 0, 6, 6);
        search.set_range(rng);
        search
            .seek_map(&Open(rng), &[p(0, 0)], &[], &config, None)
            .unwrap();

        assert_eq!(search.distance_at(p(5, 5)), 10.0);
        assert_eq!(search.settled().len(), 36);
    }
}

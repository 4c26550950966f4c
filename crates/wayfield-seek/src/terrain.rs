use wayfield_core::Point;

/// Graph interface for the search: neighbour enumeration plus edge costs.
pub trait Terrain {
    /// Append every in-range neighbour of `p` to `buf`, which arrives cleared.
    fn neighbors(&self, p: Point, buf: &mut Vec<Point>);

    /// Cost of stepping from `from` into adjacent `to`. Must be finite and
    /// non-negative.
    fn cost(&self, from: Point, to: Point) -> f64;
}

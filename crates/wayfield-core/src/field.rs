//! [`Field`] — an owned rectangular grid of values.
//!
//! A `Field<T>` stores one value per cell in row-major order over flat
//! storage. It is the array type exchanged at the engine boundary: origin
//! and target indicators and traversal weights come in as `Field<f64>`,
//! distance fields and path grids go out as `Field<f64>` / `Field<u32>`.
//!
//! Unlike a display grid there is no shared-buffer slicing here: each field
//! has exactly one owner, and cross-component sharing happens by reference.

use std::fmt;

use crate::geom::{Point, Range};

/// An owned `width × height` grid of `T` values in row-major order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field<T> {
    width: i32,
    height: i32,
    data: Vec<T>,
}

impl<T: Clone> Field<T> {
    /// Create a new field filled with `value`. Negative dimensions are
    /// clamped to zero.
    pub fn new(width: i32, height: i32, value: T) -> Self {
        let w = width.max(0);
        let h = height.max(0);
        Self {
            width: w,
            height: h,
            data: vec![value; (w as usize) * (h as usize)],
        }
    }

    /// Fill every cell with `value`.
    pub fn fill(&mut self, value: T) {
        for v in self.data.iter_mut() {
            *v = value.clone();
        }
    }
}

impl<T> Field<T> {
    /// Create a field by evaluating `f` at every cell in row-major order.
    pub fn from_fn(width: i32, height: i32, mut f: impl FnMut(Point) -> T) -> Self {
        let w = width.max(0);
        let h = height.max(0);
        let bounds = Range::new(0, 0, w, h);
        let data = bounds.iter().map(&mut f).collect();
        Self {
            width: w,
            height: h,
            data,
        }
    }

    /// Build a field from rows of values. Every row must have the same
    /// length; ragged input is rejected.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, RaggedRows> {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.len()) as i32;
        let mut data = Vec::with_capacity((width * height) as usize);
        for (y, row) in rows.into_iter().enumerate() {
            if row.len() as i32 != width {
                return Err(RaggedRows {
                    row: y,
                    expected: width as usize,
                    found: row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// The bounding range, anchored at the origin.
    #[inline]
    pub fn bounds(&self) -> Range {
        Range::new(0, 0, self.width, self.height)
    }

    /// Size as a `Point` (width = x, height = y).
    #[inline]
    pub fn size(&self) -> Point {
        Point::new(self.width, self.height)
    }

    /// Width in cells.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the field has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `p` lies inside the field.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if self.contains(p) {
            Some((p.y as usize) * (self.width as usize) + (p.x as usize))
        } else {
            None
        }
    }

    /// Borrow the value at `p`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, p: Point) -> Option<&T> {
        self.idx(p).map(|i| &self.data[i])
    }

    /// Set the value at `p`. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, p: Point, value: T) {
        if let Some(i) = self.idx(p) {
            self.data[i] = value;
        }
    }

    /// Mutably borrow the value at `p`, or `None` if out of bounds.
    #[inline]
    pub fn get_mut(&mut self, p: Point) -> Option<&mut T> {
        self.idx(p).map(move |i| &mut self.data[i])
    }

    /// Row-major iterator over `(Point, &T)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &T)> {
        self.bounds().iter().zip(self.data.iter())
    }

    /// Count the cells whose value satisfies `pred`.
    pub fn count_where(&self, mut pred: impl FnMut(&T) -> bool) -> usize {
        self.data.iter().filter(|v| pred(v)).count()
    }

    /// Build a new field of the same shape by mapping every cell.
    pub fn map<U>(&self, mut f: impl FnMut(Point, &T) -> U) -> Field<U> {
        Field {
            width: self.width,
            height: self.height,
            data: self.iter().map(|(p, v)| f(p, v)).collect(),
        }
    }

    /// The raw row-major cell values.
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.data
    }
}

impl<T: Copy> Field<T> {
    /// Copy the value at `p`, or `None` if out of bounds.
    #[inline]
    pub fn at(&self, p: Point) -> Option<T> {
        self.idx(p).map(|i| self.data[i])
    }
}

// ---------------------------------------------------------------------------
// RaggedRows
// ---------------------------------------------------------------------------

/// Error returned by [`Field::from_rows`] when row lengths differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaggedRows {
    /// Index of the offending row.
    pub row: usize,
    /// Length of the first row.
    pub expected: usize,
    /// Length of the offending row.
    pub found: usize,
}

impl fmt::Display for RaggedRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ragged rows: row {} has {} cells, expected {}",
            self.row, self.found, self.expected
        )
    }
}

impl std::error::Error for RaggedRows {}

//! Error type for seek runs.

use std::fmt;

use wayfield_core::Point;

/// Errors that can occur when validating inputs or running a search.
#[derive(Debug, Clone)]
pub enum SeekError {
    /// An input grid does not match the shape of the weight grid.
    ShapeMismatch {
        /// Which grid disagreed ("origins" or "targets").
        grid: &'static str,
        expected: Point,
        found: Point,
    },
    /// A weight is negative or otherwise unusable after fill.
    InvalidWeight { pos: Point, value: f64 },
    /// The run was cancelled through [`SeekConfig::abort`].
    ///
    /// [`SeekConfig::abort`]: crate::SeekConfig::abort
    Aborted {
        /// How many cells had settled when the flag was observed.
        settled: usize,
    },
}

impl fmt::Display for SeekError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { grid, expected, found } => {
                write!(
                    f,
                    "{grid} grid is {}x{}, expected {}x{} to match the weights",
                    found.x, found.y, expected.x, expected.y
                )
            }
            Self::InvalidWeight { pos, value } => {
                write!(f, "invalid weight {value} at ({}, {})", pos.x, pos.y)
            }
            Self::Aborted { settled } => {
                write!(f, "seek aborted after {settled} settled cells")
            }
        }
    }
}

impl std::error::Error for SeekError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = SeekError::ShapeMismatch {
            grid: "origins",
            expected: Point::new(4, 3),
            found: Point::new(4, 2),
        };
        assert_eq!(
            err.to_string(),
            "origins grid is 4x2, expected 4x3 to match the weights"
        );

        let err = SeekError::InvalidWeight {
            pos: Point::new(2, 1),
            value: -5.0,
        };
        assert_eq!(err.to_string(), "invalid weight -5 at (2, 1)");

        let err = SeekError::Aborted { settled: 17 };
        assert_eq!(err.to_string(), "seek aborted after 17 settled cells");
    }
}

//! Error types for cluster building and path queries.

use thiserror::Error;

use crate::grid::MovementClass;

/// Result type alias using [`PathError`].
pub type Result<T> = std::result::Result<T, PathError>;

/// Errors surfaced at the library boundary.
///
/// "No path" is not an error: queries return an empty [`crate::search::Path`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A coordinate outside the grid was passed in.
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },

    /// The oracle does not know this movement class.
    #[error("unknown movement class {0}")]
    UnknownMovementClass(MovementClass),

    /// Popped or peeked an empty priority queue.
    #[error("priority queue is empty")]
    EmptyQueue,

    /// The map or the build settings cannot be clustered.
    #[error("invalid map: {0}")]
    InvalidMap(String),

    /// Graph maintenance left the abstract graph inconsistent.
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl PathError {
    pub fn out_of_bounds(cell: crate::grid::CellPos) -> Self {
        PathError::OutOfBounds { x: cell.x, y: cell.y }
    }
}

//! D8 direction table for cross-section construction
//!
//! Flow directions use the power-of-two D8 encoding:
//! ```text
//!   32  64  128
//!   16   0    1
//!    8   4    2
//! ```
//! 1 = E, 2 = SE, 4 = S, 8 = SW, 16 = W, 32 = NW, 64 = N, 128 = NE.
//!
//! Besides the downstream displacement, each direction carries the offsets
//! the cross-section tracer needs: the left-anchor seed, the lateral step
//! operator applied while walking a side outward, the adjacent pair of
//! directions traced as supplementary sections, and (for diagonals) the
//! checkerboard offset at which one extra section is traced.

use tephra_core::{Error, Result};

/// One of the eight D8 flow directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FlowDir {
    East = 1,
    SouthEast = 2,
    South = 4,
    SouthWest = 8,
    West = 16,
    NorthWest = 32,
    North = 64,
    NorthEast = 128,
}

/// Which cell dimension converts a height difference into a section-area
/// increment for a given direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMetric {
    /// Cardinal directions: section runs along a grid axis, use cell width
    Width,
    /// Diagonal directions: section runs corner to corner, use cell diagonal
    Diagonal,
}

impl FlowDir {
    /// All eight directions, in code order.
    pub const ALL: [FlowDir; 8] = [
        FlowDir::East,
        FlowDir::SouthEast,
        FlowDir::South,
        FlowDir::SouthWest,
        FlowDir::West,
        FlowDir::NorthWest,
        FlowDir::North,
        FlowDir::NorthEast,
    ];

    /// Decode a D8 code sampled at (row, col).
    ///
    /// Anything outside the eight valid codes is rejected; a malformed
    /// flow-direction grid must never silently default to some direction.
    pub fn from_code(code: u8, row: usize, col: usize) -> Result<FlowDir> {
        match code {
            1 => Ok(FlowDir::East),
            2 => Ok(FlowDir::SouthEast),
            4 => Ok(FlowDir::South),
            8 => Ok(FlowDir::SouthWest),
            16 => Ok(FlowDir::West),
            32 => Ok(FlowDir::NorthWest),
            64 => Ok(FlowDir::North),
            128 => Ok(FlowDir::NorthEast),
            _ => Err(Error::BadDirectionCode { code, row, col }),
        }
    }

    /// The raw D8 code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// (Δrow, Δcol) to move one cell downstream
    pub fn downstream_delta(self) -> (isize, isize) {
        match self {
            FlowDir::East => (0, 1),
            FlowDir::SouthEast => (1, 1),
            FlowDir::South => (1, 0),
            FlowDir::SouthWest => (1, -1),
            FlowDir::West => (0, -1),
            FlowDir::NorthWest => (-1, -1),
            FlowDir::North => (-1, 0),
            FlowDir::NorthEast => (-1, 1),
        }
    }

    /// Lateral step operator (Δrow, Δcol) for walking a cross-section side
    /// outward by one cell. The left side applies it with sign +1, the right
    /// side with sign −1.
    pub fn lateral_step(self) -> (isize, isize) {
        match self {
            FlowDir::East => (-1, 0),
            FlowDir::SouthEast => (-1, 1),
            FlowDir::South => (0, 1),
            FlowDir::SouthWest => (1, 1),
            FlowDir::West => (1, 0),
            FlowDir::NorthWest => (1, -1),
            FlowDir::North => (0, -1),
            FlowDir::NorthEast => (-1, -1),
        }
    }

    /// Offset from the stream cell to the initial left anchor of a
    /// cross-section. The right anchor is the stream cell itself.
    pub fn left_seed(self) -> (isize, isize) {
        // One lateral step out from the stream cell.
        self.lateral_step()
    }

    /// Cell dimension selector for area increments
    pub fn cell_metric(self) -> CellMetric {
        if self.is_diagonal() {
            CellMetric::Diagonal
        } else {
            CellMetric::Width
        }
    }

    /// Whether this is one of the four diagonal directions
    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            FlowDir::SouthEast | FlowDir::SouthWest | FlowDir::NorthWest | FlowDir::NorthEast
        )
    }

    /// The two adjacent octant directions traced as supplementary
    /// cross-sections at the same stream cell. Cardinals pair with their
    /// neighbouring diagonals and vice versa.
    pub fn supplementary_pair(self) -> (FlowDir, FlowDir) {
        match self {
            FlowDir::East => (FlowDir::NorthEast, FlowDir::SouthEast),
            FlowDir::SouthEast => (FlowDir::East, FlowDir::South),
            FlowDir::South => (FlowDir::SouthEast, FlowDir::SouthWest),
            FlowDir::SouthWest => (FlowDir::South, FlowDir::West),
            FlowDir::West => (FlowDir::SouthWest, FlowDir::NorthWest),
            FlowDir::NorthWest => (FlowDir::West, FlowDir::North),
            FlowDir::North => (FlowDir::NorthWest, FlowDir::NorthEast),
            FlowDir::NorthEast => (FlowDir::North, FlowDir::East),
        }
    }

    /// Checkerboard correction offset for diagonal directions.
    ///
    /// Diagonal flow paths touch the grid like a checkerboard; one extra
    /// section is traced at this single-axis offset so the skipped
    /// off-colour cells are sampled too. `None` for cardinal directions.
    pub fn checkerboard_offset(self) -> Option<(isize, isize)> {
        match self {
            FlowDir::SouthEast => Some((0, 1)),
            FlowDir::SouthWest => Some((1, 0)),
            FlowDir::NorthWest => Some((0, -1)),
            FlowDir::NorthEast => Some((-1, 0)),
            _ => None,
        }
    }
}

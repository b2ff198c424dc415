//! Integer hex-grid coordinates
//!
//! Two coordinate spaces are in play:
//! - *storage* indices address the backing matrix directly
//! - *relative* indices are offsets from the fixed board center
//!
//! Converting between them is a single offset add/subtract.

use std::ops::{Add, Sub};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{GRID_COLUMNS, GRID_ROWS};

/// A `(column, row)` cell address, in storage or center-relative space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct GridIndex {
    pub col: i32,
    pub row: i32,
}

/// The storage cell treated as the board center, i.e. relative `(0, 0)`.
pub const CENTER_OFFSET: GridIndex = GridIndex::new(3, 5);

impl GridIndex {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Convert a relative index to its storage index.
    #[inline]
    pub fn to_storage(self) -> Self {
        self + CENTER_OFFSET
    }

    /// Convert a storage index back to center-relative form.
    #[inline]
    pub fn to_relative(self) -> Self {
        self - CENTER_OFFSET
    }

    /// Whether a storage index addresses a cell inside the backing matrix.
    pub fn in_bounds(self) -> bool {
        (0..=GRID_COLUMNS).contains(&self.col) && (0..=GRID_ROWS).contains(&self.row)
    }
}

impl Add for GridIndex {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.col + rhs.col, self.row + rhs.row)
    }
}

impl Sub for GridIndex {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.col - rhs.col, self.row - rhs.row)
    }
}

/// Screen-space offset of a relative cell from the board center.
///
/// Odd rows are shifted half a cell to account for the hexagonal stagger;
/// rows are spaced by `√3/2` of the cell width.
pub fn cell_to_pixel(relative: GridIndex, cell_width: f32) -> Vec2 {
    let col = relative.col as f32 - (relative.row % 2).abs() as f32 / 2.0;
    Vec2::new(
        col * cell_width,
        relative.row as f32 * cell_width * 3.0_f32.sqrt() / 2.0,
    )
}

/// The six neighbor directions of a hex cell.
///
/// Discriminants follow the arrow sprite convention: one step up in the
/// value rotates the arrow 60 degrees clockwise starting from BottomLeft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexDirection {
    BottomLeft = 0,
    Left = 1,
    TopLeft = 2,
    TopRight = 3,
    Right = 4,
    BottomRight = 5,
}

impl HexDirection {
    /// Stable order used when scanning a cell's neighbors.
    pub const SEARCH_ORDER: [HexDirection; 6] = [
        HexDirection::Left,
        HexDirection::Right,
        HexDirection::TopLeft,
        HexDirection::TopRight,
        HexDirection::BottomLeft,
        HexDirection::BottomRight,
    ];

    /// Relative offset to the neighbor in this direction.
    ///
    /// The vertical steps shift left or right depending on the parity of the
    /// row the step starts from (hexagonal row stagger).
    pub fn offset(self, row: i32) -> GridIndex {
        let tilt = ((row + 2) % 2) * -1;
        match self {
            HexDirection::Left => GridIndex::new(-1, 0),
            HexDirection::Right => GridIndex::new(1, 0),
            HexDirection::TopLeft => GridIndex::new(tilt, 1),
            HexDirection::TopRight => GridIndex::new(1 + tilt, 1),
            HexDirection::BottomLeft => GridIndex::new(tilt, -1),
            HexDirection::BottomRight => GridIndex::new(1 + tilt, -1),
        }
    }

    /// Rotation (radians) of an arrow sprite pointing at this neighbor.
    pub fn angle(self) -> f32 {
        -(self as i32 as f32) * std::f32::consts::FRAC_PI_3
    }
}

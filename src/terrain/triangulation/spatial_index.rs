use bevy::math::DVec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::types::Triangle;
use crate::terrain::math::IntRect2;

/// Cells per side of every island's grid.
pub const GRID_RESOLUTION: usize = 8;

/// Fixed 8×8 uniform grid over an island's bounds.
///
/// Triangles are stored in every cell their padded bounds overlap, so a query
/// only has to look at the one cell containing the point. Indices inside a
/// cell stay in ascending order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TriangleGridIndex {
    bounds: IntRect2,
    cells: Vec<SmallVec<[u32; 8]>>,
}

impl TriangleGridIndex {
    pub fn build(bounds: IntRect2, triangles: &[Triangle]) -> Self {
        let mut index = Self {
            bounds,
            cells: vec![SmallVec::new(); GRID_RESOLUTION * GRID_RESOLUTION],
        };
        for (i, triangle) in triangles.iter().enumerate() {
            let (min_col, min_row) = index.cell_coords(triangle.bounds.left as f64, triangle.bounds.top as f64);
            let (max_col, max_row) =
                index.cell_coords(triangle.bounds.right as f64, triangle.bounds.bottom as f64);
            for row in min_row..=max_row {
                for col in min_col..=max_col {
                    index.cells[row * GRID_RESOLUTION + col].push(i as u32);
                }
            }
        }
        index
    }

    /// Clamped cell coordinates for a point; callers reject out-of-bounds
    /// points against the island bounds first.
    fn cell_coords(&self, x: f64, y: f64) -> (usize, usize) {
        let to_cell = |value: f64, min: i32, extent: i32| -> usize {
            if extent <= 0 {
                return 0;
            }
            let t = (value - min as f64) / extent as f64;
            ((t * GRID_RESOLUTION as f64).floor().max(0.0) as usize).min(GRID_RESOLUTION - 1)
        };
        (
            to_cell(x, self.bounds.left, self.bounds.width()),
            to_cell(y, self.bounds.top, self.bounds.height()),
        )
    }

    /// Triangle indices whose bounds overlap the cell containing `p`.
    pub fn candidates(&self, p: DVec2) -> &[u32] {
        let (col, row) = self.cell_coords(p.x, p.y);
        &self.cells[row * GRID_RESOLUTION + col]
    }

    pub fn bounds(&self) -> IntRect2 {
        self.bounds
    }
}

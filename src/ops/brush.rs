// ============================================================================
// BRUSH RASTERIZER: center + radius + shape → footprint cells
// ============================================================================

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::canvas::PixelGrid;
use crate::io::MAX_GRID_DIM;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushShape {
    #[default]
    Square,
    Circle,
    Cross,
}

impl BrushShape {
    fn includes(self, dx: i32, dy: i32, radius: u32) -> bool {
        match self {
            BrushShape::Square => true,
            BrushShape::Circle => {
                let r = radius as f64 - 0.5;
                let (dx, dy) = (dx as f64, dy as f64);
                dx * dx + dy * dy <= r * r
            }
            BrushShape::Cross => dx == 0 || dy == 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brush {
    /// Radius in cells, `1..=MAX_GRID_DIM`; 1 paints a single cell.
    pub size: u32,
    pub shape: BrushShape,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            size: 1,
            shape: BrushShape::Square,
        }
    }
}

impl Brush {
    pub fn new(size: u32, shape: BrushShape) -> Self {
        Self {
            size: size.clamp(1, MAX_GRID_DIM),
            shape,
        }
    }

    pub fn footprint(&self, cx: i32, cy: i32) -> Vec<(i32, i32)> {
        rasterize(cx, cy, self.size, self.shape)
    }
}

/// Enumerate the cells covered by a brush stamp at `(cx, cy)`.
///
/// Offsets range over `-(r-1)..=(r-1)` on both axes. The result is not
/// clipped to any grid, but cells that would fall outside the i32 range are
/// dropped. The radius is clamped to `1..=MAX_GRID_DIM`.
pub fn rasterize(cx: i32, cy: i32, radius: u32, shape: BrushShape) -> Vec<(i32, i32)> {
    let radius = radius.clamp(1, MAX_GRID_DIM);
    let reach = radius as i32 - 1;
    let side = (2 * reach + 1) as usize;
    let mut cells = Vec::with_capacity(side * side);
    for dy in -reach..=reach {
        let Some(y) = cy.checked_add(dy) else { continue };
        for dx in -reach..=reach {
            let Some(x) = cx.checked_add(dx) else { continue };
            if shape.includes(dx, dy, radius) {
                cells.push((x, y));
            }
        }
    }
    cells
}

/// Stamp the brush onto a grid. Cells outside the grid are skipped.
/// Returns the number of cells written.
pub fn stamp(grid: &mut PixelGrid, cx: i32, cy: i32, brush: &Brush, color: Rgb<u8>) -> usize {
    brush
        .footprint(cx, cy)
        .into_iter()
        .filter(|&(x, y)| grid.set(x, y, Some(color)))
        .count()
}

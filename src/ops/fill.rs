// ============================================================================
// FLOOD FILL: 4-connected, exact-match region growth
// ============================================================================

use image::Rgb;

use crate::canvas::PixelGrid;

/// Recolor the 4-connected region around `(x, y)` whose cells equal the seed
/// cell's original value. Returns the number of recolored cells.
///
/// Seeds outside the grid and seeds already equal to `color` are no-ops. The
/// stack only grows from cells that were just recolored, so every cell is
/// recolored at most once.
pub fn flood_fill(grid: &mut PixelGrid, x: i32, y: i32, color: Rgb<u8>) -> usize {
    if !grid.in_bounds(x, y) {
        return 0;
    }
    let source = grid.get(x, y);
    let target = Some(color);
    if source == target {
        return 0;
    }

    let mut filled = 0;
    let mut stack: Vec<(i32, i32)> = Vec::with_capacity(256);
    stack.push((x, y));

    while let Some((cx, cy)) = stack.pop() {
        if !grid.in_bounds(cx, cy) || grid.get(cx, cy) != source {
            continue;
        }
        grid.set(cx, cy, target);
        filled += 1;
        stack.extend([(cx + 1, cy), (cx - 1, cy), (cx, cy + 1), (cx, cy - 1)]);
    }

    filled
}

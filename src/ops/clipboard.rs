// ============================================================================
// SELECTION & CLIPBOARD: rectangular capture / hole-preserving paste
// ============================================================================

use crate::canvas::{Pixel, PixelGrid};

/// Rectangle given by two opposite corners in grid coordinates. The first
/// corner is fixed when the selection begins; the second follows the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub anchor: (i32, i32),
    pub cursor: (i32, i32),
}

impl Selection {
    /// Degenerate single-cell selection at `(x, y)`.
    pub fn begin(x: i32, y: i32) -> Self {
        Self {
            anchor: (x, y),
            cursor: (x, y),
        }
    }

    pub fn update(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
    }

    /// `(min_x, min_y, max_x, max_y)`, inclusive.
    pub fn normalized(&self) -> (i32, i32, i32, i32) {
        (
            self.anchor.0.min(self.cursor.0),
            self.anchor.1.min(self.cursor.1),
            self.anchor.0.max(self.cursor.0),
            self.anchor.1.max(self.cursor.1),
        )
    }

    /// Width and height in cells. Computed in i64 so corners at the i32
    /// extremes still give the true extent.
    pub fn size(&self) -> (u64, u64) {
        let (x0, y0, x1, y1) = self.normalized();
        (
            (x1 as i64 - x0 as i64) as u64 + 1,
            (y1 as i64 - y0 as i64) as u64 + 1,
        )
    }
}

/// Rectangular block of pixels captured from one layer. Owns its storage.
///
/// Only the part of the selection that overlapped the source grid is stored;
/// every other cell of the logical `width x height` block is empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clipboard {
    width: u64,
    height: u64,
    /// Top-left of the stored block, relative to the selection origin.
    offset: (u64, u64),
    block_width: usize,
    block_height: usize,
    pixels: Vec<Pixel>,
}

impl Clipboard {
    /// Copy the selected rectangle out of `grid`. Cells past the grid edge
    /// are captured as empty without being visited.
    pub fn copy(grid: &PixelGrid, selection: &Selection) -> Self {
        let (x0, y0, x1, y1) = selection.normalized();
        let (width, height) = selection.size();

        // Overlap with the grid, in grid coordinates (inclusive).
        let ox0 = (x0 as i64).max(0);
        let oy0 = (y0 as i64).max(0);
        let ox1 = (x1 as i64).min(grid.width() as i64 - 1);
        let oy1 = (y1 as i64).min(grid.height() as i64 - 1);

        if ox0 > ox1 || oy0 > oy1 {
            return Self {
                width,
                height,
                offset: (0, 0),
                block_width: 0,
                block_height: 0,
                pixels: Vec::new(),
            };
        }

        let block_width = (ox1 - ox0 + 1) as usize;
        let block_height = (oy1 - oy0 + 1) as usize;
        let mut pixels = Vec::with_capacity(block_width * block_height);
        for y in oy0..=oy1 {
            for x in ox0..=ox1 {
                pixels.push(grid.get(x as i32, y as i32));
            }
        }
        Self {
            width,
            height,
            offset: ((ox0 - x0 as i64) as u64, (oy0 - y0 as i64) as u64),
            block_width,
            block_height,
            pixels,
        }
    }

    pub fn width(&self) -> u64 {
        self.width
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn get(&self, x: u64, y: u64) -> Pixel {
        let (Some(bx), Some(by)) = (x.checked_sub(self.offset.0), y.checked_sub(self.offset.1))
        else {
            return None;
        };
        if bx >= self.block_width as u64 || by >= self.block_height as u64 {
            return None;
        }
        self.pixels[by as usize * self.block_width + bx as usize]
    }

    /// Write the block with its top-left at `(dest_x, dest_y)`. Empty
    /// clipboard cells and off-grid destinations are skipped, as are cells
    /// whose destination does not fit in i32. Returns the number of cells
    /// written.
    pub fn paste(&self, grid: &mut PixelGrid, dest_x: i32, dest_y: i32) -> usize {
        if self.block_width == 0 {
            return 0;
        }
        let base_x = dest_x as i64 + self.offset.0 as i64;
        let base_y = dest_y as i64 + self.offset.1 as i64;
        let mut written = 0;
        for (i, pixel) in self.pixels.iter().enumerate() {
            let Some(color) = pixel else { continue };
            let x = base_x + (i % self.block_width) as i64;
            let y = base_y + (i / self.block_width) as i64;
            let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
                continue;
            };
            if grid.set(x, y, Some(*color)) {
                written += 1;
            }
        }
        written
    }
}

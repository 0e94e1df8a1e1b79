// ============================================================================
// GRADIENT TOOL: two-click linear color ramp painted along a line
// ============================================================================

use image::Rgb;

use crate::canvas::PixelGrid;
use crate::ops::brush::{self, Brush};

/// Two-phase state of the gradient tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GradientStage {
    #[default]
    AwaitingStart,
    AwaitingEnd { start: (i32, i32) },
}

impl GradientStage {
    /// Feed one click. Returns the `(start, end)` pair when the click
    /// completes a gradient; the stage is reset to `AwaitingStart` either way
    /// after a second click.
    pub fn click(&mut self, x: i32, y: i32) -> Option<((i32, i32), (i32, i32))> {
        match *self {
            GradientStage::AwaitingStart => {
                *self = GradientStage::AwaitingEnd { start: (x, y) };
                None
            }
            GradientStage::AwaitingEnd { start } => {
                *self = GradientStage::AwaitingStart;
                Some((start, (x, y)))
            }
        }
    }

    /// Drop a pending start point. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        let pending = matches!(self, GradientStage::AwaitingEnd { .. });
        *self = GradientStage::AwaitingStart;
        pending
    }
}

#[inline]
fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t) as u8
}

/// Parametric line from `start` to `end` with `floor(distance) + 1` evenly
/// spaced steps. Step `i` sits at `t = i / (steps - 1)`.
#[derive(Clone, Copy, Debug)]
struct Ramp {
    sx: f64,
    sy: f64,
    dx: f64,
    dy: f64,
    steps: u64,
    denom: f64,
    colors: [Rgb<u8>; 2],
}

impl Ramp {
    fn new(start: (i32, i32), end: (i32, i32), colors: [Rgb<u8>; 2]) -> Self {
        let (sx, sy) = (start.0 as f64, start.1 as f64);
        let (dx, dy) = (end.0 as f64 - sx, end.1 as f64 - sy);
        let steps = if start == end {
            0
        } else {
            (dx * dx + dy * dy).sqrt().floor() as u64 + 1
        };
        Self {
            sx,
            sy,
            dx,
            dy,
            steps,
            denom: steps.saturating_sub(1).max(1) as f64,
            colors,
        }
    }

    fn sample(&self, i: u64) -> ((i32, i32), Rgb<u8>) {
        let t = i as f64 / self.denom;
        // Rounded positions stay between the two i32 endpoints.
        let x = (self.sx + self.dx * t).round() as i32;
        let y = (self.sy + self.dy * t).round() as i32;
        let [from, to] = self.colors;
        let color = Rgb([
            lerp_channel(from[0], to[0], t),
            lerp_channel(from[1], to[1], t),
            lerp_channel(from[2], to[2], t),
        ]);
        ((x, y), color)
    }

    /// Step indices whose position on one axis can round into `0..len`.
    /// Widened by one cell on each side so rounding never drops a sample.
    fn axis_window(&self, origin: f64, delta: f64, len: u32) -> Option<(u64, u64)> {
        let last = self.steps.checked_sub(1)?;
        let (lo, hi) = (-1.0, len as f64);
        if delta == 0.0 {
            return (lo..=hi).contains(&origin).then_some((0, last));
        }
        let a = (lo - origin) / delta * self.denom;
        let b = (hi - origin) / delta * self.denom;
        let (first, through) = (a.min(b).floor(), a.max(b).ceil());
        if through < 0.0 || first > last as f64 {
            return None;
        }
        Some((first.max(0.0) as u64, (through as u64).min(last)))
    }

    /// Step indices that can land on a `width x height` grid.
    fn grid_window(&self, width: u32, height: u32) -> Option<(u64, u64)> {
        let (x0, x1) = self.axis_window(self.sx, self.dx, width)?;
        let (y0, y1) = self.axis_window(self.sy, self.dy, height)?;
        let (first, last) = (x0.max(y0), x1.min(y1));
        (first <= last).then_some((first, last))
    }
}

/// Paint the ramp onto `grid` with a size-1 brush. Only the steps whose
/// position can reach the grid are visited. Returns the number of in-bounds
/// cells written.
pub fn apply_gradient(
    grid: &mut PixelGrid,
    start: (i32, i32),
    end: (i32, i32),
    colors: [Rgb<u8>; 2],
) -> usize {
    let ramp = Ramp::new(start, end, colors);
    let Some((first, last)) = ramp.grid_window(grid.width(), grid.height()) else {
        return 0;
    };
    let tip = Brush::default();
    (first..=last)
        .map(|i| {
            let ((x, y), color) = ramp.sample(i);
            brush::stamp(grid, x, y, &tip, color)
        })
        .sum()
}

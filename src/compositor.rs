// ============================================================================
// COMPOSITOR: flatten visible layers into RGBA buffers
// ============================================================================

use image::{Rgb, Rgba, RgbaImage};
use rayon::prelude::*;

use crate::canvas::{CanvasState, Layer};
use crate::components::animation::Animation;

/// Blend one layer pixel over the accumulator.
///
/// A fully transparent destination is simply overwritten with
/// `(r, g, b, opacity)`. Otherwise each color channel is
/// `dst * (1 - a) + src * a` with `a = opacity / 255`, truncated toward
/// zero, and the alpha is `min(255, dst_alpha + opacity)`.
#[inline]
pub fn blend_over(dst: Rgba<u8>, src: Rgb<u8>, opacity: u8) -> Rgba<u8> {
    if dst[3] == 0 {
        return Rgba([src[0], src[1], src[2], opacity]);
    }
    let alpha = opacity as f32 / 255.0;
    let mix = |d: u8, s: u8| (d as f32 * (1.0 - alpha) + s as f32 * alpha) as u8;
    Rgba([
        mix(dst[0], src[0]),
        mix(dst[1], src[1]),
        mix(dst[2], src[2]),
        dst[3].saturating_add(opacity),
    ])
}

/// Flatten `layers` bottom to top. Hidden layers and empty cells are skipped.
/// Starts from a fully transparent buffer.
pub fn composite_layers(layers: &[Layer], width: u32, height: u32) -> RgbaImage {
    let mut out = RgbaImage::new(width, height);
    for layer in layers.iter().filter(|l| l.visible) {
        for (i, cell) in layer.pixels.cells().iter().enumerate() {
            let Some(color) = cell else { continue };
            let x = i as u32 % width;
            let y = i as u32 / width;
            let dst = *out.get_pixel(x, y);
            out.put_pixel(x, y, blend_over(dst, *color, layer.opacity));
        }
    }
    out
}

/// Composite of the live canvas.
pub fn composite_canvas(state: &CanvasState) -> RgbaImage {
    composite_layers(&state.layers, state.width, state.height)
}

/// One composite per animation frame, in order, paired with the frame's
/// duration in milliseconds. Frames are flattened in parallel.
pub fn composite_frames(animation: &Animation, width: u32, height: u32) -> Vec<(RgbaImage, u32)> {
    animation
        .frames()
        .par_iter()
        .map(|frame| (composite_layers(&frame.layers, width, height), frame.duration))
        .collect()
}

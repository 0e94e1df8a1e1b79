use image::Rgb;

use crate::canvas::Layer;

/// Color at `(x, y)` of the top-most visible layer that has a pixel there.
pub fn pick_color(layers: &[Layer], x: i32, y: i32) -> Option<Rgb<u8>> {
    layers
        .iter()
        .rev()
        .filter(|l| l.visible)
        .find_map(|l| l.pixels.get(x, y))
}

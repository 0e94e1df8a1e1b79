pub mod brush;
pub mod clipboard;
pub mod eyedropper;
pub mod fill;
pub mod gradient;

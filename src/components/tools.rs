use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::canvas::CanvasState;
use crate::ops::brush::{self, Brush, BrushShape};
use crate::ops::clipboard::Selection;
use crate::ops::eyedropper;
use crate::ops::fill;
use crate::ops::gradient::{self, GradientStage};

/// Tool identifiers as they arrive from the input layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Paint,
    Fill,
    Eyedropper,
    Gradient,
    Select,
}

/// Active tool. The gradient variant carries its own two-click stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Paint,
    Fill,
    Eyedropper,
    Gradient(GradientStage),
    Select,
}

impl Tool {
    pub fn kind(&self) -> ToolKind {
        match self {
            Tool::Paint => ToolKind::Paint,
            Tool::Fill => ToolKind::Fill,
            Tool::Eyedropper => ToolKind::Eyedropper,
            Tool::Gradient(_) => ToolKind::Gradient,
            Tool::Select => ToolKind::Select,
        }
    }
}

impl From<ToolKind> for Tool {
    fn from(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Paint => Tool::Paint,
            ToolKind::Fill => Tool::Fill,
            ToolKind::Eyedropper => Tool::Eyedropper,
            ToolKind::Gradient => Tool::Gradient(GradientStage::AwaitingStart),
            ToolKind::Select => Tool::Select,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ToolProperties {
    pub color: Rgb<u8>,
    pub brush: Brush,
    /// Start and end colors of the gradient ramp.
    pub gradient_colors: [Rgb<u8>; 2],
}

impl Default for ToolProperties {
    fn default() -> Self {
        Self {
            color: Rgb([0, 0, 0]),
            brush: Brush::default(),
            gradient_colors: [Rgb([0, 0, 0]), Rgb([255, 255, 255])],
        }
    }
}

/// Tracks one pointer-down..pointer-up paint stroke so it commits once.
#[derive(Default)]
pub struct StrokeTracker {
    pub is_active: bool,
    /// Cells written so far in this stroke.
    pub cells_written: usize,
}

impl StrokeTracker {
    pub fn start(&mut self) {
        self.is_active = true;
        self.cells_written = 0;
    }

    /// End the stroke. Returns true when it changed anything.
    pub fn finish(&mut self) -> bool {
        let changed = self.is_active && self.cells_written > 0;
        self.cancel();
        changed
    }

    pub fn cancel(&mut self) {
        self.is_active = false;
        self.cells_written = 0;
    }
}

// ============================================================================
// TOOL STATE: pointer events → canvas edits
// ============================================================================

/// Current tool, its settings, and in-flight interaction state.
///
/// Pointer handlers return `Some(description)` when a discrete edit has
/// completed and should be committed to history.
#[derive(Default)]
pub struct ToolState {
    pub tool: Tool,
    pub properties: ToolProperties,
    pub selection: Option<Selection>,
    stroke: StrokeTracker,
    selecting: bool,
}

impl ToolState {
    /// Switch tools. Any pending gradient start or open stroke is dropped.
    pub fn change_tool(&mut self, kind: ToolKind) {
        self.cancel();
        self.tool = Tool::from(kind);
    }

    /// Abort in-flight interaction. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        let mut pending = self.stroke.is_active || self.selecting;
        if let Tool::Gradient(stage) = &mut self.tool {
            pending |= stage.cancel();
        }
        self.stroke.cancel();
        self.selecting = false;
        pending
    }

    pub fn set_brush(&mut self, size: u32, shape: BrushShape) {
        self.properties.brush = Brush::new(size, shape);
    }

    pub fn pointer_down(&mut self, canvas: &mut CanvasState, x: i32, y: i32) -> Option<String> {
        let color = self.properties.color;
        match &mut self.tool {
            Tool::Paint => {
                self.stroke.start();
                self.stroke.cells_written +=
                    brush::stamp(&mut canvas.active_layer_mut().pixels, x, y, &self.properties.brush, color);
                None
            }
            Tool::Fill => {
                let filled = fill::flood_fill(&mut canvas.active_layer_mut().pixels, x, y, color);
                (filled > 0).then(|| "Flood Fill".to_string())
            }
            Tool::Eyedropper => {
                if let Some(picked) = eyedropper::pick_color(&canvas.layers, x, y) {
                    self.properties.color = picked;
                }
                None
            }
            Tool::Gradient(stage) => {
                let (start, end) = stage.click(x, y)?;
                let written = gradient::apply_gradient(
                    &mut canvas.active_layer_mut().pixels,
                    start,
                    end,
                    self.properties.gradient_colors,
                );
                (written > 0).then(|| "Gradient".to_string())
            }
            Tool::Select => {
                self.selection = Some(Selection::begin(x, y));
                self.selecting = true;
                None
            }
        }
    }

    pub fn pointer_drag(&mut self, canvas: &mut CanvasState, x: i32, y: i32) {
        match self.tool {
            Tool::Paint if self.stroke.is_active => {
                self.stroke.cells_written += brush::stamp(
                    &mut canvas.active_layer_mut().pixels,
                    x,
                    y,
                    &self.properties.brush,
                    self.properties.color,
                );
            }
            Tool::Select if self.selecting => {
                if let Some(selection) = &mut self.selection {
                    selection.update(x, y);
                }
            }
            _ => {}
        }
    }

    pub fn pointer_up(&mut self) -> Option<String> {
        self.selecting = false;
        self.stroke.finish().then(|| "Brush Stroke".to_string())
    }
}

use crate::canvas::{CanvasState, Layer};

/// Default frame duration in milliseconds.
pub const DEFAULT_FRAME_MS: u32 = 100;

/// A captured layer stack plus how long it stays on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationFrame {
    pub layers: Vec<Layer>,
    /// Milliseconds, always > 0.
    pub duration: u32,
}

impl AnimationFrame {
    /// Deep-copy `layers` into a new frame. A zero duration becomes 1 ms.
    pub fn capture(layers: &[Layer], duration: u32) -> Self {
        Self {
            layers: layers.to_vec(),
            duration: duration.max(1),
        }
    }
}

// ============================================================================
// ANIMATION SEQUENCER: frame list, play cursor, tick accumulator
// ============================================================================

/// Ordered frames with a play cursor. Invariant: `frames` is never empty and
/// `current_frame < frames.len()`.
#[derive(Clone, Debug)]
pub struct Animation {
    frames: Vec<AnimationFrame>,
    current_frame: usize,
    playing: bool,
    accumulator_ms: u64,
}

impl Animation {
    /// Start with a single frame captured from `canvas`.
    pub fn new(canvas: &CanvasState, duration: u32) -> Self {
        Self {
            frames: vec![AnimationFrame::capture(&canvas.layers, duration)],
            current_frame: 0,
            playing: false,
            accumulator_ms: 0,
        }
    }

    /// Rebuild from loaded frames. Returns `None` if `frames` is empty or
    /// `current_frame` is out of range.
    pub fn from_frames(frames: Vec<AnimationFrame>, current_frame: usize) -> Option<Self> {
        if current_frame >= frames.len() {
            return None;
        }
        Some(Self {
            frames,
            current_frame,
            playing: false,
            accumulator_ms: 0,
        })
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn toggle_playback(&mut self) -> bool {
        self.playing = !self.playing;
        self.accumulator_ms = 0;
        self.playing
    }

    /// Advance playback by `elapsed_ms`. When the current frame's duration is
    /// reached the cursor moves on (wrapping) and the canvas receives a copy
    /// of the new frame's layers. Returns whether the frame changed.
    ///
    /// Ignored while paused and for single-frame animations.
    pub fn tick(&mut self, elapsed_ms: u64, canvas: &mut CanvasState) -> bool {
        if !self.playing || self.frames.len() <= 1 {
            return false;
        }
        self.accumulator_ms += elapsed_ms;
        if self.accumulator_ms < self.frames[self.current_frame].duration as u64 {
            return false;
        }
        self.accumulator_ms = 0;
        self.current_frame = (self.current_frame + 1) % self.frames.len();
        self.load_current_into(canvas);
        true
    }

    fn load_current_into(&self, canvas: &mut CanvasState) {
        let layers = self.frames[self.current_frame].layers.clone();
        canvas.replace_layers(layers, canvas.active_layer_index);
    }

    /// Append a frame captured from the live canvas and make it current.
    pub fn add_frame(&mut self, canvas: &CanvasState, duration: u32) -> usize {
        self.frames
            .push(AnimationFrame::capture(&canvas.layers, duration));
        self.current_frame = self.frames.len() - 1;
        self.current_frame
    }

    /// Overwrite the current frame's layers with the live canvas.
    pub fn store_frame(&mut self, canvas: &CanvasState) {
        self.frames[self.current_frame].layers = canvas.layers.clone();
    }

    /// Remove a frame; the last remaining frame can't be deleted.
    pub fn delete_frame(&mut self, index: usize) -> bool {
        if self.frames.len() <= 1 || index >= self.frames.len() {
            return false;
        }
        self.frames.remove(index);
        if self.current_frame > index || self.current_frame >= self.frames.len() {
            self.current_frame = self.current_frame.saturating_sub(1);
        }
        true
    }

    /// Jump to a frame and load its layers into the canvas.
    pub fn go_to_frame(&mut self, index: usize, canvas: &mut CanvasState) -> bool {
        if index >= self.frames.len() {
            return false;
        }
        self.current_frame = index;
        self.accumulator_ms = 0;
        self.load_current_into(canvas);
        true
    }

    pub fn set_frame_duration(&mut self, index: usize, duration: u32) -> bool {
        match self.frames.get_mut(index) {
            Some(frame) if duration > 0 => {
                frame.duration = duration;
                true
            }
            _ => false,
        }
    }
}

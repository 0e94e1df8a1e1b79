use std::collections::VecDeque;

use crate::canvas::{CanvasState, Layer};

/// Default number of history entries kept.
pub const DEFAULT_MAX_HISTORY: usize = 50;

// ============================================================================
// CANVAS SNAPSHOT: deep copy of the layer stack + active layer
// ============================================================================

/// Full, independent copy of the layer stack and the active-layer index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanvasSnapshot {
    pub layers: Vec<Layer>,
    pub active_layer_index: usize,
}

impl CanvasSnapshot {
    pub fn capture(state: &CanvasState) -> Self {
        Self {
            layers: state.layers.clone(),
            active_layer_index: state.active_layer_index,
        }
    }

    /// Copy the snapshot back into `state`. The snapshot itself is untouched,
    /// so later edits never alias history storage.
    pub fn restore_into(&self, state: &mut CanvasState) {
        state.replace_layers(self.layers.clone(), self.active_layer_index);
    }
}

/// One committed state.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub description: String,
    pub snapshot: CanvasSnapshot,
}

// ============================================================================
// HISTORY MANAGER: bounded snapshot list with a cursor
// ============================================================================

/// Linear undo/redo history. `entries[cursor]` always mirrors the live
/// canvas after the last commit/undo/redo.
pub struct HistoryManager {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    max_history_size: usize,
}

impl HistoryManager {
    /// Start a history whose first entry is the current canvas.
    pub fn new(max_history_size: usize, canvas: &CanvasState) -> Self {
        let mut history = Self {
            entries: VecDeque::with_capacity(max_history_size.max(1)),
            cursor: 0,
            max_history_size: max_history_size.max(1),
        };
        history.reset(canvas);
        history
    }

    /// Drop every entry and start over from `canvas`.
    pub fn reset(&mut self, canvas: &CanvasState) {
        self.entries.clear();
        self.entries.push_back(HistoryEntry {
            description: "Initial State".to_string(),
            snapshot: CanvasSnapshot::capture(canvas),
        });
        self.cursor = 0;
    }

    /// Record the canvas after a completed edit. Any redo branch is discarded
    /// and the oldest entry is evicted once capacity is exceeded.
    pub fn commit(&mut self, canvas: &CanvasState, description: impl Into<String>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(HistoryEntry {
            description: description.into(),
            snapshot: CanvasSnapshot::capture(canvas),
        });
        while self.entries.len() > self.max_history_size {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one entry. Returns the description of the undone edit, or
    /// `None` when already at the oldest entry.
    pub fn undo(&mut self, canvas: &mut CanvasState) -> Option<String> {
        if self.cursor == 0 {
            return None;
        }
        let undone = self.entries[self.cursor].description.clone();
        self.cursor -= 1;
        self.entries[self.cursor].snapshot.restore_into(canvas);
        Some(undone)
    }

    /// Step forward one entry. Returns the description of the redone edit.
    pub fn redo(&mut self, canvas: &mut CanvasState) -> Option<String> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        let entry = &self.entries[self.cursor];
        entry.snapshot.restore_into(canvas);
        Some(entry.description.clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.can_undo()
            .then(|| self.entries[self.cursor].description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.entries
            .get(self.cursor + 1)
            .map(|e| e.description.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn undo_count(&self) -> usize {
        self.cursor
    }

    pub fn redo_count(&self) -> usize {
        self.entries.len() - self.cursor - 1
    }
}

use std::path::{Path, PathBuf};

use image::Rgb;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canvas::CanvasState;
use crate::components::animation::Animation;
use crate::components::history::HistoryManager;
use crate::components::tools::{ToolKind, ToolState};
use crate::compositor;
use crate::io::{self, LoadedProject, ProjectIoError};
use crate::ops::brush::BrushShape;
use crate::ops::clipboard::Clipboard;
use crate::settings::EditorSettings;

// ============================================================================
// EDITOR EVENTS: the discrete input surface
// ============================================================================

/// One discrete input from the front end (or a scripted event file).
///
/// Serialized as `{"event": "pointer_down", "x": 3, "y": 4}`. File paths are
/// optional; when omitted the project's own path or the configured default is
/// used.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    PointerDown { x: i32, y: i32 },
    PointerDrag { x: i32, y: i32 },
    PointerUp,
    SelectTool { tool: ToolKind },
    SelectColor { rgb: [u8; 3] },
    SetGradientColors { start: [u8; 3], end: [u8; 3] },
    SetBrush { size: u32, shape: BrushShape },
    Cancel,
    Undo,
    Redo,
    Copy,
    Paste { x: i32, y: i32 },
    TogglePlayback,
    Tick { elapsed_ms: u64 },
    Save {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Load {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    ExportPng {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    ExportGif {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    ExportApng { path: PathBuf },
    AddLayer {
        #[serde(default)]
        name: Option<String>,
    },
    DeleteLayer { index: usize },
    DuplicateLayer { index: usize },
    SelectLayer { index: usize },
    MoveLayer { from: usize, to: usize },
    SetLayerVisibility { index: usize, visible: bool },
    SetLayerOpacity { index: usize, opacity: u8 },
    RenameLayer { index: usize, name: String },
    ClearLayer { index: usize },
    AddFrame {
        #[serde(default)]
        duration: Option<u32>,
    },
    StoreFrame,
    DeleteFrame { index: usize },
    GoToFrame { index: usize },
    SetFrameDuration { index: usize, duration: u32 },
}

// ============================================================================
// PROJECT: one editing session
// ============================================================================

/// Single open document: the live canvas plus everything that edits it.
pub struct Project {
    pub id: Uuid,
    pub canvas: CanvasState,
    pub history: HistoryManager,
    pub animation: Animation,
    pub tools: ToolState,
    pub clipboard: Option<Clipboard>,
    /// `None` for unsaved/untitled files.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,
    /// Display name (derived from path or "Untitled-X")
    pub name: String,
    settings: EditorSettings,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, settings: &EditorSettings) -> Self {
        let canvas = CanvasState::new(settings.grid_size, settings.grid_size);
        let history = HistoryManager::new(settings.max_undo_steps, &canvas);
        let animation = Animation::new(&canvas, settings.default_frame_ms);
        Self {
            id: Uuid::new_v4(),
            canvas,
            history,
            animation,
            tools: ToolState::default(),
            clipboard: None,
            path: None,
            is_dirty: false,
            name: format!("Untitled-{}", untitled_counter),
            settings: settings.clone(),
        }
    }

    pub fn from_loaded(path: PathBuf, loaded: LoadedProject, settings: &EditorSettings) -> Self {
        let history = HistoryManager::new(settings.max_undo_steps, &loaded.canvas);
        let mut project = Self {
            id: Uuid::new_v4(),
            canvas: loaded.canvas,
            history,
            animation: loaded.animation,
            tools: ToolState::default(),
            clipboard: None,
            path: Some(path),
            is_dirty: false,
            name: String::new(),
            settings: settings.clone(),
        };
        project.update_name_from_path();
        project
    }

    /// Open a project file from disk.
    pub fn open(path: &Path, settings: &EditorSettings) -> Result<Self, ProjectIoError> {
        let loaded = io::load_project(path)?;
        log::info!("Opened project {}", path.display());
        Ok(Self::from_loaded(path.to_path_buf(), loaded, settings))
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
        }
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Record a finished edit in history.
    fn commit(&mut self, description: &str) {
        self.history.commit(&self.canvas, description);
        self.mark_dirty();
        log::debug!("Committed '{}' ({} undo steps)", description, self.history.undo_count());
    }

    /// Commit when `changed`, otherwise note the ignored edit.
    fn commit_if(&mut self, changed: bool, description: &str) {
        if changed {
            self.commit(description);
        } else {
            log::debug!("Ignored no-op '{}'", description);
        }
    }

    fn frames_changed(&mut self, changed: bool, what: &str) {
        if changed {
            self.mark_dirty();
        } else {
            log::debug!("Ignored {} request", what);
        }
    }

    // ========================================================================
    // EVENT DISPATCH
    // ========================================================================

    /// Apply one event. Only file events can fail, and a failure leaves the
    /// session exactly as it was.
    pub fn handle_event(&mut self, event: EditorEvent) -> Result<(), ProjectIoError> {
        match event {
            EditorEvent::PointerDown { x, y } => {
                if let Some(desc) = self.tools.pointer_down(&mut self.canvas, x, y) {
                    self.commit(&desc);
                }
            }
            EditorEvent::PointerDrag { x, y } => self.tools.pointer_drag(&mut self.canvas, x, y),
            EditorEvent::PointerUp => {
                if let Some(desc) = self.tools.pointer_up() {
                    self.commit(&desc);
                }
            }
            EditorEvent::SelectTool { tool } => self.tools.change_tool(tool),
            EditorEvent::SelectColor { rgb } => self.tools.properties.color = Rgb(rgb),
            EditorEvent::SetGradientColors { start, end } => {
                self.tools.properties.gradient_colors = [Rgb(start), Rgb(end)];
            }
            EditorEvent::SetBrush { size, shape } => self.tools.set_brush(size, shape),
            EditorEvent::Cancel => {
                self.tools.cancel();
            }
            EditorEvent::Undo => self.undo(),
            EditorEvent::Redo => self.redo(),
            EditorEvent::Copy => self.copy_selection(),
            EditorEvent::Paste { x, y } => self.paste(x, y),
            EditorEvent::TogglePlayback => {
                let playing = self.animation.toggle_playback();
                log::info!("Playback {}", if playing { "started" } else { "paused" });
            }
            EditorEvent::Tick { elapsed_ms } => {
                self.animation.tick(elapsed_ms, &mut self.canvas);
            }
            EditorEvent::Save { path } => self.save(path)?,
            EditorEvent::Load { path } => self.load(path)?,
            EditorEvent::ExportPng { path } => {
                let path = path.unwrap_or_else(|| self.settings.png_export_path.clone());
                self.export_png(&path)?;
            }
            EditorEvent::ExportGif { path } => {
                let path = path.unwrap_or_else(|| self.settings.gif_export_path.clone());
                self.export_gif(&path)?;
            }
            EditorEvent::ExportApng { path } => self.export_apng(&path)?,
            EditorEvent::AddLayer { name } => {
                let name = name.unwrap_or_else(|| self.canvas.next_layer_name());
                self.canvas.add_layer(name);
                self.commit("Add Layer");
            }
            EditorEvent::DeleteLayer { index } => {
                let changed = self.canvas.delete_layer(index);
                self.commit_if(changed, "Delete Layer");
            }
            EditorEvent::DuplicateLayer { index } => {
                let changed = self.canvas.duplicate_layer(index);
                self.commit_if(changed, "Duplicate Layer");
            }
            EditorEvent::SelectLayer { index } => {
                if !self.canvas.select_active(index) {
                    log::debug!("Ignored select of missing layer {}", index);
                }
            }
            EditorEvent::MoveLayer { from, to } => {
                let changed = self.canvas.move_layer(from, to);
                self.commit_if(changed, "Move Layer");
            }
            EditorEvent::SetLayerVisibility { index, visible } => {
                let changed = self.canvas.set_visible(index, visible);
                self.commit_if(changed, if visible { "Show Layer" } else { "Hide Layer" });
            }
            EditorEvent::SetLayerOpacity { index, opacity } => {
                let changed = self.canvas.set_opacity(index, opacity);
                self.commit_if(changed, "Layer Opacity");
            }
            EditorEvent::RenameLayer { index, name } => {
                let changed = self.canvas.rename_layer(index, name);
                self.commit_if(changed, "Rename Layer");
            }
            EditorEvent::ClearLayer { index } => {
                let changed = self.canvas.clear_layer(index);
                self.commit_if(changed, "Clear Layer");
            }
            EditorEvent::AddFrame { duration } => {
                let duration = duration.unwrap_or(self.settings.default_frame_ms);
                self.animation.add_frame(&self.canvas, duration);
                self.mark_dirty();
            }
            EditorEvent::StoreFrame => {
                self.animation.store_frame(&self.canvas);
                self.mark_dirty();
            }
            EditorEvent::DeleteFrame { index } => {
                let changed = self.animation.delete_frame(index);
                self.frames_changed(changed, "delete frame");
            }
            EditorEvent::GoToFrame { index } => {
                let changed = self.animation.go_to_frame(index, &mut self.canvas);
                self.commit_if(changed, "Go To Frame");
            }
            EditorEvent::SetFrameDuration { index, duration } => {
                let changed = self.animation.set_frame_duration(index, duration);
                self.frames_changed(changed, "frame duration");
            }
        }
        Ok(())
    }

    /// Apply events in order. The first failure is logged and returned after
    /// the remaining events have still been applied.
    pub fn replay(
        &mut self,
        events: impl IntoIterator<Item = EditorEvent>,
    ) -> Result<(), ProjectIoError> {
        let mut first_error = None;
        for event in events {
            if let Err(e) = self.handle_event(event) {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // ========================================================================
    // HISTORY / CLIPBOARD
    // ========================================================================

    pub fn undo(&mut self) {
        self.tools.cancel();
        if let Some(desc) = self.history.undo(&mut self.canvas) {
            log::debug!("Undo '{}'", desc);
            self.mark_dirty();
        }
    }

    pub fn redo(&mut self) {
        self.tools.cancel();
        if let Some(desc) = self.history.redo(&mut self.canvas) {
            log::debug!("Redo '{}'", desc);
            self.mark_dirty();
        }
    }

    fn copy_selection(&mut self) {
        match &self.tools.selection {
            Some(selection) => {
                let clip = Clipboard::copy(&self.canvas.active_layer().pixels, selection);
                log::debug!("Copied {}x{} block", clip.width(), clip.height());
                self.clipboard = Some(clip);
            }
            None => log::debug!("Ignored copy without a selection"),
        }
    }

    fn paste(&mut self, x: i32, y: i32) {
        let Some(clip) = &self.clipboard else {
            log::debug!("Ignored paste with an empty clipboard");
            return;
        };
        let written = clip.paste(&mut self.canvas.active_layer_mut().pixels, x, y);
        self.commit_if(written > 0, "Paste");
    }

    // ========================================================================
    // FILE I/O
    // ========================================================================

    /// Save to `path`, the project's own path, or the configured default.
    pub fn save(&mut self, path: Option<PathBuf>) -> Result<(), ProjectIoError> {
        let path = path
            .or_else(|| self.path.clone())
            .unwrap_or_else(|| self.settings.project_path.clone());
        if let Err(e) = io::save_project(&self.canvas, &self.animation, &path) {
            log::error!("Failed to save project to {}: {}", path.display(), e);
            return Err(e);
        }
        log::info!("Saved project to {}", path.display());
        self.path = Some(path);
        self.update_name_from_path();
        self.mark_clean();
        Ok(())
    }

    /// Replace the session with a project file. On failure nothing changes.
    pub fn load(&mut self, path: Option<PathBuf>) -> Result<(), ProjectIoError> {
        let path = path
            .or_else(|| self.path.clone())
            .unwrap_or_else(|| self.settings.project_path.clone());
        let loaded = match io::load_project(&path) {
            Ok(loaded) => loaded,
            Err(e) => {
                log::error!("Failed to load project from {}: {}", path.display(), e);
                return Err(e);
            }
        };
        self.tools.cancel();
        self.canvas = loaded.canvas;
        self.animation = loaded.animation;
        self.history.reset(&self.canvas);
        self.path = Some(path);
        self.update_name_from_path();
        self.mark_clean();
        log::info!(
            "Loaded project {} ({} layers, {} frames)",
            self.name,
            self.canvas.layers.len(),
            self.animation.frame_count()
        );
        Ok(())
    }

    pub fn export_png(&self, path: &Path) -> Result<(), ProjectIoError> {
        let image = compositor::composite_canvas(&self.canvas);
        io::export_png(&image, path)
            .inspect(|_| log::info!("Exported PNG to {}", path.display()))
            .inspect_err(|e| log::error!("PNG export to {} failed: {}", path.display(), e))
    }

    pub fn export_gif(&self, path: &Path) -> Result<(), ProjectIoError> {
        let frames = compositor::composite_frames(&self.animation, self.canvas.width, self.canvas.height);
        io::encode_animated_gif(&frames, self.settings.gif_max_colors, path)
            .inspect(|_| log::info!("Exported {} GIF frames to {}", frames.len(), path.display()))
            .inspect_err(|e| log::error!("GIF export to {} failed: {}", path.display(), e))
    }

    pub fn export_apng(&self, path: &Path) -> Result<(), ProjectIoError> {
        let frames = compositor::composite_frames(&self.animation, self.canvas.width, self.canvas.height);
        io::encode_animated_png(&frames, path)
            .inspect(|_| log::info!("Exported {} APNG frames to {}", frames.len(), path.display()))
            .inspect_err(|e| log::error!("APNG export to {} failed: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn small_settings() -> EditorSettings {
        EditorSettings {
            grid_size: 8,
            ..EditorSettings::default()
        }
    }

    fn project() -> Project {
        Project::new_untitled(1, &small_settings())
    }

    fn click(p: &mut Project, x: i32, y: i32) {
        p.handle_event(EditorEvent::PointerDown { x, y }).unwrap();
        p.handle_event(EditorEvent::PointerUp).unwrap();
    }

    #[test]
    fn events_parse_from_tagged_json() {
        let events: Vec<EditorEvent> = serde_json::from_str(
            r#"[
                {"event": "pointer_down", "x": 1, "y": 2},
                {"event": "select_tool", "tool": "gradient"},
                {"event": "set_brush", "size": 3, "shape": "circle"},
                {"event": "save"},
                {"event": "add_layer"},
                {"event": "add_frame", "duration": 250}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![
                EditorEvent::PointerDown { x: 1, y: 2 },
                EditorEvent::SelectTool { tool: ToolKind::Gradient },
                EditorEvent::SetBrush { size: 3, shape: BrushShape::Circle },
                EditorEvent::Save { path: None },
                EditorEvent::AddLayer { name: None },
                EditorEvent::AddFrame { duration: Some(250) },
            ]
        );
    }

    #[test]
    fn stroke_is_one_undo_step() {
        let mut p = project();
        p.handle_event(EditorEvent::SelectColor { rgb: [9, 9, 9] }).unwrap();
        p.handle_event(EditorEvent::PointerDown { x: 0, y: 0 }).unwrap();
        p.handle_event(EditorEvent::PointerDrag { x: 1, y: 0 }).unwrap();
        p.handle_event(EditorEvent::PointerDrag { x: 2, y: 0 }).unwrap();
        p.handle_event(EditorEvent::PointerUp).unwrap();
        assert_eq!(p.history.undo_count(), 1);
        assert!(p.is_dirty);

        p.handle_event(EditorEvent::Undo).unwrap();
        assert!(p.canvas.layers[0].pixels.is_empty());
        p.handle_event(EditorEvent::Redo).unwrap();
        assert_eq!(p.canvas.layers[0].pixels.get(2, 0), Some(Rgb([9, 9, 9])));
    }

    #[test]
    fn rejected_layer_edits_do_not_commit() {
        let mut p = project();
        p.handle_event(EditorEvent::DeleteLayer { index: 0 }).unwrap();
        p.handle_event(EditorEvent::ClearLayer { index: 0 }).unwrap();
        p.handle_event(EditorEvent::MoveLayer { from: 0, to: 3 }).unwrap();
        assert_eq!(p.canvas.layers.len(), 1);
        assert_eq!(p.history.undo_count(), 0);
        assert!(!p.is_dirty);
    }

    #[test]
    fn add_layer_uses_generated_name_and_keeps_active() {
        let mut p = project();
        p.handle_event(EditorEvent::AddLayer { name: None }).unwrap();
        assert_eq!(p.canvas.layers[1].name, "Layer 1");
        assert_eq!(p.canvas.active_layer_index, 0);
        assert_eq!(p.history.undo_description(), Some("Add Layer"));
    }

    #[test]
    fn copy_paste_commits_once() {
        let mut p = project();
        p.handle_event(EditorEvent::SelectColor { rgb: [200, 0, 0] }).unwrap();
        click(&mut p, 1, 1);

        p.handle_event(EditorEvent::SelectTool { tool: ToolKind::Select }).unwrap();
        p.handle_event(EditorEvent::PointerDown { x: 0, y: 0 }).unwrap();
        p.handle_event(EditorEvent::PointerDrag { x: 1, y: 1 }).unwrap();
        p.handle_event(EditorEvent::PointerUp).unwrap();
        p.handle_event(EditorEvent::Copy).unwrap();
        p.handle_event(EditorEvent::Paste { x: 4, y: 4 }).unwrap();

        assert_eq!(p.canvas.layers[0].pixels.get(5, 5), Some(Rgb([200, 0, 0])));
        assert_eq!(p.canvas.layers[0].pixels.get(4, 4), None);
        assert_eq!(p.history.undo_description(), Some("Paste"));
        assert_eq!(p.history.undo_count(), 2);
    }

    #[test]
    fn paste_without_clipboard_is_ignored() {
        let mut p = project();
        p.handle_event(EditorEvent::Paste { x: 0, y: 0 }).unwrap();
        assert_eq!(p.history.undo_count(), 0);
    }

    #[test]
    fn playback_swaps_frames_into_canvas() {
        let mut p = project();
        p.handle_event(EditorEvent::AddFrame { duration: Some(50) }).unwrap();
        click(&mut p, 3, 3);
        p.handle_event(EditorEvent::StoreFrame).unwrap();
        p.handle_event(EditorEvent::GoToFrame { index: 0 }).unwrap();
        assert!(p.canvas.layers[0].pixels.is_empty());

        p.handle_event(EditorEvent::TogglePlayback).unwrap();
        p.handle_event(EditorEvent::Tick { elapsed_ms: 99 }).unwrap();
        assert_eq!(p.animation.current_frame(), 0);
        p.handle_event(EditorEvent::Tick { elapsed_ms: 1 }).unwrap();
        assert_eq!(p.animation.current_frame(), 1);
        assert_eq!(p.canvas.layers[0].pixels.get(3, 3), Some(Rgb([0, 0, 0])));
    }

    #[test]
    fn display_title_marks_dirty() {
        let mut p = project();
        assert_eq!(p.display_title(), "Untitled-1");
        click(&mut p, 0, 0);
        assert_eq!(p.display_title(), "Untitled-1*");
    }

    #[test]
    fn failed_load_keeps_session() {
        let mut p = project();
        click(&mut p, 2, 2);
        let missing = std::env::temp_dir().join(format!("{}.json", Uuid::new_v4()));
        assert!(p.handle_event(EditorEvent::Load { path: Some(missing) }).is_err());
        assert_eq!(p.canvas.layers[0].pixels.get(2, 2), Some(Rgb([0, 0, 0])));
        assert_eq!(p.history.undo_count(), 1);
        assert!(p.is_dirty);
        assert_eq!(p.path, None);
    }
}

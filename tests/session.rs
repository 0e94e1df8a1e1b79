use std::fs::File;
use std::path::PathBuf;

use image::Rgb;
use pretty_assertions::assert_eq;

use pixelsmith::components::tools::ToolKind;
use pixelsmith::io::ProjectFile;
use pixelsmith::ops::brush::BrushShape;
use pixelsmith::project::{EditorEvent, Project};
use pixelsmith::settings::EditorSettings;

fn temp_path(ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pixelsmith-{}.{}", uuid::Uuid::new_v4(), ext))
}

fn settings() -> EditorSettings {
    EditorSettings {
        grid_size: 32,
        ..EditorSettings::default()
    }
}

/// Two layers, a hidden third, and two frames of different lengths.
fn sample_project() -> Project {
    let mut p = Project::new_untitled(1, &settings());
    let events: Vec<EditorEvent> = serde_json::from_str(
        r#"[
            {"event": "select_color", "rgb": [10, 10, 10]},
            {"event": "set_brush", "size": 2, "shape": "square"},
            {"event": "pointer_down", "x": 4, "y": 4},
            {"event": "pointer_drag", "x": 8, "y": 4},
            {"event": "pointer_up"},
            {"event": "add_layer", "name": "Ink"},
            {"event": "select_layer", "index": 1},
            {"event": "set_layer_opacity", "index": 1, "opacity": 128},
            {"event": "select_color", "rgb": [255, 255, 255]},
            {"event": "set_brush", "size": 1, "shape": "square"},
            {"event": "pointer_down", "x": 4, "y": 4},
            {"event": "pointer_up"},
            {"event": "add_layer"},
            {"event": "set_layer_visibility", "index": 2, "visible": false},
            {"event": "store_frame"},
            {"event": "add_frame", "duration": 250},
            {"event": "select_tool", "tool": "fill"},
            {"event": "select_color", "rgb": [0, 120, 200]},
            {"event": "pointer_down", "x": 20, "y": 20},
            {"event": "store_frame"}
        ]"#,
    )
    .unwrap();
    p.replay(events).unwrap();
    p
}

#[test]
fn scripted_events_build_expected_canvas() {
    let p = sample_project();
    assert_eq!(p.canvas.layers.len(), 3);
    assert_eq!(p.canvas.active_layer_index, 1);
    assert_eq!(p.canvas.layers[0].pixels.get(8, 4), Some(Rgb([10, 10, 10])));
    assert_eq!(p.canvas.layers[1].pixels.get(4, 4), Some(Rgb([255, 255, 255])));
    assert_eq!(p.canvas.layers[1].pixels.get(20, 20), Some(Rgb([0, 120, 200])));
    assert_eq!(p.canvas.layers[2].name, "Layer 2");
    assert!(!p.canvas.layers[2].visible);
    assert_eq!(p.animation.frame_count(), 2);
    assert_eq!(p.animation.current_frame(), 1);
    assert_eq!(p.display_title(), "Untitled-1*");
}

#[test]
fn undo_all_then_redo_all_restores_pixels() {
    let mut p = sample_project();
    let before = ProjectFile::from_session(&p.canvas, &p.animation);
    let steps = p.history.undo_count();
    assert!(steps > 0);

    for _ in 0..steps {
        p.handle_event(EditorEvent::Undo).unwrap();
    }
    assert!(p.canvas.layers.iter().all(|l| l.pixels.is_empty()));
    assert_eq!(p.canvas.layers.len(), 1);

    for _ in 0..steps {
        p.handle_event(EditorEvent::Redo).unwrap();
    }
    assert_eq!(ProjectFile::from_session(&p.canvas, &p.animation), before);
}

#[test]
fn history_is_bounded_at_fifty() {
    let mut p = Project::new_untitled(1, &settings());
    for i in 0..51 {
        p.handle_event(EditorEvent::SelectColor { rgb: [i as u8 + 1, 0, 0] })
            .unwrap();
        p.handle_event(EditorEvent::PointerDown { x: 0, y: 0 }).unwrap();
        p.handle_event(EditorEvent::PointerUp).unwrap();
    }
    assert_eq!(p.history.len(), 50);
    while p.history.can_undo() {
        p.handle_event(EditorEvent::Undo).unwrap();
    }
    // Oldest reachable state already contains commit #2.
    assert_eq!(p.canvas.layers[0].pixels.get(0, 0), Some(Rgb([2, 0, 0])));
}

fn assert_round_trip(ext: &str) {
    let mut p = sample_project();
    let path = temp_path(ext);
    p.handle_event(EditorEvent::Save { path: Some(path.clone()) })
        .unwrap();
    assert!(!p.is_dirty);
    assert_eq!(p.path.as_deref(), Some(path.as_path()));

    let reopened = Project::open(&path, &settings()).unwrap();
    assert_eq!(
        ProjectFile::from_session(&reopened.canvas, &reopened.animation),
        ProjectFile::from_session(&p.canvas, &p.animation)
    );
    assert_eq!(reopened.canvas.active_layer_index, 0);
    assert!(!reopened.history.can_undo());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn json_project_round_trips() {
    assert_round_trip("json");
}

#[test]
fn binary_project_round_trips() {
    assert_round_trip("pxf");
}

#[test]
fn load_resets_history_and_selection_state() {
    let mut p = sample_project();
    let path = temp_path("json");
    p.save(Some(path.clone())).unwrap();
    p.handle_event(EditorEvent::ClearLayer { index: 0 }).unwrap();
    assert!(p.is_dirty);

    p.handle_event(EditorEvent::Load { path: Some(path.clone()) })
        .unwrap();
    assert!(!p.is_dirty);
    assert!(!p.history.can_undo());
    assert_eq!(p.canvas.layers[0].pixels.get(8, 4), Some(Rgb([10, 10, 10])));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn corrupt_file_leaves_session_untouched() {
    let mut p = sample_project();
    let before = ProjectFile::from_session(&p.canvas, &p.animation);
    let undo_steps = p.history.undo_count();

    let path = temp_path("json");
    std::fs::write(&path, r#"{"layers": [{"name": "x"}]}"#).unwrap();
    assert!(p.handle_event(EditorEvent::Load { path: Some(path.clone()) }).is_err());

    let bad_pxf = temp_path("pxf");
    std::fs::write(&bad_pxf, b"not a pixelsmith project").unwrap();
    assert!(p.handle_event(EditorEvent::Load { path: Some(bad_pxf.clone()) }).is_err());

    assert_eq!(ProjectFile::from_session(&p.canvas, &p.animation), before);
    assert_eq!(p.history.undo_count(), undo_steps);
    assert!(p.is_dirty);
    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(&bad_pxf);
}

#[test]
fn png_export_blends_visible_layers() {
    let mut p = sample_project();
    p.handle_event(EditorEvent::GoToFrame { index: 0 }).unwrap();
    let path = temp_path("png");
    p.handle_event(EditorEvent::ExportPng { path: Some(path.clone()) })
        .unwrap();

    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (32, 32));
    assert_eq!(img.get_pixel(4, 4).0, [132, 132, 132, 255]);
    assert_eq!(img.get_pixel(8, 4).0, [10, 10, 10, 255]);
    assert_eq!(img.get_pixel(31, 31).0, [0, 0, 0, 0]);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn gif_export_has_one_frame_per_animation_frame() {
    let p = sample_project();
    let path = temp_path("gif");
    p.export_gif(&path).unwrap();

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(File::open(&path).unwrap()).unwrap();
    let mut delays = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        assert_eq!((frame.width, frame.height), (32, 32));
        delays.push(frame.delay);
    }
    assert_eq!(delays, vec![10, 25]);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn apng_export_loops_forever() {
    let p = sample_project();
    let path = temp_path("png");
    p.export_apng(&path).unwrap();

    let decoder = png::Decoder::new(File::open(&path).unwrap());
    let reader = decoder.read_info().unwrap();
    let control = reader.info().animation_control.unwrap();
    assert_eq!(control.num_frames, 2);
    assert_eq!(control.num_plays, 0);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn gradient_event_pair_paints_ramp() {
    let mut p = Project::new_untitled(1, &settings());
    p.replay([
        EditorEvent::SelectTool { tool: ToolKind::Gradient },
        EditorEvent::SetGradientColors { start: [0, 0, 0], end: [100, 200, 250] },
        EditorEvent::PointerDown { x: 0, y: 0 },
        EditorEvent::PointerDown { x: 10, y: 0 },
    ])
    .unwrap();
    let grid = &p.canvas.layers[0].pixels;
    assert_eq!(grid.get(0, 0), Some(Rgb([0, 0, 0])));
    assert_eq!(grid.get(5, 0), Some(Rgb([50, 100, 125])));
    assert_eq!(grid.get(10, 0), Some(Rgb([100, 200, 250])));
    assert_eq!(p.history.undo_description(), Some("Gradient"));
}

#[test]
fn brush_shape_event_changes_footprint() {
    let mut p = Project::new_untitled(1, &settings());
    p.replay([
        EditorEvent::SetBrush { size: 2, shape: BrushShape::Cross },
        EditorEvent::PointerDown { x: 5, y: 5 },
        EditorEvent::PointerUp,
    ])
    .unwrap();
    let grid = &p.canvas.layers[0].pixels;
    assert!(grid.get(5, 4).is_some());
    assert!(grid.get(4, 5).is_some());
    assert!(grid.get(4, 4).is_none());
}

// ============================================================================
// Far-off-grid and extreme inputs are ignored without panicking
// ============================================================================

fn painted_project() -> Project {
    let mut p = Project::new_untitled(1, &settings());
    p.replay([
        EditorEvent::SelectColor { rgb: [200, 0, 0] },
        EditorEvent::PointerDown { x: 1, y: 1 },
        EditorEvent::PointerUp,
    ])
    .unwrap();
    p
}

#[test]
fn huge_selection_copies_and_pastes_the_grid_part() {
    let mut p = painted_project();
    p.replay([
        EditorEvent::SelectTool { tool: ToolKind::Select },
        EditorEvent::PointerDown { x: 0, y: 0 },
        EditorEvent::PointerDrag { x: 70_000, y: 70_000 },
        EditorEvent::PointerUp,
        EditorEvent::Copy,
        EditorEvent::Paste { x: 10, y: 10 },
    ])
    .unwrap();
    let clip = p.clipboard.as_ref().unwrap();
    assert_eq!((clip.width(), clip.height()), (70_001, 70_001));
    assert_eq!(p.canvas.layers[0].pixels.get(11, 11), Some(Rgb([200, 0, 0])));
    assert_eq!(p.history.undo_description(), Some("Paste"));
}

#[test]
fn extreme_selection_and_paste_leave_canvas_unchanged() {
    let mut p = painted_project();
    let before = p.canvas.layers[0].pixels.clone();
    let steps = p.history.undo_count();
    p.replay([
        EditorEvent::SelectTool { tool: ToolKind::Select },
        EditorEvent::PointerDown { x: i32::MIN, y: i32::MIN },
        EditorEvent::PointerDrag { x: i32::MAX, y: i32::MAX },
        EditorEvent::PointerUp,
        EditorEvent::Copy,
        EditorEvent::Paste { x: i32::MAX, y: i32::MAX },
        EditorEvent::Paste { x: i32::MAX, y: 0 },
        EditorEvent::PointerDown { x: i32::MIN, y: 0 },
        EditorEvent::PointerDrag { x: i32::MAX, y: 0 },
        EditorEvent::Copy,
        EditorEvent::Paste { x: i32::MIN, y: i32::MIN },
    ])
    .unwrap();
    assert_eq!(p.canvas.layers[0].pixels, before);
    assert_eq!(p.history.undo_count(), steps);
}

#[test]
fn extreme_brush_sizes_and_centers_are_ignored() {
    let mut p = painted_project();
    let before = p.canvas.layers[0].pixels.clone();
    let steps = p.history.undo_count();
    p.replay([
        EditorEvent::SetBrush { size: 3, shape: BrushShape::Square },
        EditorEvent::PointerDown { x: i32::MAX, y: 0 },
        EditorEvent::PointerDrag { x: i32::MIN, y: i32::MIN },
        EditorEvent::PointerDrag { x: i32::MAX, y: i32::MAX },
        EditorEvent::PointerUp,
        EditorEvent::SetBrush { size: 3_000_000_000, shape: BrushShape::Circle },
        EditorEvent::PointerDown { x: i32::MIN, y: i32::MAX },
        EditorEvent::PointerUp,
    ])
    .unwrap();
    assert_eq!(p.tools.properties.brush.size, 1024);
    assert_eq!(p.canvas.layers[0].pixels, before);
    assert_eq!(p.history.undo_count(), steps);
}

#[test]
fn oversized_brush_covers_whole_grid() {
    let mut p = Project::new_untitled(1, &settings());
    p.replay([
        EditorEvent::SelectColor { rgb: [1, 2, 3] },
        EditorEvent::SetBrush { size: 100_000, shape: BrushShape::Square },
        EditorEvent::PointerDown { x: 0, y: 0 },
        EditorEvent::PointerUp,
    ])
    .unwrap();
    let grid = &p.canvas.layers[0].pixels;
    assert!(grid.cells().iter().all(|c| *c == Some(Rgb([1, 2, 3]))));
    assert_eq!(p.history.undo_description(), Some("Brush Stroke"));
}

#[test]
fn gradient_to_far_end_paints_only_grid_cells() {
    let mut p = Project::new_untitled(1, &settings());
    p.replay([
        EditorEvent::SelectTool { tool: ToolKind::Gradient },
        EditorEvent::SetGradientColors { start: [0, 0, 0], end: [255, 255, 255] },
        EditorEvent::PointerDown { x: 0, y: 0 },
        EditorEvent::PointerDown { x: i32::MAX, y: 0 },
    ])
    .unwrap();
    let grid = &p.canvas.layers[0].pixels;
    assert_eq!(grid.get(0, 0), Some(Rgb([0, 0, 0])));
    assert_eq!(grid.get(31, 0), Some(Rgb([0, 0, 0])));
    assert_eq!(grid.get(0, 1), None);

    let before = grid.clone();
    let steps = p.history.undo_count();
    p.replay([
        EditorEvent::PointerDown { x: i32::MIN, y: i32::MIN },
        EditorEvent::PointerDown { x: i32::MAX, y: i32::MIN },
        EditorEvent::SelectTool { tool: ToolKind::Fill },
        EditorEvent::PointerDown { x: i32::MAX, y: i32::MAX },
        EditorEvent::SelectTool { tool: ToolKind::Eyedropper },
        EditorEvent::PointerDown { x: i32::MIN, y: 5 },
    ])
    .unwrap();
    assert_eq!(p.canvas.layers[0].pixels, before);
    assert_eq!(p.history.undo_count(), steps);
}

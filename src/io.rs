use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgb, RgbaImage};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::{CanvasState, Layer, PixelGrid};
use crate::components::animation::{Animation, AnimationFrame};

/// Magic header for the binary project format.
const PXF_MAGIC: &str = "PXF1";

/// Maximum grid edge accepted from a project file.
pub const MAX_GRID_DIM: u32 = 1024;
/// Maximum number of layers per stack accepted from a project file.
const MAX_LAYERS: usize = 256;

/// Error type for project save/load and image export.
#[derive(Debug, Error)]
pub enum ProjectIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Binary format error: {0}")]
    Binary(#[from] bincode::Error),
    #[error("Image encode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("GIF encode error: {0}")]
    Gif(#[from] gif::EncodingError),
    #[error("PNG encode error: {0}")]
    Png(#[from] png::EncodingError),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// PROJECT DOCUMENT: serde shape shared by the JSON and binary formats
// ============================================================================

/// Serializable layer. `null` cells are transparent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LayerData {
    pub name: String,
    pub visible: bool,
    pub opacity: u8,
    pub pixels: Vec<Vec<Option<[u8; 3]>>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FrameData {
    pub duration: u32,
    pub layers: Vec<LayerData>,
}

/// Whole project as written to disk.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProjectFile {
    pub layers: Vec<LayerData>,
    pub animation_frames: Vec<FrameData>,
    pub current_frame: usize,
}

/// Binary wrapper: magic + explicit grid size + the document.
#[derive(Serialize, Deserialize)]
struct BinaryProjectFile {
    magic: String,
    width: u32,
    height: u32,
    document: ProjectFile,
}

/// Canvas + animation rebuilt from a project file, with independent grids.
#[derive(Debug)]
pub struct LoadedProject {
    pub canvas: CanvasState,
    pub animation: Animation,
}

impl LayerData {
    fn from_layer(layer: &Layer) -> Self {
        Self {
            name: layer.name.clone(),
            visible: layer.visible,
            opacity: layer.opacity,
            pixels: layer
                .pixels
                .rows()
                .map(|row| row.iter().map(|p| p.map(|c| c.0)).collect())
                .collect(),
        }
    }

    fn into_layer(self, width: u32, height: u32) -> Result<Layer, ProjectIoError> {
        let rows = self
            .pixels
            .into_iter()
            .map(|row| row.into_iter().map(|p| p.map(Rgb)).collect())
            .collect();
        let pixels = PixelGrid::from_rows(width, height, rows).ok_or_else(|| {
            ProjectIoError::InvalidFormat(format!(
                "layer '{}' is not a {}x{} grid",
                self.name, width, height
            ))
        })?;
        Ok(Layer {
            name: self.name,
            visible: self.visible,
            opacity: self.opacity,
            pixels,
        })
    }
}

fn layers_into_stack(
    layers: Vec<LayerData>,
    width: u32,
    height: u32,
    what: &str,
) -> Result<Vec<Layer>, ProjectIoError> {
    if layers.is_empty() {
        return Err(ProjectIoError::InvalidFormat(format!("{what} has no layers")));
    }
    if layers.len() > MAX_LAYERS {
        return Err(ProjectIoError::InvalidFormat(format!(
            "{what} has {} layers (max {MAX_LAYERS})",
            layers.len()
        )));
    }
    layers
        .into_iter()
        .map(|l| l.into_layer(width, height))
        .collect()
}

impl ProjectFile {
    pub fn from_session(canvas: &CanvasState, animation: &Animation) -> Self {
        Self {
            layers: canvas.layers.iter().map(LayerData::from_layer).collect(),
            animation_frames: animation
                .frames()
                .iter()
                .map(|f| FrameData {
                    duration: f.duration,
                    layers: f.layers.iter().map(LayerData::from_layer).collect(),
                })
                .collect(),
            current_frame: animation.current_frame(),
        }
    }

    /// Grid size implied by the first live layer.
    pub fn grid_size(&self) -> Result<(u32, u32), ProjectIoError> {
        let first = self
            .layers
            .first()
            .ok_or_else(|| ProjectIoError::InvalidFormat("project has no layers".into()))?;
        let height = first.pixels.len() as u32;
        let width = first.pixels.first().map_or(0, |r| r.len()) as u32;
        if width == 0 || height == 0 || width > MAX_GRID_DIM || height > MAX_GRID_DIM {
            return Err(ProjectIoError::InvalidFormat(format!(
                "unsupported grid size {width}x{height}"
            )));
        }
        Ok((width, height))
    }

    /// Validate the document and rebuild the live canvas and animation.
    pub fn into_session(self) -> Result<LoadedProject, ProjectIoError> {
        let (width, height) = self.grid_size()?;
        let live = layers_into_stack(self.layers, width, height, "canvas")?;

        if self.animation_frames.is_empty() {
            return Err(ProjectIoError::InvalidFormat("project has no animation frames".into()));
        }
        let frames = self
            .animation_frames
            .into_iter()
            .enumerate()
            .map(|(i, f)| {
                if f.duration == 0 {
                    return Err(ProjectIoError::InvalidFormat(format!(
                        "frame {i} has zero duration"
                    )));
                }
                let layers = layers_into_stack(f.layers, width, height, &format!("frame {i}"))?;
                Ok(AnimationFrame {
                    layers,
                    duration: f.duration,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let frame_count = frames.len();
        let animation = Animation::from_frames(frames, self.current_frame).ok_or_else(|| {
            ProjectIoError::InvalidFormat(format!(
                "current_frame {} out of range ({frame_count} frames)",
                self.current_frame
            ))
        })?;
        let canvas = CanvasState::from_layers(width, height, live)
            .ok_or_else(|| ProjectIoError::InvalidFormat("canvas has no layers".into()))?;

        Ok(LoadedProject { canvas, animation })
    }
}

// ============================================================================
// PROJECT SAVE / LOAD
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectFormat {
    /// Human-readable nested mappings/lists (`.json`).
    Json,
    /// `bincode` with a magic header (`.pxf`).
    Binary,
}

impl ProjectFormat {
    /// Pick the format from the file extension; anything but `.pxf` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pxf") => ProjectFormat::Binary,
            _ => ProjectFormat::Json,
        }
    }
}

/// Save the live canvas and all frames. The format follows the extension.
pub fn save_project(
    canvas: &CanvasState,
    animation: &Animation,
    path: &Path,
) -> Result<(), ProjectIoError> {
    // Encode into a sibling file first so a failed write never truncates the
    // project already on disk.
    let tmp_path = temp_sibling(path);
    let result = write_project(canvas, animation, ProjectFormat::from_path(path), &tmp_path)
        .and_then(|()| std::fs::rename(&tmp_path, path).map_err(ProjectIoError::from));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

fn write_project(
    canvas: &CanvasState,
    animation: &Animation,
    format: ProjectFormat,
    path: &Path,
) -> Result<(), ProjectIoError> {
    let document = ProjectFile::from_session(canvas, animation);
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        ProjectFormat::Json => serde_json::to_writer_pretty(&mut writer, &document)?,
        ProjectFormat::Binary => {
            let file = BinaryProjectFile {
                magic: PXF_MAGIC.to_string(),
                width: canvas.width,
                height: canvas.height,
                document,
            };
            bincode::serialize_into(&mut writer, &file)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// `.<name>.<uuid>.tmp` next to `path`, so the final rename stays on one
/// filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".into());
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
}

/// Load a project file. Nothing outside the returned value is touched, so
/// callers can keep their current state on error.
pub fn load_project(path: &Path) -> Result<LoadedProject, ProjectIoError> {
    match ProjectFormat::from_path(path) {
        ProjectFormat::Json => {
            let reader = BufReader::new(File::open(path)?);
            let document: ProjectFile = serde_json::from_reader(reader)?;
            document.into_session()
        }
        ProjectFormat::Binary => load_binary(&std::fs::read(path)?),
    }
}

fn load_binary(raw: &[u8]) -> Result<LoadedProject, ProjectIoError> {
    // bincode writes a String as an 8-byte length prefix + UTF-8 bytes, so
    // the 4-byte magic sits at 8..12.
    if raw.len() < 12 {
        return Err(ProjectIoError::InvalidFormat("file too small".into()));
    }
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    if magic != PXF_MAGIC {
        return Err(ProjectIoError::InvalidFormat(format!("unknown magic '{magic}'")));
    }
    let file: BinaryProjectFile = bincode::deserialize(raw)?;
    let loaded = file.document.into_session()?;
    if (loaded.canvas.width, loaded.canvas.height) != (file.width, file.height) {
        return Err(ProjectIoError::InvalidFormat(format!(
            "header says {}x{} but layers are {}x{}",
            file.width, file.height, loaded.canvas.width, loaded.canvas.height
        )));
    }
    Ok(loaded)
}

// ============================================================================
// IMAGE EXPORT
// ============================================================================

/// Write a single composited frame as PNG.
pub fn export_png(image: &RgbaImage, path: &Path) -> Result<(), ProjectIoError> {
    let writer = BufWriter::new(File::create(path)?);
    PngEncoder::new(writer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgba8,
    )?;
    Ok(())
}

fn check_frames(frames: &[(RgbaImage, u32)]) -> Result<(u32, u32), ProjectIoError> {
    let Some((first, _)) = frames.first() else {
        return Err(ProjectIoError::InvalidFormat("no frames to encode".into()));
    };
    let dims = first.dimensions();
    if frames.iter().any(|(img, _)| img.dimensions() != dims) {
        return Err(ProjectIoError::InvalidFormat("frames differ in size".into()));
    }
    Ok(dims)
}

/// Encode frames + per-frame durations (ms) as a looping animated GIF.
/// `max_colors` is the per-frame palette size including the transparent slot.
pub fn encode_animated_gif(
    frames: &[(RgbaImage, u32)],
    max_colors: u16,
    path: &Path,
) -> Result<(), ProjectIoError> {
    let (width, height) = check_frames(frames)?;
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(ProjectIoError::InvalidFormat(
            "image dimensions exceed GIF maximum (65535x65535)".into(),
        ));
    }
    let (w, h) = (width as u16, height as u16);

    let file = File::create(path)?;
    let mut encoder = gif::Encoder::new(BufWriter::new(file), w, h, &[])?;
    encoder.set_repeat(gif::Repeat::Infinite)?;

    let colors = (max_colors as usize).clamp(4, 256);
    for (image, duration) in frames {
        let quantized = quantize_rgba(image, colors);
        let frame = gif::Frame {
            width: w,
            height: h,
            delay: gif_delay(*duration),
            dispose: gif::DisposalMethod::Background,
            transparent: quantized.transparent,
            palette: Some(quantized.palette),
            buffer: Cow::Owned(quantized.indices),
            ..Default::default()
        };
        encoder.write_frame(&frame)?;
    }
    Ok(())
}

/// Milliseconds → GIF centiseconds (at least 1).
fn gif_delay(duration_ms: u32) -> u16 {
    (duration_ms / 10).clamp(1, u16::MAX as u32) as u16
}

/// Encode frames + per-frame durations (ms) as a looping APNG.
pub fn encode_animated_png(frames: &[(RgbaImage, u32)], path: &Path) -> Result<(), ProjectIoError> {
    let (width, height) = check_frames(frames)?;

    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_animated(frames.len() as u32, 0)?; // 0 = infinite loop

    let mut writer = encoder.write_header()?;
    for (image, duration) in frames {
        let delay_ms = (*duration).clamp(1, u16::MAX as u32) as u16;
        writer.set_frame_delay(delay_ms, 1000)?;
        writer.set_dispose_op(png::DisposeOp::Background)?;
        writer.write_image_data(image.as_raw())?;
    }
    writer.finish()?;
    Ok(())
}

struct QuantizedFrame {
    /// Flat `[R, G, B, R, G, B, ...]`.
    palette: Vec<u8>,
    indices: Vec<u8>,
    transparent: Option<u8>,
}

/// Quantize to at most `max_colors` palette entries. Fully transparent pixels
/// get a dedicated palette slot marked as the GIF transparent index.
fn quantize_rgba(image: &RgbaImage, max_colors: usize) -> QuantizedFrame {
    let opaque: Vec<u8> = image
        .pixels()
        .filter(|p| p[3] > 0)
        .flat_map(|p| [p[0], p[1], p[2], 255])
        .collect();
    let pixel_count = (image.width() * image.height()) as usize;

    if opaque.is_empty() {
        return QuantizedFrame {
            palette: vec![0; 6],
            indices: vec![0; pixel_count],
            transparent: Some(0),
        };
    }

    let has_transparent = opaque.len() / 4 < pixel_count;
    let net_size = if has_transparent { max_colors - 1 } else { max_colors };
    let nq = color_quant::NeuQuant::new(10, net_size, &opaque);

    let mut palette = Vec::with_capacity(max_colors * 3);
    for i in 0..net_size {
        let color = nq.lookup(i).unwrap_or([0, 0, 0, 255]);
        palette.extend_from_slice(&color[..3]);
    }
    let transparent = has_transparent.then(|| {
        palette.extend_from_slice(&[0, 0, 0]);
        net_size as u8
    });

    let indices = image
        .pixels()
        .map(|p| match transparent {
            Some(t) if p[3] == 0 => t,
            _ => nq.index_of(&[p[0], p[1], p[2], 255]) as u8,
        })
        .collect();

    QuantizedFrame {
        palette,
        indices,
        transparent,
    }
}

use image::Rgb;

/// Default grid edge length for new projects.
pub const DEFAULT_GRID_SIZE: u32 = 32;

/// A single cell: `None` is fully transparent, `Some` is an opaque RGB color
/// (translucency only exists at the layer level via [`Layer::opacity`]).
pub type Pixel = Option<Rgb<u8>>;

// ============================================================================
// PIXEL GRID: fixed-size row-major storage
// ============================================================================

/// Row-major `width × height` grid of optional pixels.
///
/// `Clone` is a deep copy; grids never share storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    cells: Vec<Pixel>,
}

impl PixelGrid {
    /// Create an all-empty grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; (width as usize) * (height as usize)],
        }
    }

    /// Build a grid from rows. Returns `None` if the rows are ragged or
    /// don't match `width × height`.
    pub fn from_rows(width: u32, height: u32, rows: Vec<Vec<Pixel>>) -> Option<Self> {
        if rows.len() != height as usize || rows.iter().any(|r| r.len() != width as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Read a cell. Out-of-grid reads return `None` (transparent).
    pub fn get(&self, x: i32, y: i32) -> Pixel {
        self.index(x, y).and_then(|i| self.cells[i])
    }

    /// Write a cell. Out-of-grid writes are ignored; returns whether the
    /// cell existed.
    pub fn set(&mut self, x: i32, y: i32, pixel: Pixel) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = pixel;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> + '_ {
        self.cells.chunks(self.width.max(1) as usize)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Pixel] {
        &self.cells
    }
}

// ============================================================================
// LAYER
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    /// 0 = invisible, 255 = fully opaque.
    pub opacity: u8,
    pub pixels: PixelGrid,
}

impl Layer {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            visible: true,
            opacity: 255,
            pixels: PixelGrid::new(width, height),
        }
    }

    /// Independent duplicate for the "Duplicate Layer" action.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.name = format!("{} copy", self.name);
        copy
    }
}

// ============================================================================
// CANVAS STATE: the live layer stack plus the active-layer pointer
// ============================================================================

/// Ordered layer stack (index 0 = bottom) with the layer all paint operations
/// target. Invariant: `layers` is never empty and
/// `active_layer_index < layers.len()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanvasState {
    pub layers: Vec<Layer>,
    pub active_layer_index: usize,
    pub width: u32,
    pub height: u32,
}

impl CanvasState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layers: vec![Layer::new("Background", width, height)],
            active_layer_index: 0,
            width,
            height,
        }
    }

    /// Rebuild a canvas from an existing layer stack. Returns `None` when the
    /// stack is empty or a layer doesn't match the grid size.
    pub fn from_layers(width: u32, height: u32, layers: Vec<Layer>) -> Option<Self> {
        if layers.is_empty()
            || layers
                .iter()
                .any(|l| l.pixels.width() != width || l.pixels.height() != height)
        {
            return None;
        }
        Some(Self {
            layers,
            active_layer_index: 0,
            width,
            height,
        })
    }

    pub fn active_layer(&self) -> &Layer {
        &self.layers[self.active_layer_index]
    }

    pub fn active_layer_mut(&mut self) -> &mut Layer {
        &mut self.layers[self.active_layer_index]
    }

    /// Replace the whole stack (frame swap, history restore) and clamp the
    /// active index into range. An empty stack is rejected.
    pub fn replace_layers(&mut self, layers: Vec<Layer>, active_layer_index: usize) -> bool {
        if layers.is_empty() {
            return false;
        }
        self.layers = layers;
        self.active_layer_index = active_layer_index.min(self.layers.len() - 1);
        true
    }

    fn clamp_active_index(&mut self) {
        self.active_layer_index = self.active_layer_index.min(self.layers.len() - 1);
    }

    /// Append an empty layer on top. The active index is left unchanged.
    pub fn add_layer(&mut self, name: impl Into<String>) -> usize {
        self.layers.push(Layer::new(name, self.width, self.height));
        self.layers.len() - 1
    }

    /// Name for the next user-created layer (`Layer N`).
    pub fn next_layer_name(&self) -> String {
        format!("Layer {}", self.layers.len())
    }

    /// Remove a layer. Rejected when it is the last one or `index` is out of range.
    pub fn delete_layer(&mut self, index: usize) -> bool {
        if self.layers.len() <= 1 || index >= self.layers.len() {
            return false;
        }
        self.layers.remove(index);
        self.clamp_active_index();
        true
    }

    /// Insert a deep copy of `index` directly above it and make it active.
    pub fn duplicate_layer(&mut self, index: usize) -> bool {
        let Some(src) = self.layers.get(index) else {
            return false;
        };
        let copy = src.duplicate();
        self.layers.insert(index + 1, copy);
        self.active_layer_index = index + 1;
        true
    }

    pub fn select_active(&mut self, index: usize) -> bool {
        if index >= self.layers.len() {
            return false;
        }
        self.active_layer_index = index;
        true
    }

    /// Move a layer within the stack. The active index keeps pointing at the
    /// same layer, whether that layer is the one moved or one it shifts past.
    pub fn move_layer(&mut self, from: usize, to: usize) -> bool {
        let len = self.layers.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        let active = self.active_layer_index;
        self.active_layer_index = if active == from {
            to
        } else if from < active && active <= to {
            active - 1
        } else if to <= active && active < from {
            active + 1
        } else {
            active
        };
        self.clamp_active_index();
        true
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) -> bool {
        match self.layers.get_mut(index) {
            Some(layer) if layer.visible != visible => {
                layer.visible = visible;
                true
            }
            _ => false,
        }
    }

    pub fn set_opacity(&mut self, index: usize, opacity: u8) -> bool {
        match self.layers.get_mut(index) {
            Some(layer) if layer.opacity != opacity => {
                layer.opacity = opacity;
                true
            }
            _ => false,
        }
    }

    pub fn rename_layer(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.layers.get_mut(index) {
            Some(layer) => {
                layer.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Reset a layer to all-empty. Returns false if it already was.
    pub fn clear_layer(&mut self, index: usize) -> bool {
        match self.layers.get_mut(index) {
            Some(layer) if !layer.pixels.is_empty() => {
                layer.pixels.clear();
                true
            }
            _ => false,
        }
    }

    /// Set one cell on `layer`. Out-of-grid coordinates and bad layer
    /// indices are silently ignored.
    pub fn paint_pixel(&mut self, layer: usize, x: i32, y: i32, color: Rgb<u8>) -> bool {
        match self.layers.get_mut(layer) {
            Some(l) => l.pixels.set(x, y, Some(color)),
            None => false,
        }
    }
}

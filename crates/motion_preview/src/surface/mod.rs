//! Drawing surface and its backing resolution

pub mod canvas;
pub mod color;

pub use canvas::{Canvas, CanvasError, SharedCanvas, Transform, DEFAULT_LINE_WIDTH, DEFAULT_STYLE, MAX_PATH_POINTS, MAX_SAVE_DEPTH};
pub use color::Color;

use crate::host::ContainerLayout;

/// Backing store and logical size of the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDimensions {
    pub backing_width: u32,
    pub backing_height: u32,
    pub scale_factor: f64,
    pub logical_width: f64,
    pub logical_height: f64,
}

impl Default for SurfaceDimensions {
    fn default() -> Self {
        Self {
            backing_width: 0,
            backing_height: 0,
            scale_factor: 1.0,
            logical_width: 0.0,
            logical_height: 0.0,
        }
    }
}

impl SurfaceDimensions {
    /// Computes the dimensions for a container of the given logical size.
    pub fn from_layout(logical_width: f64, logical_height: f64, pixel_ratio: f64) -> Self {
        let scale_factor = if pixel_ratio.is_finite() && pixel_ratio > 0.0 { pixel_ratio } else { 1.0 };
        let sanitize = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let logical_width = sanitize(logical_width);
        let logical_height = sanitize(logical_height);
        Self {
            backing_width: (logical_width * scale_factor).floor() as u32,
            backing_height: (logical_height * scale_factor).floor() as u32,
            scale_factor,
            logical_width,
            logical_height,
        }
    }

    /// Size shown in the status readout, e.g. `400x300`.
    pub fn logical_label(&self) -> String {
        format!("{}x{}", self.logical_width.round(), self.logical_height.round())
    }
}

/// Keeps the canvas backing store in sync with the on-screen container.
pub struct SurfaceManager {
    layout: Option<Box<dyn ContainerLayout>>,
    canvas: Option<SharedCanvas>,
    dimensions: SurfaceDimensions,
}

impl Default for SurfaceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceManager {
    pub fn new() -> Self {
        Self {
            layout: None,
            canvas: None,
            dimensions: SurfaceDimensions::default(),
        }
    }

    /// Binds the container and the canvas, then sizes the canvas.
    pub fn attach(&mut self, layout: Box<dyn ContainerLayout>, canvas: SharedCanvas) -> SurfaceDimensions {
        self.layout = Some(layout);
        self.canvas = Some(canvas);
        self.on_resize()
    }

    pub fn is_attached(&self) -> bool {
        self.layout.is_some() && self.canvas.is_some()
    }

    /// Re-reads the container size and pixel ratio.
    ///
    /// The backing store is reallocated only if its size changed; the scale
    /// transform is always reset to identity before the pixel ratio is applied.
    pub fn on_resize(&mut self) -> SurfaceDimensions {
        let (Some(layout), Some(canvas)) = (&self.layout, &self.canvas) else {
            return self.dimensions;
        };

        let (width, height) = layout.logical_size();
        let dims = SurfaceDimensions::from_layout(width, height, layout.device_pixel_ratio());

        let mut canvas = canvas.lock();
        if canvas.width() != dims.backing_width || canvas.height() != dims.backing_height {
            log::debug!(
                "resizing preview surface to {}x{} (scale {})",
                dims.backing_width,
                dims.backing_height,
                dims.scale_factor
            );
            canvas.resize(dims.backing_width, dims.backing_height);
        }
        canvas.set_base_scale(dims.scale_factor);
        self.dimensions = dims;
        dims
    }

    pub fn dimensions(&self) -> SurfaceDimensions {
        self.dimensions
    }
}

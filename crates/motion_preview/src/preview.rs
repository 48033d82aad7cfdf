//! The preview player: canvas, surface sizing and render loop wired together

use image::RgbaImage;

use crate::compiler::{LogEntry, PreviewSource};
use crate::host::{ContainerLayout, FrameHandle, FrameScheduler, TimeSource};
use crate::render_loop::{LoopState, RenderLoop};
use crate::surface::{Canvas, SharedCanvas, SurfaceDimensions, SurfaceManager};
use crate::PreviewOptions;

/// Readout shown under the preview.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewStatus {
    /// Seconds, rounded to two decimals
    pub elapsed: f64,
    pub logical_width: f64,
    pub logical_height: f64,
    pub playing: bool,
}

impl PreviewStatus {
    /// `1.25s  400x300`
    pub fn line(&self) -> String {
        format!("{}s  {}x{}", self.elapsed, self.logical_width.round(), self.logical_height.round())
    }
}

/// What the preview area shows on top of the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewView {
    Placeholder,
    Animating,
    Error { title: String, message: String },
}

pub struct Preview {
    canvas: SharedCanvas,
    surface: SurfaceManager,
    render_loop: RenderLoop,
}

impl Preview {
    pub fn new(
        layout: Box<dyn ContainerLayout>,
        scheduler: Box<dyn FrameScheduler>,
        time: Box<dyn TimeSource>,
        options: PreviewOptions,
    ) -> Self {
        let canvas = Canvas::shared(0, 0);
        let mut surface = SurfaceManager::new();
        surface.attach(layout, canvas.clone());
        Self {
            canvas,
            surface,
            render_loop: RenderLoop::new(time, scheduler, options),
        }
    }

    pub fn set_source(&mut self, source: impl Into<PreviewSource>) {
        self.render_loop.set_source(source.into());
    }

    pub fn play(&mut self) {
        self.render_loop.play();
    }

    pub fn pause(&mut self) {
        self.render_loop.pause();
    }

    pub fn toggle_play(&mut self) {
        if self.render_loop.is_running() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn reset(&mut self) {
        self.render_loop.reset();
    }

    /// Frame callback from the scheduler.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        let dimensions = self.surface.dimensions();
        self.render_loop.tick(handle, &self.canvas, dimensions)
    }

    /// Container size or pixel ratio changed.
    pub fn on_resize(&mut self) -> SurfaceDimensions {
        self.surface.on_resize()
    }

    pub fn dimensions(&self) -> SurfaceDimensions {
        self.surface.dimensions()
    }

    pub fn status(&self) -> PreviewStatus {
        let dimensions = self.surface.dimensions();
        PreviewStatus {
            elapsed: (self.render_loop.elapsed() * 100.0).round() / 100.0,
            logical_width: dimensions.logical_width,
            logical_height: dimensions.logical_height,
            playing: self.render_loop.is_running(),
        }
    }

    pub fn status_line(&self) -> String {
        self.status().line()
    }

    pub fn view(&self) -> PreviewView {
        match self.render_loop.state() {
            LoopState::Failed(err) => PreviewView::Error {
                title: err.title().to_string(),
                message: err.message().to_string(),
            },
            _ if self.render_loop.source().is_empty() => PreviewView::Placeholder,
            _ => PreviewView::Animating,
        }
    }

    pub fn state(&self) -> &LoopState {
        self.render_loop.state()
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn canvas(&self) -> &SharedCanvas {
        &self.canvas
    }

    /// Copy of the backing store.
    pub fn snapshot(&self) -> RgbaImage {
        self.canvas.lock().pixels().clone()
    }

    pub fn log(&self) -> Vec<LogEntry> {
        self.render_loop.log().entries()
    }
}

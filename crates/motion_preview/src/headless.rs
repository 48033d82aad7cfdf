//! Runs a preview without a display, stepping simulated time per frame

use image::RgbaImage;

use crate::host::{FixedLayout, ManualTime, QueuedScheduler};
use crate::preview::Preview;
use crate::PreviewOptions;

/// Drives a [`Preview`] with [`ManualTime`] and a [`QueuedScheduler`].
pub struct HeadlessRunner {
    time: ManualTime,
    scheduler: QueuedScheduler,
    layout: FixedLayout,
    preview: Preview,
    frame_ms: f64,
}

impl HeadlessRunner {
    pub fn new(width: f64, height: f64, pixel_ratio: f64, fps: u32, options: PreviewOptions) -> Self {
        let time = ManualTime::new();
        let scheduler = QueuedScheduler::new();
        let layout = FixedLayout::new(width, height, pixel_ratio);
        let preview = Preview::new(Box::new(layout.clone()), Box::new(scheduler.clone()), Box::new(time.clone()), options);
        Self {
            time,
            scheduler,
            layout,
            preview,
            frame_ms: 1000.0 / f64::from(fps.max(1)),
        }
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut Preview {
        &mut self.preview
    }

    pub fn time(&self) -> &ManualTime {
        &self.time
    }

    /// Milliseconds between two frames.
    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }

    /// Changes the container size and notifies the preview.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.layout.set_size(width, height);
        self.preview.on_resize();
    }

    /// Delivers the pending frame, if any, then advances time by one frame.
    /// Returns true if a frame was drawn.
    pub fn step(&mut self) -> bool {
        let drawn = match self.scheduler.take_next() {
            Some(handle) => self.preview.on_frame(handle),
            None => false,
        };
        self.time.advance(self.frame_ms);
        drawn
    }

    /// Steps `frames` times and collects a snapshot after every drawn frame.
    /// Stops early once the loop stops scheduling.
    pub fn capture(&mut self, frames: usize) -> Vec<RgbaImage> {
        let mut snapshots = Vec::new();
        for _ in 0..frames {
            if self.scheduler.pending_count() == 0 {
                break;
            }
            if self.step() {
                snapshots.push(self.preview.snapshot());
            }
        }
        snapshots
    }
}

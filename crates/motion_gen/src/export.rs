//! Writes rendered preview frames to GIF or PNG.
//!
//! Frames come from the preview surface with a transparent background. They
//! are composited onto the preview background color first, then quantized to
//! a 255 color palette per frame.

use std::io::Write;
use std::path::Path;

use image::{Rgb, RgbImage, RgbaImage};
use thiserror::Error;

/// Background the preview is shown on.
pub const BACKGROUND: [u8; 3] = [0x03, 0x07, 0x12];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No frames to encode")]
    NoFrames,

    #[error("Frame size {0}x{1} can't be encoded as GIF")]
    FrameTooLarge(u32, u32),

    #[error("{0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// How many times the GIF animation should repeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepeatCount {
    #[default]
    Infinite,
    Once,
    Times(u16),
}

impl RepeatCount {
    /// Maps a `--repeat` value: none loops forever, 0 plays once.
    pub fn from_loops(loops: Option<u16>) -> Self {
        match loops {
            None => RepeatCount::Infinite,
            Some(0) => RepeatCount::Once,
            Some(n) => RepeatCount::Times(n),
        }
    }
}

/// Animated GIF writer for preview snapshots.
pub struct GifExporter {
    pub frame_ms: u32,
    pub repeat: RepeatCount,
}

impl GifExporter {
    pub fn new(fps: u32) -> Self {
        Self {
            frame_ms: 1000 / fps.max(1),
            repeat: RepeatCount::Infinite,
        }
    }

    pub fn set_repeat(&mut self, repeat: RepeatCount) {
        self.repeat = repeat;
    }

    pub fn export_to_file(&self, path: impl AsRef<Path>, frames: &[RgbaImage]) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        self.export_to_writer(file, frames)
    }

    pub fn export_to_writer<W: Write>(&self, writer: W, frames: &[RgbaImage]) -> Result<()> {
        let Some(first) = frames.first() else {
            return Err(ExportError::NoFrames);
        };
        let (width, height) = first.dimensions();
        let (Ok(gif_width), Ok(gif_height)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(ExportError::FrameTooLarge(width, height));
        };

        let mut encoder =
            gif::Encoder::new(writer, gif_width, gif_height, &[]).map_err(|e| ExportError::Encode(format!("GIF encoder creation failed: {e}")))?;

        match self.repeat {
            RepeatCount::Infinite => encoder
                .set_repeat(gif::Repeat::Infinite)
                .map_err(|e| ExportError::Encode(format!("Failed to set repeat: {e}")))?,
            RepeatCount::Once => {}
            RepeatCount::Times(n) => encoder
                .set_repeat(gif::Repeat::Finite(n))
                .map_err(|e| ExportError::Encode(format!("Failed to set repeat: {e}")))?,
        }

        // GIF delays are in centiseconds
        let delay_cs = (self.frame_ms / 10).max(1) as u16;
        for frame in frames {
            if frame.dimensions() != (width, height) {
                return Err(ExportError::Encode("Frames differ in size".to_string()));
            }
            let (palette, indexed_pixels) = quantize(&flatten(frame))?;

            let mut gif_frame = gif::Frame::default();
            gif_frame.width = gif_width;
            gif_frame.height = gif_height;
            gif_frame.delay = delay_cs;
            gif_frame.dispose = gif::DisposalMethod::Keep;
            gif_frame.palette = Some(palette);
            gif_frame.buffer = std::borrow::Cow::Owned(indexed_pixels);

            encoder
                .write_frame(&gif_frame)
                .map_err(|e| ExportError::Encode(format!("Failed to write GIF frame: {e}")))?;
        }
        Ok(())
    }
}

/// Saves a single frame as PNG, keeping transparency.
pub fn export_png(path: impl AsRef<Path>, frame: &RgbaImage) -> Result<()> {
    frame.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

/// Composites a frame onto [`BACKGROUND`].
pub fn flatten(frame: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        let [r, g, b, a] = frame.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let mix = |src: u8, dst: u8| ((u32::from(src) * alpha + u32::from(dst) * (255 - alpha) + 127) / 255) as u8;
        Rgb([mix(r, BACKGROUND[0]), mix(g, BACKGROUND[1]), mix(b, BACKGROUND[2])])
    })
}

/// Quantizes to at most 255 colors. Returns the flat RGB palette and indices.
fn quantize(img: &RgbImage) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut pipeline = quantette::ImagePipeline::try_from(img).map_err(|e| ExportError::Encode(format!("Quantization pipeline error: {e}")))?;
    let (palette, indexed_pixels) = pipeline.palette_size(255).indexed_palette();
    let flat_palette: Vec<u8> = palette.iter().flat_map(|c| [c.red, c.green, c.blue]).collect();
    Ok((flat_palette, indexed_pixels))
}

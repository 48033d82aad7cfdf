//! Generate, store, show and render artifacts

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use image::RgbaImage;
use motion_preview::{GeneratedContent, HeadlessRunner, PreviewOptions, PreviewSource, PreviewView};

use crate::export::{export_png, GifExporter, RepeatCount};
use crate::generator::Generator;
use crate::settings::RenderSettings;

pub const SCENE_FILE: &str = "scene.tsx";
pub const PREVIEW_FILE: &str = "preview.lua";
pub const CONTENT_FILE: &str = "content.json";

/// Asks the generator for new artifacts and stores them in `out_dir`.
pub async fn generate(generator: &dyn Generator, prompt: &str, out_dir: &Path) -> anyhow::Result<GeneratedContent> {
    let content = generator.generate(prompt).await?;
    write_artifacts(&content, out_dir)?;
    Ok(content)
}

pub fn write_artifacts(content: &GeneratedContent, dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    fs::write(dir.join(SCENE_FILE), &content.motion_canvas_code)?;
    fs::write(dir.join(PREVIEW_FILE), &content.preview_code)?;
    fs::write(dir.join(CONTENT_FILE), serde_json::to_string_pretty(content)?)?;
    log::info!("wrote artifacts to {}", dir.display());
    Ok(())
}

/// Reads previously stored artifacts. `None` if nothing was generated yet.
pub fn load_artifacts(dir: &Path) -> anyhow::Result<Option<GeneratedContent>> {
    let path = dir.join(CONTENT_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let content = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(content))
}

/// Reads a preview routine from a `.lua` file or from a stored `content.json`.
pub fn load_preview_source(path: &Path) -> anyhow::Result<PreviewSource> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        let content: GeneratedContent = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        return Ok(content.preview_source());
    }
    Ok(PreviewSource::new(text))
}

/// Result of a headless preview run.
pub struct RenderOutcome {
    pub frames: Vec<RgbaImage>,
    pub status_line: String,
    pub view: PreviewView,
}

/// Plays `source` with simulated time for the configured duration. A failing
/// routine is not an error here, it shows up in the outcome's view.
pub fn render(source: PreviewSource, settings: &RenderSettings, options: PreviewOptions) -> anyhow::Result<RenderOutcome> {
    settings.validate().context("invalid render settings")?;
    let mut runner = HeadlessRunner::new(settings.width, settings.height, settings.pixel_ratio, settings.fps, options);
    runner.preview_mut().set_source(source);
    let frames = runner.capture(settings.frame_count());
    Ok(RenderOutcome {
        frames,
        status_line: runner.preview().status_line(),
        view: runner.preview().view(),
    })
}

/// Writes the frames as GIF, or the last frame as PNG, based on the extension.
pub fn save_render(outcome: &RenderOutcome, path: &Path, fps: u32, repeat: RepeatCount) -> anyhow::Result<()> {
    let ext = path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "gif" => {
            let mut exporter = GifExporter::new(fps);
            exporter.set_repeat(repeat);
            exporter.export_to_file(path, &outcome.frames)?;
        }
        "png" => {
            let Some(frame) = outcome.frames.last() else {
                bail!("no frame was rendered");
            };
            export_png(path, frame)?;
        }
        _ => bail!("unsupported output format '{ext}', use .gif or .png"),
    }
    Ok(())
}

/// Text shown for the overlay state of the preview.
pub fn describe_view(view: &PreviewView) -> String {
    match view {
        PreviewView::Placeholder => "No preview code.".to_string(),
        PreviewView::Animating => "Playing".to_string(),
        PreviewView::Error { title, message } => format!("{title}\n{message}"),
    }
}

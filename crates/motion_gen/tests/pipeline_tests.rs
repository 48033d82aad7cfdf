use std::path::PathBuf;

use async_trait::async_trait;
use motion_gen::export::RepeatCount;
use motion_gen::generator::{parse_response, GenerateError, Generator};
use motion_gen::pipeline::{self, CONTENT_FILE, PREVIEW_FILE, SCENE_FILE};
use motion_gen::settings::RenderSettings;
use motion_gen::Settings;
use motion_preview::{GeneratedContent, PreviewOptions, PreviewSource, PreviewView};

struct FixedGenerator(GeneratedContent);

#[async_trait]
impl Generator for FixedGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedContent, GenerateError> {
        motion_gen::generator::validate_prompt(prompt)?;
        Ok(self.0.clone())
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("motion_gen_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn content() -> GeneratedContent {
    GeneratedContent {
        motion_canvas_code: "export default makeScene2D(function* (view) {});".to_string(),
        preview_code: "ctx:fillRect(0, 0, width, height)".to_string(),
        explanation: "Fills the frame.".to_string(),
    }
}

#[tokio::test]
async fn test_generate_writes_artifacts() {
    let dir = scratch_dir("generate");
    let generator = FixedGenerator(content());
    let result = pipeline::generate(&generator, "a white frame", &dir).await.unwrap();
    assert_eq!(result, content());

    assert_eq!(std::fs::read_to_string(dir.join(PREVIEW_FILE)).unwrap(), content().preview_code);
    assert_eq!(std::fs::read_to_string(dir.join(SCENE_FILE)).unwrap(), content().motion_canvas_code);
    assert!(dir.join(CONTENT_FILE).exists());
    assert_eq!(pipeline::load_artifacts(&dir).unwrap(), Some(content()));

    let source = pipeline::load_preview_source(&dir.join(CONTENT_FILE)).unwrap();
    assert_eq!(source.as_str(), content().preview_code);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_blank_prompt_writes_nothing() {
    let dir = scratch_dir("blank");
    let generator = FixedGenerator(content());
    assert!(pipeline::generate(&generator, "   ", &dir).await.is_err());
    assert!(!dir.exists());
}

#[test]
fn test_missing_artifacts() {
    let dir = scratch_dir("missing");
    assert_eq!(pipeline::load_artifacts(&dir).unwrap(), None);
}

#[test]
fn test_parse_response() {
    let inner = serde_json::to_string(&content()).unwrap();
    let body = serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": inner }], "role": "model" } }]
    })
    .to_string();
    assert_eq!(parse_response(&body).unwrap(), content());
}

#[test]
fn test_parse_response_errors() {
    let empty = r#"{"candidates": []}"#;
    assert_eq!(parse_response(empty).unwrap_err().to_string(), "No response from Gemini.");

    let not_json = serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": "here is your animation" }] } }]
    })
    .to_string();
    assert_eq!(parse_response(&not_json).unwrap_err().to_string(), "Invalid JSON response from AI model.");

    let missing_field = serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": "{\"previewCode\": \"\"}" }] } }]
    })
    .to_string();
    assert!(matches!(parse_response(&missing_field), Err(GenerateError::InvalidJson)));
}

#[test]
fn test_render_and_export() {
    let settings = RenderSettings {
        width: 32.0,
        height: 24.0,
        pixel_ratio: 1.0,
        fps: 10,
        seconds: 0.5,
    };
    let outcome = pipeline::render(PreviewSource::new("ctx.fillStyle = '#00ff00'\nctx:fillRect(0, 0, width, height)"), &settings, PreviewOptions::default()).unwrap();
    assert_eq!(outcome.frames.len(), 5);
    assert_eq!(outcome.view, PreviewView::Animating);
    assert_eq!(outcome.status_line, "0.5s  32x24");

    let dir = scratch_dir("render");
    std::fs::create_dir_all(&dir).unwrap();
    let gif = dir.join("preview.gif");
    pipeline::save_render(&outcome, &gif, settings.fps, RepeatCount::Infinite).unwrap();
    let bytes = std::fs::read(&gif).unwrap();
    assert!(bytes.starts_with(b"GIF89a"));

    let png = dir.join("preview.png");
    pipeline::save_render(&outcome, &png, settings.fps, RepeatCount::Infinite).unwrap();
    let image = image::open(&png).unwrap().to_rgba8();
    assert_eq!(image.get_pixel(0, 0).0, [0, 255, 0, 255]);

    assert!(pipeline::save_render(&outcome, &dir.join("preview.bmp"), settings.fps, RepeatCount::Infinite).is_err());

    let once = dir.join("once.gif");
    pipeline::save_render(&outcome, &once, settings.fps, RepeatCount::Once).unwrap();
    let once_bytes = std::fs::read(&once).unwrap();
    assert!(bytes.windows(11).any(|w| w == b"NETSCAPE2.0"));
    assert!(!once_bytes.windows(11).any(|w| w == b"NETSCAPE2.0"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_render_failure_is_reported() {
    let outcome = pipeline::render(PreviewSource::new("error('boom')"), &RenderSettings::default(), PreviewOptions::default()).unwrap();
    assert!(outcome.frames.is_empty());
    assert_eq!(pipeline::describe_view(&outcome.view), "Runtime Error\nboom");
}

#[test]
fn test_render_rejects_absurd_settings() {
    let source = PreviewSource::new("ctx:fillRect(0, 0, width, height)");
    for settings in [
        RenderSettings {
            seconds: 1e300,
            ..Default::default()
        },
        RenderSettings {
            seconds: f64::NAN,
            ..Default::default()
        },
        RenderSettings {
            width: 1e12,
            ..Default::default()
        },
    ] {
        let err = pipeline::render(source.clone(), &settings, PreviewOptions::default()).err().unwrap();
        assert!(err.to_string().contains("invalid render settings"), "{err}");
    }
}

#[test]
fn test_settings_store_and_load() {
    let dir = scratch_dir("settings");
    let path = dir.join("settings.toml");
    let mut settings = Settings::default();
    settings.render.fps = 12;
    settings.preview.instruction_budget = 7;
    settings.store_to(&path).unwrap();

    assert_eq!(Settings::load_from(&path), settings);
    assert!(!dir.join(".settings.toml.tmp").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_broken_settings_fall_back_to_defaults() {
    let dir = scratch_dir("broken");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("settings.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();
    assert_eq!(Settings::load_from(&path), Settings::default());
    let _ = std::fs::remove_dir_all(&dir);
}

use async_trait::async_trait;
use motion_preview::GeneratedContent;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::settings::GeneratorSettings;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const SYSTEM_INSTRUCTION: &str = "\
You are an expert Motion Graphics Engineer specializing in Motion Canvas (TypeScript) and 2D canvas drawing.

Your goal is to accept a natural language description of an animation and return two things:
1. A valid, production-ready Motion Canvas (TSX) code snippet using @motion-canvas/core and @motion-canvas/2d.
2. A standalone Lua 5.4 function body that approximates this animation for an immediate lightweight preview.

For the 'previewCode', do not include the function signature, just the body.
The body will be executed inside a function with the parameters (ctx, width, height, t) where:
- ctx: a 2D drawing context with the HTML5 canvas method names, called with Lua method syntax,
  e.g. ctx:fillRect(0, 0, width, height), ctx:beginPath(), ctx:arc(x, y, r, 0, 2 * math.pi), ctx:fill().
  Properties are plain fields: ctx.fillStyle = '#ff0000', ctx.lineWidth = 4.
- width: number (canvas width)
- height: number (canvas height)
- t: number (time in seconds, running continuously)

Only the math, string and table libraries are available.
Draw the frame for time 't'. Make the animation loop seamlessly if possible or just play through.";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("API Key is missing. Please set the API_KEY environment variable.")]
    MissingApiKey,

    #[error("Please describe the animation you want.")]
    EmptyPrompt,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No response from Gemini.")]
    NoResponse,

    #[error("Invalid JSON response from AI model.")]
    InvalidJson,
}

/// Turns a prompt into the scene script and preview routine.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedContent, GenerateError>;
}

pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, GenerateError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerateError::MissingApiKey);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
        })
    }

    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self, GenerateError> {
        let Some(api_key) = &settings.api_key else {
            return Err(GenerateError::MissingApiKey);
        };
        Self::new(api_key.clone(), settings.model.clone())
    }

    fn url(&self) -> String {
        format!("{GEMINI_ENDPOINT}/{}:generateContent", self.model)
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedContent, GenerateError> {
        let prompt = validate_prompt(prompt)?;
        log::info!("requesting animation from {}", self.model);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            log::error!("Gemini request failed with {status}");
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }
}

/// Rejects blank prompts before any request is made.
pub fn validate_prompt(prompt: &str) -> Result<&str, GenerateError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        Err(GenerateError::EmptyPrompt)
    } else {
        Ok(prompt)
    }
}

/// Request body for `generateContent` with a JSON response schema.
pub fn build_request(prompt: &str) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
        "contents": [{
            "role": "user",
            "parts": [{ "text": format!("Create an animation for: {prompt}") }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "motionCanvasCode": {
                        "type": "STRING",
                        "description": "The full TSX code for a Motion Canvas project file (e.g., scene.tsx). Should include imports from @motion-canvas/2d etc."
                    },
                    "previewCode": {
                        "type": "STRING",
                        "description": "Lua function body for the preview. Vars available: ctx, width, height, t. Example: 'ctx:clearRect(0, 0, width, height) ctx.fillStyle = \"red\" ...'"
                    },
                    "explanation": {
                        "type": "STRING",
                        "description": "A brief explanation of what the code does."
                    }
                },
                "required": ["motionCanvasCode", "previewCode", "explanation"]
            }
        }
    })
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Extracts the generated artifacts from a `generateContent` response body.
pub fn parse_response(body: &str) -> Result<GeneratedContent, GenerateError> {
    let response: GenerateResponse = serde_json::from_str(body).map_err(|_| GenerateError::NoResponse)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerateError::NoResponse);
    }

    serde_json::from_str(&text).map_err(|err| {
        log::error!("Failed to parse JSON response: {err}\n{text}");
        GenerateError::InvalidJson
    })
}

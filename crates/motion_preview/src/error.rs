//! Error types for the preview runtime

use regex::Regex;
use thiserror::Error;

lazy_static::lazy_static! {
    static ref LOCATION_REGEX: Regex = Regex::new(r"^(?:runtime error: |syntax error: )?preview:(\d+): ").unwrap();
}

/// Chunk name used for every compiled preview routine.
pub(crate) const CHUNK_NAME: &str = "=preview";

/// Failure of a preview routine.
///
/// Both kinds latch the render loop into the failed state; the UI shows them
/// the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    /// The snippet is not valid code.
    #[error("{message}")]
    Compile { message: String, line: Option<u32> },

    /// The routine raised an error while drawing a frame.
    #[error("{message}")]
    Runtime { message: String, line: Option<u32> },
}

impl PreviewError {
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile {
            message: message.into(),
            line: None,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
            line: None,
        }
    }

    /// Error raised while loading a chunk.
    pub(crate) fn from_compile(err: &mlua::Error) -> Self {
        let (message, line) = clean_message(&root_message(err));
        Self::Compile { message, line }
    }

    /// Error raised while running a chunk.
    pub(crate) fn from_runtime(err: &mlua::Error) -> Self {
        let (message, line) = clean_message(&root_message(err));
        Self::Runtime { message, line }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Compile { message, .. } | Self::Runtime { message, .. } => message,
        }
    }

    /// Source line of the failure, if the interpreter reported one.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Compile { line, .. } | Self::Runtime { line, .. } => *line,
        }
    }

    pub fn is_compile_error(&self) -> bool {
        matches!(self, Self::Compile { .. })
    }

    /// Heading shown in the error overlay.
    pub fn title(&self) -> &'static str {
        "Runtime Error"
    }
}

/// Unwraps callback and context layers down to the error that was raised.
fn root_message(err: &mlua::Error) -> String {
    match err {
        mlua::Error::CallbackError { cause, .. } => root_message(cause),
        mlua::Error::WithContext { cause, .. } => root_message(cause),
        mlua::Error::RuntimeError(msg) | mlua::Error::MemoryError(msg) => msg.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Strips the traceback and the `preview:N:` prefix, returning the line separately.
fn clean_message(raw: &str) -> (String, Option<u32>) {
    let first = raw.split("\nstack traceback:").next().unwrap_or(raw).trim();
    if let Some(caps) = LOCATION_REGEX.captures(first) {
        let line = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let rest = first[caps.get(0).map_or(0, |m| m.end())..].to_string();
        return (rest, line);
    }
    (first.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_location_and_traceback() {
        let (msg, line) = clean_message("preview:3: boom\nstack traceback:\n\t[C]: in function 'error'");
        assert_eq!(msg, "boom");
        assert_eq!(line, Some(3));
    }

    #[test]
    fn test_message_without_location() {
        let (msg, line) = clean_message("instruction budget exceeded");
        assert_eq!(msg, "instruction budget exceeded");
        assert_eq!(line, None);
    }

    #[test]
    fn test_callback_error_unwraps_cause() {
        let err = mlua::Error::CallbackError {
            traceback: "stack traceback:".to_string(),
            cause: std::sync::Arc::new(mlua::Error::RuntimeError("invalid radius".to_string())),
        };
        let err = PreviewError::from_runtime(&err);
        assert_eq!(err.message(), "invalid radius");
        assert!(!err.is_compile_error());
        assert_eq!(err.title(), "Runtime Error");
    }
}

pub mod export;
pub use export::{ExportError, GifExporter, RepeatCount};

pub mod generator;
pub use generator::{GeminiGenerator, GenerateError, Generator};

pub mod pipeline;

pub mod settings;
pub use settings::Settings;

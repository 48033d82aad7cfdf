pub mod artifact;
pub use artifact::{GeneratedContent, PLACEHOLDER_SCENE};

pub mod clock;
pub use clock::FrameClock;

pub mod compiler;
pub use compiler::{CompiledRoutine, LogEntry, PreviewSource, RoutineCompiler, ScriptLog};

pub mod error;
pub use error::PreviewError;

pub mod headless;
pub use headless::HeadlessRunner;

pub mod host;
pub use host::{ContainerLayout, FixedLayout, FrameHandle, FrameScheduler, ManualTime, QueuedScheduler, SystemTime, TimeSource};

pub mod options;
pub use options::PreviewOptions;

pub mod preview;
pub use preview::{Preview, PreviewStatus, PreviewView};

pub mod render_loop;
pub use render_loop::{LoopState, RenderLoop};

pub mod surface;
pub use surface::{Canvas, CanvasError, Color, SharedCanvas, SurfaceDimensions, SurfaceManager};

//! Turns preview snippets into callable drawing routines
//!
//! A snippet is the body of a function `(ctx, width, height, t)`. It is
//! compiled into its own sandboxed Lua state with only the pure standard
//! libraries, a private global table and an optional per-frame instruction
//! budget, so a broken or hostile snippet can fail a frame but never reach
//! the host.

mod lua_runtime;

pub mod lua_context;
pub use lua_context::LuaContext;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mlua::{Function, Lua};
use parking_lot::Mutex;

use crate::error::CHUNK_NAME;
use crate::surface::SharedCanvas;
use crate::{PreviewError, PreviewOptions};

/// Binds the four routine parameters. Kept on the snippet's first line so
/// reported line numbers match the snippet.
const PARAMETER_PROLOGUE: &str = "local ctx, width, height, t = ...; ";

/// Maximum number of log lines kept per routine
const MAX_LOG_ENTRIES: usize = 1000;

/// Untrusted drawing snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewSource(String);

impl PreviewSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank snippets show the placeholder instead of running.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for PreviewSource {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for PreviewSource {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Log entry written by a routine through `log(...)` or `print(...)`
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub frame: u64,
    pub text: String,
}

#[derive(Default)]
struct LogState {
    frame: u64,
    entries: Vec<LogEntry>,
}

/// Log lines collected from routines. Clones share the same log.
#[derive(Clone, Default)]
pub struct ScriptLog {
    state: Arc<Mutex<LogState>>,
}

impl ScriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_frame(&self, frame: u64) {
        self.state.lock().frame = frame;
    }

    pub(crate) fn push(&self, text: String) {
        let mut state = self.state.lock();
        if state.entries.len() < MAX_LOG_ENTRIES {
            let frame = state.frame;
            state.entries.push(LogEntry { frame, text });
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.state.lock().entries.clone()
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.frame = 0;
    }
}

/// Drawing routine compiled from one [`PreviewSource`].
pub struct CompiledRoutine {
    function: Function,
    budget: Option<(Arc<AtomicU64>, u64)>,
    // Declared last so it outlives `function`.
    _lua: Lua,
}

impl CompiledRoutine {
    /// Runs the routine once against `canvas`. Lua instructions and canvas
    /// work draw from the same refilled budget.
    pub fn call(&self, canvas: &SharedCanvas, width: f64, height: f64, t: f64) -> Result<(), PreviewError> {
        canvas.lock().reset_work();
        let ctx = match &self.budget {
            Some((remaining, limit)) => {
                remaining.store(*limit, Ordering::Relaxed);
                LuaContext::with_budget(canvas.clone(), remaining.clone())
            }
            None => LuaContext::new(canvas.clone()),
        };
        self.function
            .call::<()>((ctx, width, height, t))
            .map_err(|err| PreviewError::from_runtime(&err))
    }
}

pub struct RoutineCompiler {
    options: PreviewOptions,
    log: ScriptLog,
}

impl RoutineCompiler {
    pub fn new(options: PreviewOptions, log: ScriptLog) -> Self {
        Self { options, log }
    }

    /// Compiles `source` into a fresh sandbox. Has no side effects besides
    /// allocating the interpreter.
    pub fn compile(&self, source: &PreviewSource) -> Result<CompiledRoutine, PreviewError> {
        let (lua, env) = lua_runtime::create_sandbox(&self.options, &self.log).map_err(|err| PreviewError::from_compile(&err))?;

        let text = format!("{PARAMETER_PROLOGUE}{}", source.as_str());
        let function = lua
            .load(text)
            .set_name(CHUNK_NAME)
            .set_environment(env)
            .into_function()
            .map_err(|err| PreviewError::from_compile(&err))?;

        let budget = if self.options.instruction_budget > 0 {
            let remaining = lua_runtime::install_budget(&lua).map_err(|err| PreviewError::from_compile(&err))?;
            Some((remaining, self.options.instruction_budget))
        } else {
            None
        };

        Ok(CompiledRoutine { function, budget, _lua: lua })
    }
}

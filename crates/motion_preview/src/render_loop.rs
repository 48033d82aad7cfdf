//! Per-frame driver for the compiled preview routine
//!
//! The loop keeps at most one frame request outstanding. Each delivered frame
//! reads the clock, compiles the current source if needed, prepares the
//! surface and calls the routine inside a failure boundary. A failed routine
//! latches the loop until it is reset or given a new source.

use crate::clock::FrameClock;
use crate::compiler::{CompiledRoutine, PreviewSource, RoutineCompiler, ScriptLog};
use crate::host::{FrameHandle, FrameScheduler, TimeSource};
use crate::surface::{SharedCanvas, SurfaceDimensions};
use crate::{PreviewError, PreviewOptions};

/// Playback state of the render loop
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    /// No source loaded, nothing is drawn.
    Idle,
    Running,
    Paused,
    /// The routine failed. Only `reset` or a new source leave this state.
    Failed(PreviewError),
}

pub struct RenderLoop {
    clock: FrameClock,
    scheduler: Box<dyn FrameScheduler>,
    pending: Option<FrameHandle>,

    source: PreviewSource,
    routine: Option<CompiledRoutine>,
    compiler: RoutineCompiler,
    log: ScriptLog,

    state: LoopState,
    frames_rendered: u64,
    invocations: u64,
}

impl RenderLoop {
    pub fn new(time: Box<dyn TimeSource>, scheduler: Box<dyn FrameScheduler>, options: PreviewOptions) -> Self {
        let log = ScriptLog::new();
        Self {
            clock: FrameClock::new(time),
            scheduler,
            pending: None,
            source: PreviewSource::default(),
            routine: None,
            compiler: RoutineCompiler::new(options, log.clone()),
            log,
            state: LoopState::Idle,
            frames_rendered: 0,
            invocations: 0,
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// The latched failure, if any.
    pub fn error(&self) -> Option<&PreviewError> {
        match &self.state {
            LoopState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn source(&self) -> &PreviewSource {
        &self.source
    }

    /// Animation time in seconds. Always zero while idle.
    pub fn elapsed(&self) -> f64 {
        if self.state == LoopState::Idle {
            0.0
        } else {
            self.clock.elapsed()
        }
    }

    pub fn log(&self) -> &ScriptLog {
        &self.log
    }

    /// The frame request currently outstanding.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Successful routine calls since the last reset.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Attempted routine calls since the last reset.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    pub fn play(&mut self) {
        match self.state {
            LoopState::Idle => {
                if self.source.is_empty() {
                    return;
                }
                self.clock.start();
            }
            LoopState::Paused => self.clock.resume(),
            LoopState::Running | LoopState::Failed(_) => return,
        }
        self.state = LoopState::Running;
        self.schedule();
    }

    pub fn pause(&mut self) {
        if self.state == LoopState::Running {
            self.clock.pause();
            self.cancel_pending();
            self.state = LoopState::Paused;
        }
    }

    /// Clears any failure, drops the compiled routine and restarts from zero.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.routine = None;
        self.log.clear();
        self.frames_rendered = 0;
        self.invocations = 0;

        if self.source.is_empty() {
            self.state = LoopState::Idle;
            return;
        }
        self.clock.reset();
        self.state = LoopState::Running;
        self.schedule();
    }

    /// Swaps in a new snippet. Safe in any state, including while running.
    pub fn set_source(&mut self, source: PreviewSource) {
        log::debug!("preview source changed ({} bytes)", source.as_str().len());
        self.source = source;
        self.reset();
    }

    /// Handles a delivered frame request. Returns true if a frame was drawn.
    ///
    /// Requests that are not the outstanding one are ignored.
    pub fn tick(&mut self, handle: FrameHandle, canvas: &SharedCanvas, dimensions: SurfaceDimensions) -> bool {
        if self.pending != Some(handle) {
            log::trace!("ignoring stale frame {handle:?}");
            return false;
        }
        self.pending = None;
        if self.state != LoopState::Running {
            return false;
        }

        let t = self.clock.elapsed();
        if self.routine.is_none() {
            match self.compiler.compile(&self.source) {
                Ok(routine) => {
                    log::debug!("compiled preview routine");
                    self.routine = Some(routine);
                }
                Err(err) => {
                    self.fail(err);
                    return false;
                }
            }
        }
        let Some(routine) = &self.routine else {
            return false;
        };

        canvas.lock().prepare_frame();
        self.invocations += 1;
        self.log.set_frame(self.invocations);
        let result = routine.call(canvas, dimensions.logical_width, dimensions.logical_height, t);

        match result {
            Ok(()) => {
                self.frames_rendered += 1;
                self.schedule();
                true
            }
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    /// Withdraws the outstanding frame request.
    pub fn shutdown(&mut self) {
        self.cancel_pending();
    }

    fn fail(&mut self, err: PreviewError) {
        match err.line() {
            Some(line) => log::warn!("preview routine failed at line {line}: {err}"),
            None => log::warn!("preview routine failed: {err}"),
        }
        self.cancel_pending();
        self.clock.pause();
        self.state = LoopState::Failed(err);
    }

    fn schedule(&mut self) {
        self.cancel_pending();
        self.pending = Some(self.scheduler.schedule_next_frame());
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

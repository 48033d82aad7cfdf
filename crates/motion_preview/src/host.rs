//! Host collaborators: time, frame scheduling and container layout
//!
//! The preview never talks to a platform directly. A browser host would back
//! these traits with `performance.now()`, `requestAnimationFrame` and a resize
//! observer; the types in this module back them in-process for the headless
//! renderer and the tests.

use std::sync::Arc;

use parking_lot::Mutex;
use web_time::Instant;

/// Monotonic millisecond clock.
pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// Wall clock time measured from construction.
pub struct SystemTime {
    origin: Instant,
}

impl Default for SystemTime {
    fn default() -> Self {
        Self { origin: Instant::now() }
    }
}

impl TimeSource for SystemTime {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Time that only moves when told to. Clones share the same clock.
#[derive(Clone, Default)]
pub struct ManualTime {
    now: Arc<Mutex<f64>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        *self.now.lock() += ms.max(0.0);
    }

    pub fn set(&self, ms: f64) {
        let mut now = self.now.lock();
        if ms > *now {
            *now = ms;
        }
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> f64 {
        *self.now.lock()
    }
}

/// Ticket for one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Display frame scheduling, the `requestAnimationFrame` seam.
pub trait FrameScheduler {
    /// Requests a callback for the next display frame.
    fn schedule_next_frame(&mut self) -> FrameHandle;

    /// Withdraws a request. Unknown or already delivered handles are ignored.
    fn cancel(&mut self, handle: FrameHandle);
}

#[derive(Default)]
struct FrameQueue {
    next_id: u64,
    pending: Vec<FrameHandle>,
    scheduled_total: u64,
}

/// Scheduler whose callbacks are delivered by whoever drains the queue.
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct QueuedScheduler {
    queue: Arc<Mutex<FrameQueue>>,
}

impl QueuedScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the oldest pending request.
    pub fn take_next(&self) -> Option<FrameHandle> {
        let mut queue = self.queue.lock();
        if queue.pending.is_empty() {
            None
        } else {
            Some(queue.pending.remove(0))
        }
    }

    pub fn pending(&self) -> Vec<FrameHandle> {
        self.queue.lock().pending.clone()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().pending.len()
    }

    /// Number of requests ever made, cancelled ones included.
    pub fn scheduled_total(&self) -> u64 {
        self.queue.lock().scheduled_total
    }
}

impl FrameScheduler for QueuedScheduler {
    fn schedule_next_frame(&mut self) -> FrameHandle {
        let mut queue = self.queue.lock();
        queue.next_id += 1;
        queue.scheduled_total += 1;
        let handle = FrameHandle(queue.next_id);
        queue.pending.push(handle);
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        self.queue.lock().pending.retain(|h| *h != handle);
    }
}

/// On-screen size of the element hosting the drawing surface.
pub trait ContainerLayout {
    /// Width and height in logical (CSS) pixels.
    fn logical_size(&self) -> (f64, f64);

    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f64;
}

#[derive(Debug, Clone, Copy)]
struct LayoutState {
    width: f64,
    height: f64,
    pixel_ratio: f64,
}

/// Layout with explicitly set values. Clones share the same state.
#[derive(Clone)]
pub struct FixedLayout {
    state: Arc<Mutex<LayoutState>>,
}

impl FixedLayout {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(LayoutState { width, height, pixel_ratio })),
        }
    }

    pub fn set_size(&self, width: f64, height: f64) {
        let mut state = self.state.lock();
        state.width = width;
        state.height = height;
    }

    pub fn set_pixel_ratio(&self, pixel_ratio: f64) {
        self.state.lock().pixel_ratio = pixel_ratio;
    }
}

impl ContainerLayout for FixedLayout {
    fn logical_size(&self) -> (f64, f64) {
        let state = self.state.lock();
        (state.width, state.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.state.lock().pixel_ratio
    }
}

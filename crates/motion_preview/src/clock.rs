//! Elapsed animation time with pause and resume

use crate::host::TimeSource;

/// Converts a monotonic millisecond source into elapsed seconds.
///
/// While paused the elapsed value is frozen; resuming moves the origin so the
/// value continues from where it stopped.
pub struct FrameClock {
    source: Box<dyn TimeSource>,
    origin_ms: f64,
    paused_elapsed: f64,
    running: bool,
}

impl FrameClock {
    /// Creates a stopped clock reading zero.
    pub fn new(source: Box<dyn TimeSource>) -> Self {
        let origin_ms = source.now_ms();
        Self {
            source,
            origin_ms,
            paused_elapsed: 0.0,
            running: false,
        }
    }

    /// Anchors the clock at zero and starts it.
    pub fn start(&mut self) {
        self.origin_ms = self.source.now_ms();
        self.paused_elapsed = 0.0;
        self.running = true;
    }

    pub fn pause(&mut self) {
        if self.running {
            self.paused_elapsed = self.elapsed();
            self.running = false;
        }
    }

    pub fn resume(&mut self) {
        if !self.running {
            self.origin_ms = self.source.now_ms() - self.paused_elapsed * 1000.0;
            self.running = true;
        }
    }

    /// Same as [`FrameClock::start`].
    pub fn reset(&mut self) {
        self.start();
    }

    /// Seconds since start, excluding paused spans.
    pub fn elapsed(&self) -> f64 {
        if self.running {
            ((self.source.now_ms() - self.origin_ms) / 1000.0).max(0.0)
        } else {
            self.paused_elapsed
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ManualTime;

    #[test]
    fn test_new_clock_is_stopped_at_zero() {
        let time = ManualTime::new();
        let clock = FrameClock::new(Box::new(time.clone()));
        time.advance(500.0);
        assert!(!clock.is_running());
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_pause_twice_keeps_value() {
        let time = ManualTime::new();
        let mut clock = FrameClock::new(Box::new(time.clone()));
        clock.start();
        time.advance(1500.0);
        clock.pause();
        time.advance(1000.0);
        clock.pause();
        assert_eq!(clock.elapsed(), 1.5);
    }
}

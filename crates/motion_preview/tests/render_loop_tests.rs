use motion_preview::{Canvas, LoopState, ManualTime, PreviewOptions, PreviewSource, QueuedScheduler, RenderLoop, SharedCanvas, SurfaceDimensions};

const FAILS_ON_THIRD_CALL: &str = "n = (n or 0) + 1\nif n == 3 then error('third') end";

struct Harness {
    render_loop: RenderLoop,
    time: ManualTime,
    scheduler: QueuedScheduler,
    canvas: SharedCanvas,
}

impl Harness {
    fn new() -> Self {
        let time = ManualTime::new();
        let scheduler = QueuedScheduler::new();
        let render_loop = RenderLoop::new(Box::new(time.clone()), Box::new(scheduler.clone()), PreviewOptions::default());
        Self {
            render_loop,
            time,
            scheduler,
            canvas: Canvas::shared(40, 30),
        }
    }

    /// Delivers pending frames until the loop stops scheduling or `max` frames ran.
    fn run(&mut self, max: usize) {
        let dims = SurfaceDimensions::from_layout(40.0, 30.0, 1.0);
        for _ in 0..max {
            let Some(handle) = self.scheduler.take_next() else {
                break;
            };
            self.render_loop.tick(handle, &self.canvas, dims);
            self.time.advance(16.0);
        }
    }
}

#[test]
fn test_routine_failing_on_nth_call() {
    let mut h = Harness::new();
    h.render_loop.set_source(PreviewSource::new(FAILS_ON_THIRD_CALL));
    h.run(10);

    assert_eq!(h.render_loop.invocations(), 3);
    assert_eq!(h.render_loop.frames_rendered(), 2);
    assert_eq!(h.scheduler.pending_count(), 0);
    assert_eq!(h.render_loop.pending_frame(), None);
    match h.render_loop.state() {
        LoopState::Failed(err) => assert_eq!(err.message(), "third"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn test_reset_from_failed() {
    let mut h = Harness::new();
    h.render_loop.set_source(PreviewSource::new(FAILS_ON_THIRD_CALL));
    h.run(10);
    assert!(h.render_loop.error().is_some());

    h.render_loop.reset();
    assert_eq!(h.render_loop.state(), &LoopState::Running);
    assert!(h.render_loop.error().is_none());
    assert_eq!(h.render_loop.elapsed(), 0.0);
    assert_eq!(h.scheduler.pending_count(), 1);

    // recompiled, so the global counter starts over
    h.run(2);
    assert_eq!(h.render_loop.state(), &LoopState::Running);
    assert_eq!(h.render_loop.frames_rendered(), 2);
}

#[test]
fn test_pause_cancels_and_play_resumes() {
    let mut h = Harness::new();
    h.render_loop.set_source(PreviewSource::new("local x = t"));
    h.run(3);
    let before = h.render_loop.elapsed();

    h.render_loop.pause();
    assert_eq!(h.render_loop.state(), &LoopState::Paused);
    assert_eq!(h.scheduler.pending_count(), 0);
    h.time.advance(5000.0);
    assert_eq!(h.render_loop.elapsed(), before);

    h.render_loop.play();
    assert_eq!(h.render_loop.state(), &LoopState::Running);
    assert_eq!(h.scheduler.pending_count(), 1);
    assert!((h.render_loop.elapsed() - before).abs() < 1e-9);
}

#[test]
fn test_at_most_one_pending_frame() {
    let mut h = Harness::new();
    h.render_loop.set_source(PreviewSource::new("local x = 1"));
    h.render_loop.play();
    h.render_loop.reset();
    h.render_loop.set_source(PreviewSource::new("local y = 2"));
    assert_eq!(h.scheduler.pending_count(), 1);
    assert_eq!(h.scheduler.pending()[0], h.render_loop.pending_frame().unwrap());
}

#[test]
fn test_empty_source_resets_to_idle() {
    let mut h = Harness::new();
    h.render_loop.set_source(PreviewSource::new("local x = 1"));
    h.run(2);
    h.render_loop.set_source(PreviewSource::new(""));
    assert_eq!(h.render_loop.state(), &LoopState::Idle);
    assert_eq!(h.scheduler.pending_count(), 0);
    assert_eq!(h.render_loop.elapsed(), 0.0);
}

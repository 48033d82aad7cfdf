use motion_preview::{HeadlessRunner, PreviewOptions, PreviewView};

#[test]
fn test_capture_advances_time_per_frame() {
    let mut runner = HeadlessRunner::new(40.0, 30.0, 1.0, 10, PreviewOptions::default());
    runner.preview_mut().set_source("ctx.fillStyle = 'red'\nctx:fillRect(0, 0, t * 10, height)");

    let frames = runner.capture(5);
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[0].get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(frames[1].get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(frames[1].get_pixel(1, 0).0, [0, 0, 0, 0]);
    assert_eq!(frames[4].get_pixel(3, 0).0, [255, 0, 0, 255]);
}

#[test]
fn test_capture_stops_on_failure() {
    let mut runner = HeadlessRunner::new(40.0, 30.0, 1.0, 30, PreviewOptions::default());
    runner.preview_mut().set_source("if t > 0.05 then error('late') end");

    let frames = runner.capture(30);
    assert_eq!(frames.len(), 2);
    assert!(matches!(runner.preview().view(), PreviewView::Error { .. }));
}

#[test]
fn test_capture_with_huge_frame_count() {
    let mut runner = HeadlessRunner::new(40.0, 30.0, 1.0, 30, PreviewOptions::default());
    runner.preview_mut().set_source("error('stop')");

    let frames = runner.capture(usize::MAX);
    assert!(frames.is_empty());
    assert!(matches!(runner.preview().view(), PreviewView::Error { .. }));
}

use motion_preview::{Canvas, Color, FixedLayout, SurfaceManager};

#[test]
fn test_backing_store_uses_pixel_ratio() {
    let layout = FixedLayout::new(400.0, 300.0, 2.0);
    let canvas = Canvas::shared(0, 0);
    let mut surface = SurfaceManager::new();
    let dims = surface.attach(Box::new(layout), canvas.clone());

    assert_eq!((dims.backing_width, dims.backing_height), (800, 600));
    assert_eq!((dims.logical_width, dims.logical_height), (400.0, 300.0));
    assert_eq!(dims.scale_factor, 2.0);
    let canvas = canvas.lock();
    assert_eq!((canvas.width(), canvas.height()), (800, 600));
    assert_eq!(canvas.to_device(10.0, 10.0), (20.0, 20.0));
}

#[test]
fn test_resize_is_idempotent() {
    let layout = FixedLayout::new(400.0, 300.0, 2.0);
    let canvas = Canvas::shared(0, 0);
    let mut surface = SurfaceManager::new();
    let first = surface.attach(Box::new(layout), canvas.clone());

    canvas.lock().fill_rect(0.0, 0.0, 5.0, 5.0).unwrap();
    let second = surface.on_resize();
    let third = surface.on_resize();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(canvas.lock().to_device(10.0, 10.0), (20.0, 20.0));
    // same size, so the backing store was kept
    assert_eq!(canvas.lock().pixel(0, 0), Some(Color::WHITE));
}

#[test]
fn test_size_change_reallocates() {
    let layout = FixedLayout::new(100.0, 50.0, 1.0);
    let canvas = Canvas::shared(0, 0);
    let mut surface = SurfaceManager::new();
    surface.attach(Box::new(layout.clone()), canvas.clone());
    canvas.lock().fill_rect(0.0, 0.0, 5.0, 5.0).unwrap();

    layout.set_size(120.0, 60.0);
    let dims = surface.on_resize();
    assert_eq!((dims.backing_width, dims.backing_height), (120, 60));
    assert_eq!(canvas.lock().pixel(0, 0), Some(Color::TRANSPARENT));
}

#[test]
fn test_fractional_ratio_floors() {
    let layout = FixedLayout::new(333.0, 101.0, 1.5);
    let canvas = Canvas::shared(0, 0);
    let mut surface = SurfaceManager::new();
    let dims = surface.attach(Box::new(layout), canvas);
    assert_eq!((dims.backing_width, dims.backing_height), (499, 151));
}

#[test]
fn test_invalid_ratio_falls_back_to_one() {
    for ratio in [0.0, -2.0, f64::NAN, f64::INFINITY] {
        let layout = FixedLayout::new(64.0, 32.0, ratio);
        let canvas = Canvas::shared(0, 0);
        let mut surface = SurfaceManager::new();
        let dims = surface.attach(Box::new(layout), canvas);
        assert_eq!(dims.scale_factor, 1.0);
        assert_eq!((dims.backing_width, dims.backing_height), (64, 32));
    }
}

#[test]
fn test_detached_manager_keeps_defaults() {
    let mut surface = SurfaceManager::new();
    assert!(!surface.is_attached());
    let dims = surface.on_resize();
    assert_eq!(dims.backing_width, 0);
    assert_eq!(dims.scale_factor, 1.0);
}

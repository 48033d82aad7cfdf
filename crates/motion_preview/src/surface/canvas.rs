//! Software 2D drawing surface
//!
//! A small subset of the canvas 2D context: paths, rectangles, arcs and
//! curves filled or stroked with solid colors. Coordinates pass through the
//! current transform; the surface manager installs the device pixel scale as
//! the base transform so routines can draw in logical pixels.
//!
//! Every path point and every painted scanline is counted as work. A caller
//! can cap that work with [`Canvas::set_work_limit`]; operations that would
//! go past the limit fail before touching any pixel.

use std::f64::consts::TAU;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use thiserror::Error;

use super::color::Color;

/// Line width every frame starts with, in logical pixels.
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Color every frame starts with, for both fill and stroke.
pub const DEFAULT_STYLE: Color = Color::WHITE;

/// Curve segments used when flattening Bézier curves.
const CURVE_SEGMENTS: usize = 16;

/// Points a path may hold before further path calls fail.
pub const MAX_PATH_POINTS: usize = 100_000;

/// Nesting depth of `save()` calls.
pub const MAX_SAVE_DEPTH: usize = 1024;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanvasError {
    #[error("The radius provided ({0}) is negative.")]
    NegativeRadius(f64),

    #[error("path too complex")]
    PathTooComplex,

    #[error("save stack overflow")]
    SaveStackOverflow,

    #[error("instruction budget exceeded")]
    BudgetExceeded,
}

/// Canvas shared between the render loop and the running routine.
pub type SharedCanvas = Arc<Mutex<Canvas>>;

/// 2D affine transform `[a c e; b d f]`, same layout as `setTransform`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self { a: sx, d: sy, ..Self::IDENTITY }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self { e: tx, f: ty, ..Self::IDENTITY }
    }

    pub fn rotate(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self * other`: `other` is applied to points first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// Average linear scale, used to size strokes and arc tessellation.
    pub fn scale_factor(&self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }

    fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.e, self.f].iter().all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone)]
struct DrawState {
    transform: Transform,
    fill: Color,
    stroke: Color,
    line_width: f64,
    global_alpha: f64,
}

impl DrawState {
    fn with_transform(transform: Transform) -> Self {
        Self {
            transform,
            fill: DEFAULT_STYLE,
            stroke: DEFAULT_STYLE,
            line_width: DEFAULT_LINE_WIDTH,
            global_alpha: 1.0,
        }
    }
}

/// Polyline in device space.
#[derive(Debug, Clone, Default)]
struct SubPath {
    points: Vec<(f64, f64)>,
    closed: bool,
}

pub struct Canvas {
    pixels: RgbaImage,
    base_transform: Transform,
    state: DrawState,
    saved: Vec<DrawState>,
    path: Vec<SubPath>,
    path_points: usize,
    work: u64,
    work_limit: Option<u64>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            base_transform: Transform::IDENTITY,
            state: DrawState::with_transform(Transform::IDENTITY),
            saved: Vec::new(),
            path: Vec::new(),
            path_points: 0,
            work: 0,
            work_limit: None,
        }
    }

    pub fn shared(width: u32, height: u32) -> SharedCanvas {
        Arc::new(Mutex::new(Self::new(width, height)))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.width() && y < self.height() {
            let Rgba([r, g, b, a]) = *self.pixels.get_pixel(x, y);
            Some(Color::rgba(r, g, b, a))
        } else {
            None
        }
    }

    /// Reallocates the backing store. Like a canvas element, this clears the
    /// pixels and resets all drawing state.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
        self.base_transform = Transform::IDENTITY;
        self.state = DrawState::with_transform(Transform::IDENTITY);
        self.saved.clear();
        self.clear_path();
        self.reset_work();
    }

    /// Resets the transform to identity and applies a uniform scale once.
    pub fn set_base_scale(&mut self, scale: f64) {
        self.base_transform = Transform::scale(scale, scale);
        self.state.transform = self.base_transform;
    }

    pub fn base_transform(&self) -> Transform {
        self.base_transform
    }

    /// Clears the backing store and restores the per-frame defaults.
    pub fn prepare_frame(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
        self.state = DrawState::with_transform(self.base_transform);
        self.saved.clear();
        self.clear_path();
        self.reset_work();
    }

    // ---- work accounting ----

    /// Work done since the last reset: one unit per path point, plus rows
    /// times edges and pixel spans for every scan conversion.
    pub fn work(&self) -> u64 {
        self.work
    }

    /// Operations fail with [`CanvasError::BudgetExceeded`] instead of
    /// pushing [`Canvas::work`] past `limit`.
    pub fn set_work_limit(&mut self, limit: Option<u64>) {
        self.work_limit = limit;
    }

    pub fn reset_work(&mut self) {
        self.work = 0;
        self.work_limit = None;
    }

    fn charge(&mut self, cost: u64) -> Result<(), CanvasError> {
        let total = self.work.saturating_add(cost);
        if self.work_limit.is_some_and(|limit| total > limit) {
            return Err(CanvasError::BudgetExceeded);
        }
        self.work = total;
        Ok(())
    }

    /// Maps a user-space point to backing store coordinates.
    pub fn to_device(&self, x: f64, y: f64) -> (f64, f64) {
        self.state.transform.apply(x, y)
    }

    // ---- state ----

    pub fn transform(&self) -> Transform {
        self.state.transform
    }

    pub fn fill_style(&self) -> Color {
        self.state.fill
    }

    pub fn set_fill_style(&mut self, color: Color) {
        self.state.fill = color;
    }

    pub fn stroke_style(&self) -> Color {
        self.state.stroke
    }

    pub fn set_stroke_style(&mut self, color: Color) {
        self.state.stroke = color;
    }

    pub fn line_width(&self) -> f64 {
        self.state.line_width
    }

    /// Non-positive and non-finite widths are ignored.
    pub fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    pub fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    /// Values outside `0..=1` are ignored.
    pub fn set_global_alpha(&mut self, alpha: f64) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    pub fn save(&mut self) -> Result<(), CanvasError> {
        if self.saved.len() >= MAX_SAVE_DEPTH {
            return Err(CanvasError::SaveStackOverflow);
        }
        self.saved.push(self.state.clone());
        Ok(())
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.concat(Transform::translate(tx, ty));
    }

    pub fn rotate(&mut self, angle: f64) {
        self.concat(Transform::rotate(angle));
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.concat(Transform::scale(sx, sy));
    }

    pub fn concat(&mut self, transform: Transform) {
        let next = self.state.transform.then(&transform);
        if next.is_finite() {
            self.state.transform = next;
        }
    }

    pub fn set_transform(&mut self, transform: Transform) {
        if transform.is_finite() {
            self.state.transform = transform;
        }
    }

    pub fn reset_transform(&mut self) {
        self.state.transform = Transform::IDENTITY;
    }

    // ---- paths ----

    pub fn begin_path(&mut self) {
        self.clear_path();
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.path_points = 0;
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> Result<(), CanvasError> {
        let p = self.to_device(x, y);
        self.start_subpath(p)
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> Result<(), CanvasError> {
        self.reserve_points(1)?;
        let p = self.to_device(x, y);
        self.append_point(p);
        Ok(())
    }

    pub fn close_path(&mut self) -> Result<(), CanvasError> {
        let Some(last) = self.path.last_mut() else {
            return Ok(());
        };
        last.closed = true;
        match last.points.first().copied() {
            Some(first) => self.start_subpath(first),
            None => Ok(()),
        }
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<(), CanvasError> {
        let points = self.rect_points(x, y, w, h);
        self.reserve_points(points.len() + 1)?;
        let first = points[0];
        self.path.push(SubPath { points, closed: true });
        self.path.push(SubPath {
            points: vec![first],
            closed: false,
        });
        Ok(())
    }

    /// Adds a circular arc. Angles are in radians, clockwise in screen space
    /// unless `counter_clockwise` is set.
    pub fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, counter_clockwise: bool) -> Result<(), CanvasError> {
        if radius < 0.0 {
            return Err(CanvasError::NegativeRadius(radius));
        }
        if ![x, y, radius, start, end].iter().all(|v| v.is_finite()) {
            return Ok(());
        }

        let sweep = arc_sweep(start, end, counter_clockwise);
        let device_radius = radius * self.state.transform.scale_factor();
        let segments = ((sweep.abs() / TAU) * device_radius.clamp(16.0, 256.0)).ceil().max(1.0) as usize;
        self.reserve_points(segments + 1)?;
        for i in 0..=segments {
            let angle = start + sweep * i as f64 / segments as f64;
            let p = self.to_device(x + radius * angle.cos(), y + radius * angle.sin());
            self.append_point(p);
        }
        Ok(())
    }

    pub fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) -> Result<(), CanvasError> {
        let start = self.current_point_or(cpx, cpy)?;
        self.reserve_points(CURVE_SEGMENTS)?;
        let ctrl = self.to_device(cpx, cpy);
        let end = self.to_device(x, y);
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f64 / CURVE_SEGMENTS as f64;
            let mt = 1.0 - t;
            let px = mt * mt * start.0 + 2.0 * mt * t * ctrl.0 + t * t * end.0;
            let py = mt * mt * start.1 + 2.0 * mt * t * ctrl.1 + t * t * end.1;
            self.append_point((px, py));
        }
        Ok(())
    }

    pub fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) -> Result<(), CanvasError> {
        let start = self.current_point_or(cp1x, cp1y)?;
        self.reserve_points(CURVE_SEGMENTS)?;
        let c1 = self.to_device(cp1x, cp1y);
        let c2 = self.to_device(cp2x, cp2y);
        let end = self.to_device(x, y);
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f64 / CURVE_SEGMENTS as f64;
            let mt = 1.0 - t;
            let w0 = mt * mt * mt;
            let w1 = 3.0 * mt * mt * t;
            let w2 = 3.0 * mt * t * t;
            let w3 = t * t * t;
            let px = w0 * start.0 + w1 * c1.0 + w2 * c2.0 + w3 * end.0;
            let py = w0 * start.1 + w1 * c1.1 + w2 * c2.1 + w3 * end.1;
            self.append_point((px, py));
        }
        Ok(())
    }

    fn current_point_or(&mut self, x: f64, y: f64) -> Result<(f64, f64), CanvasError> {
        match self.path.last().and_then(|sp| sp.points.last()) {
            Some(&p) => Ok(p),
            None => {
                let p = self.to_device(x, y);
                self.start_subpath(p)?;
                Ok(p)
            }
        }
    }

    /// Fails without adding anything when `count` more points would not fit.
    fn reserve_points(&mut self, count: usize) -> Result<(), CanvasError> {
        if self.path_points.saturating_add(count) > MAX_PATH_POINTS {
            return Err(CanvasError::PathTooComplex);
        }
        self.charge(count as u64)?;
        self.path_points += count;
        Ok(())
    }

    fn start_subpath(&mut self, p: (f64, f64)) -> Result<(), CanvasError> {
        self.reserve_points(1)?;
        self.path.push(SubPath {
            points: vec![p],
            closed: false,
        });
        Ok(())
    }

    /// Appends to the open subpath. The point has to be reserved already.
    fn append_point(&mut self, p: (f64, f64)) {
        match self.path.last_mut() {
            Some(sub) if !sub.closed => sub.points.push(p),
            _ => self.path.push(SubPath {
                points: vec![p],
                closed: false,
            }),
        }
    }

    fn rect_points(&self, x: f64, y: f64, w: f64, h: f64) -> Vec<(f64, f64)> {
        vec![
            self.to_device(x, y),
            self.to_device(x + w, y),
            self.to_device(x + w, y + h),
            self.to_device(x, y + h),
        ]
    }

    // ---- painting ----

    pub fn fill(&mut self) -> Result<(), CanvasError> {
        let polygons: Vec<Vec<(f64, f64)>> = self.path.iter().filter(|sp| sp.points.len() > 2).map(|sp| sp.points.clone()).collect();
        let color = self.state.fill;
        self.fill_polygons(&polygons, color)
    }

    pub fn stroke(&mut self) -> Result<(), CanvasError> {
        let half = self.state.line_width * self.state.transform.scale_factor() / 2.0;
        let outline_points: usize = self.path.iter().map(|sp| stroke_outline_len(sp.points.len(), half)).sum();
        self.charge(outline_points as u64)?;

        let mut polygons = Vec::new();
        for sub in &self.path {
            stroke_outline(&sub.points, sub.closed, half, &mut polygons);
        }
        let color = self.state.stroke;
        self.fill_polygons(&polygons, color)
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<(), CanvasError> {
        let polygon = self.rect_points(x, y, w, h);
        let color = self.state.fill;
        self.fill_polygons(&[polygon], color)
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<(), CanvasError> {
        let points = self.rect_points(x, y, w, h);
        let half = self.state.line_width * self.state.transform.scale_factor() / 2.0;
        self.charge(stroke_outline_len(points.len(), half) as u64)?;
        let mut polygons = Vec::new();
        stroke_outline(&points, true, half, &mut polygons);
        let color = self.state.stroke;
        self.fill_polygons(&polygons, color)
    }

    /// Sets every pixel inside the transformed rectangle to transparent.
    pub fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<(), CanvasError> {
        let polygon = self.rect_points(x, y, w, h);
        self.scan_polygons(&[polygon], |px| *px = Rgba([0, 0, 0, 0]))
    }

    fn fill_polygons(&mut self, polygons: &[Vec<(f64, f64)>], color: Color) -> Result<(), CanvasError> {
        let alpha = color.a as f64 / 255.0 * self.state.global_alpha;
        if alpha <= 0.0 {
            return Ok(());
        }
        self.scan_polygons(polygons, |px| blend(px, color, alpha))
    }

    /// Nonzero-winding scanline fill sampling pixel centers. The whole scan
    /// is charged up front from its bounding box, so a fill over the limit
    /// leaves the pixels untouched.
    fn scan_polygons(&mut self, polygons: &[Vec<(f64, f64)>], mut paint: impl FnMut(&mut Rgba<u8>)) -> Result<(), CanvasError> {
        let width = self.pixels.width() as i64;
        let height = self.pixels.height() as i64;
        if width == 0 || height == 0 {
            return Ok(());
        }

        let mut edges = Vec::new();
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for polygon in polygons {
            for (i, &p0) in polygon.iter().enumerate() {
                let p1 = polygon[(i + 1) % polygon.len()];
                if !(p0.0.is_finite() && p0.1.is_finite() && p1.0.is_finite() && p1.1.is_finite()) {
                    continue;
                }
                if p0.1 != p1.1 {
                    edges.push((p0, p1));
                    min_x = min_x.min(p0.0.min(p1.0));
                    max_x = max_x.max(p0.0.max(p1.0));
                    min_y = min_y.min(p0.1.min(p1.1));
                    max_y = max_y.max(p0.1.max(p1.1));
                }
            }
        }
        if edges.is_empty() {
            return Ok(());
        }

        let row_start = ((min_y - 0.5).ceil() as i64).max(0);
        let row_end = ((max_y - 0.5).ceil() as i64).min(height);
        if row_end <= row_start {
            return Ok(());
        }
        let span = ((max_x - 0.5).ceil() as i64).min(width) - ((min_x - 0.5).ceil() as i64).max(0);
        let per_row = edges.len() as u64 + span.max(0) as u64;
        self.charge(((row_end - row_start) as u64).saturating_mul(per_row))?;

        let mut crossings: Vec<(f64, i32)> = Vec::new();
        for row in row_start..row_end {
            let sy = row as f64 + 0.5;
            crossings.clear();
            for &((x0, y0), (x1, y1)) in &edges {
                let dir = if y0 <= sy && y1 > sy {
                    1
                } else if y1 <= sy && y0 > sy {
                    -1
                } else {
                    continue;
                };
                crossings.push((x0 + (sy - y0) * (x1 - x0) / (y1 - y0), dir));
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding == 0 {
                    continue;
                }
                let col_start = ((pair[0].0 - 0.5).ceil() as i64).max(0);
                let col_end = ((pair[1].0 - 0.5).ceil() as i64).min(width);
                for col in col_start..col_end {
                    paint(self.pixels.get_pixel_mut(col as u32, row as u32));
                }
            }
        }
        Ok(())
    }
}

/// Signed sweep of an arc, clamped to one full turn.
fn arc_sweep(start: f64, end: f64, counter_clockwise: bool) -> f64 {
    let delta = end - start;
    if !counter_clockwise {
        if delta >= TAU {
            TAU
        } else {
            delta.rem_euclid(TAU)
        }
    } else if delta <= -TAU {
        -TAU
    } else {
        -((-delta).rem_euclid(TAU))
    }
}

/// Outlines a polyline as quads per segment plus round joins.
fn stroke_outline(points: &[(f64, f64)], closed: bool, half: f64, out: &mut Vec<Vec<(f64, f64)>>) {
    if points.len() < 2 || half <= 0.0 {
        return;
    }
    let count = if closed { points.len() } else { points.len() - 1 };
    for i in 0..count {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % points.len()];
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            continue;
        }
        let (nx, ny) = (-dy / len * half, dx / len * half);
        out.push(vec![(x0 + nx, y0 + ny), (x1 + nx, y1 + ny), (x1 - nx, y1 - ny), (x0 - nx, y0 - ny)]);
    }

    let joins: Box<dyn Iterator<Item = &(f64, f64)>> = if closed {
        Box::new(points.iter())
    } else {
        Box::new(points[1..points.len() - 1].iter())
    };
    let segments = join_segments(half);
    for &(cx, cy) in joins {
        out.push(
            (0..segments)
                .map(|i| {
                    let angle = TAU * i as f64 / segments as f64;
                    (cx + half * angle.cos(), cy + half * angle.sin())
                })
                .collect(),
        );
    }
}

fn join_segments(half: f64) -> usize {
    (half * 2.0).clamp(8.0, 32.0) as usize
}

/// Upper bound of the points [`stroke_outline`] emits for `len` points.
fn stroke_outline_len(len: usize, half: f64) -> usize {
    if len < 2 || half <= 0.0 {
        return 0;
    }
    len * (4 + join_segments(half))
}

/// Source-over blending of a straight alpha color.
fn blend(dst: &mut Rgba<u8>, color: Color, alpha: f64) {
    if alpha >= 1.0 {
        *dst = Rgba(color.to_array());
        return;
    }
    let Rgba([dr, dg, db, da]) = *dst;
    let dst_alpha = da as f64 / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    let mix = |s: u8, d: u8| ((s as f64 * alpha + d as f64 * dst_alpha * (1.0 - alpha)) / out_alpha).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba([
        mix(color.r, dr),
        mix(color.g, dg),
        mix(color.b, db),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_painted(canvas: &Canvas) -> usize {
        canvas.pixels().pixels().filter(|p| p.0[3] != 0).count()
    }

    #[test]
    fn test_fill_rect_covers_exact_pixels() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_rect(2.0, 3.0, 4.0, 2.0).unwrap();
        assert_eq!(count_painted(&canvas), 8);
        assert_eq!(canvas.pixel(2, 3), Some(Color::WHITE));
        assert_eq!(canvas.pixel(5, 4), Some(Color::WHITE));
        assert_eq!(canvas.pixel(6, 4), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_clear_rect() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0).unwrap();
        canvas.clear_rect(0.0, 0.0, 2.0, 4.0).unwrap();
        assert_eq!(count_painted(&canvas), 8);
    }

    #[test]
    fn test_save_restore_transform_and_style() {
        let mut canvas = Canvas::new(8, 8);
        canvas.save().unwrap();
        canvas.translate(4.0, 0.0);
        canvas.set_fill_style(Color::rgb(255, 0, 0));
        canvas.restore();
        assert_eq!(canvas.transform(), Transform::IDENTITY);
        assert_eq!(canvas.fill_style(), Color::WHITE);
        canvas.restore();
    }

    #[test]
    fn test_arc_fill_is_roughly_a_disc() {
        let mut canvas = Canvas::new(100, 100);
        canvas.begin_path();
        canvas.arc(50.0, 50.0, 20.0, 0.0, TAU, false).unwrap();
        canvas.fill().unwrap();
        let painted = count_painted(&canvas) as f64;
        let expected = std::f64::consts::PI * 400.0;
        assert!((painted - expected).abs() / expected < 0.05, "painted {painted}");
        assert_eq!(canvas.pixel(50, 50), Some(Color::WHITE));
        assert_eq!(canvas.pixel(5, 5), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_negative_radius_is_an_error() {
        let mut canvas = Canvas::new(10, 10);
        assert!(canvas.arc(5.0, 5.0, -1.0, 0.0, 1.0, false).is_err());
    }

    #[test]
    fn test_stroke_line_width() {
        let mut canvas = Canvas::new(20, 20);
        canvas.begin_path();
        canvas.move_to(0.0, 10.0).unwrap();
        canvas.line_to(20.0, 10.0).unwrap();
        canvas.stroke().unwrap();
        // default width 2 covers rows 9 and 10
        assert_eq!(canvas.pixel(5, 9), Some(Color::WHITE));
        assert_eq!(canvas.pixel(5, 10), Some(Color::WHITE));
        assert_eq!(canvas.pixel(5, 8), Some(Color::TRANSPARENT));
        assert_eq!(canvas.pixel(5, 11), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_half_alpha_blend() {
        let mut canvas = Canvas::new(1, 1);
        canvas.set_fill_style(Color::BLACK);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        canvas.set_fill_style(Color::WHITE);
        canvas.set_global_alpha(0.5);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(Color::rgb(128, 128, 128)));
    }

    #[test]
    fn test_prepare_frame_restores_defaults() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set_base_scale(2.0);
        canvas.translate(1.0, 1.0);
        canvas.set_line_width(7.0);
        canvas.set_stroke_style(Color::BLACK);
        canvas.fill_rect(0.0, 0.0, 1.0, 1.0).unwrap();
        canvas.prepare_frame();
        assert_eq!(canvas.transform(), Transform::scale(2.0, 2.0));
        assert_eq!(canvas.line_width(), DEFAULT_LINE_WIDTH);
        assert_eq!(canvas.stroke_style(), DEFAULT_STYLE);
        assert_eq!(count_painted(&canvas), 0);
    }

    #[test]
    fn test_path_point_limit() {
        let mut canvas = Canvas::new(10, 10);
        canvas.move_to(0.0, 0.0).unwrap();
        for i in 1..MAX_PATH_POINTS {
            canvas.line_to(i as f64, 1.0).unwrap();
        }
        assert_eq!(canvas.line_to(0.0, 0.0), Err(CanvasError::PathTooComplex));
        assert_eq!(canvas.arc(5.0, 5.0, 2.0, 0.0, TAU, false), Err(CanvasError::PathTooComplex));

        canvas.begin_path();
        canvas.line_to(0.0, 0.0).unwrap();
    }

    #[test]
    fn test_save_depth_limit() {
        let mut canvas = Canvas::new(1, 1);
        for _ in 0..MAX_SAVE_DEPTH {
            canvas.save().unwrap();
        }
        assert_eq!(canvas.save(), Err(CanvasError::SaveStackOverflow));
        canvas.prepare_frame();
        canvas.save().unwrap();
    }

    #[test]
    fn test_work_limit_rejects_fill_before_painting() {
        let mut canvas = Canvas::new(100, 100);
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();
        // 10 rows, 2 edges and a 10 pixel span each
        assert_eq!(canvas.work(), 120);

        canvas.set_work_limit(Some(canvas.work() + 1000));
        assert_eq!(canvas.fill_rect(0.0, 0.0, 100.0, 100.0), Err(CanvasError::BudgetExceeded));
        assert_eq!(count_painted(&canvas), 100);
        assert_eq!(canvas.work(), 120);

        canvas.reset_work();
        canvas.fill_rect(0.0, 0.0, 100.0, 100.0).unwrap();
        assert_eq!(count_painted(&canvas), 10_000);
    }
}

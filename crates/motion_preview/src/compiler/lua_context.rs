//! The `ctx` drawing handle passed to preview routines
//!
//! Mirrors the canvas 2D context names so generated snippets read the same as
//! their browser counterparts, with Lua method syntax: `ctx:fillRect(0, 0, 10, 10)`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mlua::{UserData, Value};

use super::lua_runtime::HOOK_INTERVAL;
use crate::surface::{Canvas, CanvasError, Color, SharedCanvas, Transform};

/// Wrapper around the shared canvas for scripting access.
pub struct LuaContext {
    pub canvas: SharedCanvas,
    budget: Option<Arc<AtomicU64>>,
}

impl LuaContext {
    pub fn new(canvas: SharedCanvas) -> Self {
        Self { canvas, budget: None }
    }

    /// Canvas work is taken from `remaining`, the counter the instruction
    /// hook decrements.
    pub fn with_budget(canvas: SharedCanvas, remaining: Arc<AtomicU64>) -> Self {
        Self {
            canvas,
            budget: Some(remaining),
        }
    }

    /// Runs a drawing operation and charges the work it did. The canvas
    /// keeps the sub-unit remainder, so many small calls still add up.
    fn draw<R>(&self, op: impl FnOnce(&mut Canvas) -> Result<R, CanvasError>) -> mlua::Result<R> {
        let mut canvas = self.canvas.lock();
        let Some(remaining) = &self.budget else {
            return op(&mut *canvas).map_err(runtime_error);
        };

        let unit = u64::from(HOOK_INTERVAL);
        let left = remaining.load(Ordering::Relaxed);
        let charged = canvas.work() / unit;
        canvas.set_work_limit(Some(charged.saturating_add(left).saturating_mul(unit).saturating_add(unit - 1)));
        let result = op(&mut *canvas);
        canvas.set_work_limit(None);

        let spent = canvas.work() / unit - charged;
        remaining.store(left.saturating_sub(spent), Ordering::Relaxed);
        result.map_err(runtime_error)
    }
}

fn runtime_error(err: CanvasError) -> mlua::Error {
    mlua::Error::RuntimeError(err.to_string())
}

/// Invalid colors are ignored, like a canvas does.
fn color_from_value(value: &Value) -> Option<Color> {
    match value {
        Value::String(s) => Color::parse(&s.to_string_lossy()),
        _ => None,
    }
}

/// Non-numbers are ignored, like a canvas does.
fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Number(n) => Some(*n),
        _ => None,
    }
}

impl UserData for LuaContext {
    fn add_fields<F: mlua::UserDataFields<Self>>(fields: &mut F) {
        fields.add_field_method_get("fillStyle", |_, this| Ok(this.canvas.lock().fill_style().to_css()));
        fields.add_field_method_set("fillStyle", |_, this, val: Value| {
            if let Some(color) = color_from_value(&val) {
                this.canvas.lock().set_fill_style(color);
            }
            Ok(())
        });

        fields.add_field_method_get("strokeStyle", |_, this| Ok(this.canvas.lock().stroke_style().to_css()));
        fields.add_field_method_set("strokeStyle", |_, this, val: Value| {
            if let Some(color) = color_from_value(&val) {
                this.canvas.lock().set_stroke_style(color);
            }
            Ok(())
        });

        fields.add_field_method_get("lineWidth", |_, this| Ok(this.canvas.lock().line_width()));
        fields.add_field_method_set("lineWidth", |_, this, val: Value| {
            if let Some(width) = number_from_value(&val) {
                this.canvas.lock().set_line_width(width);
            }
            Ok(())
        });

        fields.add_field_method_get("globalAlpha", |_, this| Ok(this.canvas.lock().global_alpha()));
        fields.add_field_method_set("globalAlpha", |_, this, val: Value| {
            if let Some(alpha) = number_from_value(&val) {
                this.canvas.lock().set_global_alpha(alpha);
            }
            Ok(())
        });
    }

    fn add_methods<M: mlua::UserDataMethods<Self>>(methods: &mut M) {
        // Rectangles
        methods.add_method("clearRect", |_, this, (x, y, w, h): (f64, f64, f64, f64)| this.draw(|canvas| canvas.clear_rect(x, y, w, h)));

        methods.add_method("fillRect", |_, this, (x, y, w, h): (f64, f64, f64, f64)| this.draw(|canvas| canvas.fill_rect(x, y, w, h)));

        methods.add_method("strokeRect", |_, this, (x, y, w, h): (f64, f64, f64, f64)| this.draw(|canvas| canvas.stroke_rect(x, y, w, h)));

        // Paths
        methods.add_method("beginPath", |_, this, ()| {
            this.canvas.lock().begin_path();
            Ok(())
        });

        methods.add_method("closePath", |_, this, ()| this.draw(|canvas| canvas.close_path()));

        methods.add_method("moveTo", |_, this, (x, y): (f64, f64)| this.draw(|canvas| canvas.move_to(x, y)));

        methods.add_method("lineTo", |_, this, (x, y): (f64, f64)| this.draw(|canvas| canvas.line_to(x, y)));

        methods.add_method("rect", |_, this, (x, y, w, h): (f64, f64, f64, f64)| this.draw(|canvas| canvas.rect(x, y, w, h)));

        methods.add_method(
            "arc",
            |_, this, (x, y, radius, start, end, ccw): (f64, f64, f64, f64, f64, Option<bool>)| {
                this.draw(|canvas| canvas.arc(x, y, radius, start, end, ccw.unwrap_or(false)))
            },
        );

        methods.add_method("quadraticCurveTo", |_, this, (cpx, cpy, x, y): (f64, f64, f64, f64)| {
            this.draw(|canvas| canvas.quadratic_curve_to(cpx, cpy, x, y))
        });

        methods.add_method(
            "bezierCurveTo",
            |_, this, (cp1x, cp1y, cp2x, cp2y, x, y): (f64, f64, f64, f64, f64, f64)| {
                this.draw(|canvas| canvas.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y))
            },
        );

        methods.add_method("fill", |_, this, ()| this.draw(|canvas| canvas.fill()));

        methods.add_method("stroke", |_, this, ()| this.draw(|canvas| canvas.stroke()));

        // State
        methods.add_method("save", |_, this, ()| this.draw(|canvas| canvas.save()));

        methods.add_method("restore", |_, this, ()| {
            this.canvas.lock().restore();
            Ok(())
        });

        // Transforms
        methods.add_method("translate", |_, this, (x, y): (f64, f64)| {
            this.canvas.lock().translate(x, y);
            Ok(())
        });

        methods.add_method("rotate", |_, this, angle: f64| {
            this.canvas.lock().rotate(angle);
            Ok(())
        });

        methods.add_method("scale", |_, this, (x, y): (f64, f64)| {
            this.canvas.lock().scale(x, y);
            Ok(())
        });

        methods.add_method("setTransform", |_, this, (a, b, c, d, e, f): (f64, f64, f64, f64, f64, f64)| {
            this.canvas.lock().set_transform(Transform { a, b, c, d, e, f });
            Ok(())
        });

        methods.add_method("resetTransform", |_, this, ()| {
            this.canvas.lock().reset_transform();
            Ok(())
        });
    }
}

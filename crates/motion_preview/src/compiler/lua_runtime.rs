//! Sandboxed Lua state setup

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mlua::{HookTriggers, Lua, LuaOptions, StdLib, Table, Value, Variadic, VmState};

use super::ScriptLog;
use crate::surface::CanvasError;
use crate::PreviewOptions;

/// Instructions between two budget checks. The budget is counted in these
/// units; canvas work is converted at the same rate.
pub(crate) const HOOK_INTERVAL: u32 = 1000;

/// Globals copied into a routine's environment. Everything else is absent.
const SAFE_GLOBALS: &[&str] = &[
    "math", "string", "table", "pairs", "ipairs", "next", "select", "type", "tostring", "tonumber", "error", "assert",
];

/// Creates an interpreter with only the pure libraries loaded and returns it
/// together with a private environment table for the routine.
pub(crate) fn create_sandbox(options: &PreviewOptions, log: &ScriptLog) -> mlua::Result<(Lua, Table)> {
    let lua = Lua::new_with(StdLib::MATH | StdLib::STRING | StdLib::TABLE, LuaOptions::default())?;
    if options.memory_limit_mb > 0 {
        lua.set_memory_limit(options.memory_limit_mb * 1024 * 1024)?;
    }

    let env = lua.create_table()?;
    let globals = lua.globals();
    for name in SAFE_GLOBALS {
        env.set(*name, globals.get::<Value>(*name)?)?;
    }
    let table: Table = globals.get("table")?;
    env.set("unpack", table.get::<Value>("unpack")?)?;

    register_log_function(&lua, &env, log)?;
    Ok((lua, env))
}

/// Installs the per-frame instruction budget. The returned counter holds the
/// remaining units and has to be refilled before each call.
pub(crate) fn install_budget(lua: &Lua) -> mlua::Result<Arc<AtomicU64>> {
    let remaining = Arc::new(AtomicU64::new(0));
    let counter = remaining.clone();
    lua.set_hook(HookTriggers::new().every_nth_instruction(HOOK_INTERVAL), move |_lua, _debug| {
        let left = counter.load(Ordering::Relaxed);
        if left == 0 {
            return Err(mlua::Error::RuntimeError(CanvasError::BudgetExceeded.to_string()));
        }
        counter.store(left - 1, Ordering::Relaxed);
        Ok(VmState::Continue)
    })?;
    Ok(remaining)
}

fn register_log_function(lua: &Lua, env: &Table, log: &ScriptLog) -> mlua::Result<()> {
    for name in ["log", "print"] {
        let log = log.clone();
        env.set(
            name,
            lua.create_function(move |_lua, args: Variadic<Value>| {
                let text = args.iter().map(display_value).collect::<Vec<_>>().join("\t");
                log::info!("preview: {text}");
                log.push(text);
                Ok(())
            })?,
        )?;
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.to_string_lossy(),
        other => other.type_name().to_string(),
    }
}

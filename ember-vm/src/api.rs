//! Script-visible API surface.
//!
//! Every callback takes a variadic argument list and applies the same
//! coercion protocol: numbers (including numeric strings) convert to the
//! fixed-point scalar, a missing or nil argument selects the documented
//! default branch, booleans follow Lua truthiness. The console state is
//! shared through `Lua::set_app_data`.

use std::io::Write;
use std::time::Instant;

use mlua::prelude::*;

use ember_core::memory::OFFSET_CODE;
use ember_core::{Console, Fix32};

/// Monotonic timer backing `time()`.
pub(crate) struct Clock {
    start: Instant,
}

impl Clock {
    pub(crate) fn new() -> Self {
        Clock {
            start: Instant::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

/// Argument `i`, with nil treated the same as missing.
fn arg<'a>(args: &'a LuaMultiValue, i: usize) -> Option<&'a LuaValue> {
    args.get(i).filter(|v| !v.is_nil())
}

fn val_to_fix32(v: &LuaValue) -> Option<Fix32> {
    match v {
        LuaValue::Integer(n) => Some(Fix32::from_i32(*n as i32)),
        LuaValue::Number(n) => Some(Fix32::from_f64(*n)),
        LuaValue::Boolean(b) => Some(if *b { Fix32::ONE } else { Fix32::ZERO }),
        LuaValue::String(s) => s.to_str().ok().and_then(|s| s.parse().ok()),
        _ => None,
    }
}

fn fix(args: &LuaMultiValue, i: usize) -> Fix32 {
    arg(args, i).and_then(val_to_fix32).unwrap_or(Fix32::ZERO)
}

fn fix_opt(args: &LuaMultiValue, i: usize) -> Option<Fix32> {
    arg(args, i).and_then(val_to_fix32)
}

fn int(args: &LuaMultiValue, i: usize) -> i32 {
    fix(args, i).to_i32()
}

fn int_opt(args: &LuaMultiValue, i: usize) -> Option<i32> {
    fix_opt(args, i).map(Fix32::to_i32)
}

fn truthy(args: &LuaMultiValue, i: usize) -> bool {
    match args.get(i) {
        None | Some(LuaValue::Nil) => false,
        Some(LuaValue::Boolean(b)) => *b,
        Some(_) => true,
    }
}

/// `tostr` formatting, shared by `print` and `printh`.
fn tostr_value(v: Option<&LuaValue>, hex: bool) -> String {
    match v {
        None => "[no value]".to_string(),
        Some(LuaValue::Nil) => "[nil]".to_string(),
        Some(LuaValue::String(s)) => s.to_string_lossy().to_string(),
        Some(LuaValue::Integer(_)) | Some(LuaValue::Number(_)) => {
            let x = v.and_then(val_to_fix32).unwrap_or(Fix32::ZERO);
            if hex {
                x.format_hex()
            } else {
                x.to_string()
            }
        }
        Some(LuaValue::Table(_)) => "[table]".to_string(),
        Some(LuaValue::Thread(_)) => "[thread]".to_string(),
        Some(LuaValue::Function(_)) => "[function]".to_string(),
        Some(LuaValue::Boolean(b)) => (if *b { "true" } else { "false" }).to_string(),
        Some(_) => "true".to_string(),
    }
}

const CONSOLE_ERR: &str = "console state missing";

macro_rules! console_mut {
    ($lua:expr) => {
        $lua.app_data_mut::<Console>()
            .ok_or_else(|| mlua::Error::runtime(CONSOLE_ERR))
    };
}

macro_rules! console_ref {
    ($lua:expr) => {
        $lua.app_data_ref::<Console>()
            .ok_or_else(|| mlua::Error::runtime(CONSOLE_ERR))
    };
}

fn mem_err(e: ember_core::CoreError) -> mlua::Error {
    mlua::Error::runtime(e.to_string())
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

pub(crate) fn register_all(lua: &Lua) -> LuaResult<()> {
    register_system(lua)?;
    register_memory(lua)?;
    register_input(lua)?;
    register_text(lua)?;
    register_math(lua)?;
    register_graphics(lua)?;
    register_sound(lua)?;
    Ok(())
}

// ===========================================================================
//  System
// ===========================================================================

fn register_system(lua: &Lua) -> LuaResult<()> {
    let globals = lua.globals();

    globals.set("run", lua.create_function(|lua, _: LuaMultiValue| {
        let code = {
            let mut con = console_mut!(lua)?;
            con.buttons.clear();
            match con.cart.as_mut() {
                Some(cart) => cart.lua().to_string(),
                None => String::new(),
            }
        };
        let chunk = lua.load(&code).set_name("cart").into_function()?;
        let ember: LuaTable = lua.globals().get("_ember")?;
        let run: LuaFunction = ember.get("run")?;
        run.call::<()>(chunk)?;
        Ok(())
    })?)?;

    globals.set("menuitem", lua.create_function(|_, _: LuaMultiValue| {
        log::info!("stub: menuitem");
        Ok(())
    })?)?;

    globals.set("cartdata", lua.create_function(|lua, args: LuaMultiValue| {
        let id = match arg(&args, 0) {
            Some(LuaValue::String(s)) => Some(s.to_string_lossy().to_string()),
            Some(_) => Some(tostr_value(args.get(0), false)),
            None => None,
        };
        let mut con = console_mut!(lua)?;
        Ok(con.cartdata(id.as_deref()))
    })?)?;

    globals.set("reload", lua.create_function(|lua, args: LuaMultiValue| {
        // A partial argument list reloads the whole cartridge.
        let (dst, src, len) = if arg(&args, 2).is_none() {
            (0, 0, OFFSET_CODE as i32)
        } else {
            (int(&args, 0) & 0xffff, int(&args, 1) & 0xffff, int(&args, 2))
        };
        let mut con = console_mut!(lua)?;
        con.reload(dst, src, len).map_err(mem_err)
    })?)?;

    globals.set("stat", lua.create_function(|lua, args: LuaMultiValue| {
        let id = int(&args, 0);
        let ret = match id {
            0 => {
                // Collect first so short-lived objects are not counted.
                lua.gc_collect()?;
                let used = lua.used_memory();
                let bits = (((used >> 10) as i32) << 16) | (((used & 0x3ff) as i32) << 6);
                Fix32::from_bits(bits)
            }
            1 => {
                log::info!("stub: stat(1)");
                Fix32::ZERO
            }
            16..=19 => {
                let con = console_ref!(lua)?;
                Fix32::from_i32(con.channels[(id - 16) as usize].sfx)
            }
            20..=23 => {
                log::info!("stub: stat({})", id);
                Fix32::ZERO
            }
            32..=34 => {
                let con = console_ref!(lua)?;
                if con.mem.peek(0x5f2d) == 1 {
                    match id {
                        32 => con.mouse_x,
                        33 => con.mouse_y,
                        _ => con.mouse_buttons,
                    }
                } else {
                    Fix32::ZERO
                }
            }
            _ => Fix32::ZERO,
        };
        Ok(ret.to_f64())
    })?)?;

    globals.set("printh", lua.create_function(|_, args: LuaMultiValue| {
        let text = match args.get(0) {
            None | Some(LuaValue::Nil) => "false".to_string(),
            Some(LuaValue::String(s)) => s.to_string_lossy().to_string(),
            Some(LuaValue::Boolean(true)) => "true".to_string(),
            Some(LuaValue::Boolean(false)) => "false".to_string(),
            Some(v) => tostr_value(Some(v), false),
        };
        let mut out = std::io::stdout();
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
        Ok(())
    })?)?;

    globals.set("extcmd", lua.create_function(|_, args: LuaMultiValue| {
        let cmd = tostr_value(args.get(0), false);
        if matches!(cmd.as_str(), "label" | "screen" | "rec" | "video") {
            log::info!("stub: extcmd({})", cmd);
        }
        Ok(())
    })?)?;

    globals.set("time", lua.create_function(|lua, _: LuaMultiValue| {
        let clock = lua
            .app_data_ref::<Clock>()
            .ok_or_else(|| mlua::Error::runtime("clock missing"))?;
        let t = clock.start.elapsed().as_secs_f64() % 65536.0;
        let t = if t < 32768.0 { t } else { t - 65536.0 };
        Ok(Fix32::from_f64(t).to_f64())
    })?)?;

    Ok(())
}

// ===========================================================================
//  Memory
// ===========================================================================

fn register_memory(lua: &Lua) -> LuaResult<()> {
    let globals = lua.globals();

    globals.set("peek", lua.create_function(|lua, args: LuaMultiValue| {
        let con = console_ref!(lua)?;
        Ok(con.mem.peek(int(&args, 0)) as f64)
    })?)?;

    globals.set("peek4", lua.create_function(|lua, args: LuaMultiValue| {
        let con = console_ref!(lua)?;
        Ok(con.mem.peek4(int(&args, 0)).to_f64())
    })?)?;

    globals.set("poke", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.mem
            .poke(int(&args, 0), (int(&args, 1) & 0xff) as u8)
            .map_err(mem_err)
    })?)?;

    globals.set("poke4", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.mem.poke4(int(&args, 0), fix(&args, 1)).map_err(mem_err)
    })?)?;

    globals.set("memcpy", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.mem
            .memcpy(int(&args, 0), int(&args, 1), int(&args, 2))
            .map_err(mem_err)
    })?)?;

    globals.set("memset", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.mem
            .memset(int(&args, 0), (int(&args, 1) & 0xff) as u8, int(&args, 2))
            .map_err(mem_err)
    })?)?;

    Ok(())
}

// ===========================================================================
//  Input
// ===========================================================================

fn register_input(lua: &Lua) -> LuaResult<()> {
    let globals = lua.globals();

    globals.set("_update_buttons", lua.create_function(|lua, _: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.buttons.update();
        Ok(())
    })?)?;

    globals.set("btn", lua.create_function(|lua, args: LuaMultiValue| {
        let con = console_ref!(lua)?;
        if arg(&args, 0).is_none() {
            Ok(LuaValue::Number(con.buttons.held_bits() as f64))
        } else {
            let index = int(&args, 0) + 8 * int(&args, 1);
            Ok(LuaValue::Boolean(con.buttons.held(index as usize)))
        }
    })?)?;

    globals.set("btnp", lua.create_function(|lua, args: LuaMultiValue| {
        let con = console_ref!(lua)?;
        if arg(&args, 0).is_none() {
            Ok(LuaValue::Number(con.buttons.pressed_bits() as f64))
        } else {
            let index = int(&args, 0) + 8 * int(&args, 1);
            Ok(LuaValue::Boolean(con.buttons.pressed(index as usize)))
        }
    })?)?;

    Ok(())
}

// ===========================================================================
//  Text
// ===========================================================================

fn register_text(lua: &Lua) -> LuaResult<()> {
    let globals = lua.globals();

    globals.set("cursor", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.cursor(fix(&args, 0), fix(&args, 1));
        Ok(())
    })?)?;

    globals.set("print", lua.create_function(|lua, args: LuaMultiValue| {
        if args.get(0).is_none() {
            return Ok(());
        }
        let mut con = console_mut!(lua)?;
        // Cart string literals may carry raw charset bytes rather than
        // UTF-8; route those through the charset table.
        let text = match args.get(0) {
            Some(LuaValue::String(s)) => {
                let bytes = s.as_bytes().to_vec();
                match String::from_utf8(bytes) {
                    Ok(t) => t,
                    Err(e) => con.charset.decode(e.as_bytes()),
                }
            }
            v => tostr_value(v, false),
        };
        let pos = if arg(&args, 1).is_none() || arg(&args, 2).is_none() {
            None
        } else {
            Some((fix(&args, 1), fix(&args, 2)))
        };
        let col = fix_opt(&args, 3);
        con.print(&text, pos, col);
        Ok(())
    })?)?;

    globals.set("tostr", lua.create_function(|_, args: LuaMultiValue| {
        let hex = truthy(&args, 1);
        Ok(tostr_value(args.get(0), hex))
    })?)?;

    globals.set("tonum", lua.create_function(|_, args: LuaMultiValue| {
        let v = match args.get(0) {
            Some(LuaValue::Integer(n)) => Some(Fix32::from_i32(*n as i32)),
            Some(LuaValue::Number(n)) => Some(Fix32::from_f64(*n)),
            Some(LuaValue::String(s)) => {
                s.to_str().ok().and_then(|s| s.parse::<Fix32>().ok())
            }
            _ => None,
        };
        Ok(v.map(Fix32::to_f64))
    })?)?;

    Ok(())
}

// ===========================================================================
//  Math
// ===========================================================================

fn register_math(lua: &Lua) -> LuaResult<()> {
    let globals = lua.globals();
    let tau = std::f64::consts::TAU;

    globals.set("max", lua.create_function(|_, args: LuaMultiValue| {
        Ok(fix(&args, 0).max(fix(&args, 1)).to_f64())
    })?)?;

    globals.set("min", lua.create_function(|_, args: LuaMultiValue| {
        Ok(fix(&args, 0).min(fix(&args, 1)).to_f64())
    })?)?;

    globals.set("mid", lua.create_function(|_, args: LuaMultiValue| {
        let (a, b, c) = (fix(&args, 0), fix(&args, 1), fix(&args, 2));
        Ok(a.min(b).max(a.max(b).min(c)).to_f64())
    })?)?;

    globals.set("flr", lua.create_function(|_, args: LuaMultiValue| {
        Ok(fix(&args, 0).floor().to_f64())
    })?)?;

    globals.set("ceil", lua.create_function(|_, args: LuaMultiValue| {
        Ok(fix(&args, 0).ceil().to_f64())
    })?)?;

    globals.set("cos", lua.create_function(move |_, args: LuaMultiValue| {
        Ok(Fix32::from_f64((fix(&args, 0).to_f64() * tau).cos()).to_f64())
    })?)?;

    globals.set("sin", lua.create_function(move |_, args: LuaMultiValue| {
        // Screen-space angles: sine is inverted.
        Ok(Fix32::from_f64(-(fix(&args, 0).to_f64() * tau).sin()).to_f64())
    })?)?;

    globals.set("atan2", lua.create_function(move |_, args: LuaMultiValue| {
        let dx = fix(&args, 0).to_f64();
        let dy = fix(&args, 1).to_f64();
        let a = f64::atan2(-dy, dx) / tau;
        Ok(Fix32::from_f64(a - a.floor()).to_f64())
    })?)?;

    globals.set("sqrt", lua.create_function(|_, args: LuaMultiValue| {
        let x = fix(&args, 0);
        if x <= Fix32::ZERO {
            return Ok(0.0);
        }
        Ok(Fix32::from_f64(x.to_f64().sqrt()).to_f64())
    })?)?;

    globals.set("abs", lua.create_function(|_, args: LuaMultiValue| {
        Ok(fix(&args, 0).abs().to_f64())
    })?)?;

    globals.set("sgn", lua.create_function(|_, args: LuaMultiValue| {
        Ok(if fix(&args, 0) >= Fix32::ZERO { 1.0 } else { -1.0 })
    })?)?;

    globals.set("rnd", lua.create_function(|lua, args: LuaMultiValue| {
        let range = fix_opt(&args, 0).unwrap_or(Fix32::ONE);
        let mut con = console_mut!(lua)?;
        Ok(con.rnd(range).to_f64())
    })?)?;

    globals.set("srand", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.srand(fix(&args, 0));
        Ok(())
    })?)?;

    globals.set("band", lua.create_function(|_, args: LuaMultiValue| {
        Ok(Fix32::from_bits(fix(&args, 0).bits() & fix(&args, 1).bits()).to_f64())
    })?)?;

    globals.set("bor", lua.create_function(|_, args: LuaMultiValue| {
        Ok(Fix32::from_bits(fix(&args, 0).bits() | fix(&args, 1).bits()).to_f64())
    })?)?;

    globals.set("bxor", lua.create_function(|_, args: LuaMultiValue| {
        Ok(Fix32::from_bits(fix(&args, 0).bits() ^ fix(&args, 1).bits()).to_f64())
    })?)?;

    globals.set("bnot", lua.create_function(|_, args: LuaMultiValue| {
        Ok(Fix32::from_bits(!fix(&args, 0).bits()).to_f64())
    })?)?;

    globals.set("shl", lua.create_function(|_, args: LuaMultiValue| {
        let n = int(&args, 1);
        let bits = fix(&args, 0).bits();
        let r = if (0..32).contains(&n) { bits.wrapping_shl(n as u32) } else { 0 };
        Ok(Fix32::from_bits(r).to_f64())
    })?)?;

    globals.set("shr", lua.create_function(|_, args: LuaMultiValue| {
        let n = int(&args, 1);
        let bits = fix(&args, 0).bits();
        let r = if (0..32).contains(&n) { bits >> n } else { bits >> 31 };
        Ok(Fix32::from_bits(r).to_f64())
    })?)?;

    globals.set("lshr", lua.create_function(|_, args: LuaMultiValue| {
        let n = int(&args, 1);
        let bits = fix(&args, 0).bits() as u32;
        let r = if (0..32).contains(&n) { bits >> n } else { 0 };
        Ok(Fix32::from_bits(r as i32).to_f64())
    })?)?;

    globals.set("rotl", lua.create_function(|_, args: LuaMultiValue| {
        let bits = fix(&args, 0).bits() as u32;
        Ok(Fix32::from_bits(bits.rotate_left(int(&args, 1) as u32) as i32).to_f64())
    })?)?;

    globals.set("rotr", lua.create_function(|_, args: LuaMultiValue| {
        let bits = fix(&args, 0).bits() as u32;
        Ok(Fix32::from_bits(bits.rotate_right(int(&args, 1) as u32) as i32).to_f64())
    })?)?;

    Ok(())
}

// ===========================================================================
//  Graphics
// ===========================================================================

fn register_graphics(lua: &Lua) -> LuaResult<()> {
    let globals = lua.globals();

    globals.set("camera", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.camera(fix(&args, 0), fix(&args, 1));
        Ok(())
    })?)?;

    globals.set("circ", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.circ(fix(&args, 0), fix(&args, 1), fix(&args, 2), fix_opt(&args, 3));
        Ok(())
    })?)?;

    globals.set("circfill", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.circfill(fix(&args, 0), fix(&args, 1), fix(&args, 2), fix_opt(&args, 3));
        Ok(())
    })?)?;

    globals.set("clip", lua.create_function(|lua, args: LuaMultiValue| {
        let rect = if arg(&args, 3).is_none() {
            None
        } else {
            Some((fix(&args, 0), fix(&args, 1), fix(&args, 2), fix(&args, 3)))
        };
        let mut con = console_mut!(lua)?;
        con.clip(rect);
        Ok(())
    })?)?;

    globals.set("cls", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.cls(fix(&args, 0));
        Ok(())
    })?)?;

    globals.set("color", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.color(fix(&args, 0));
        Ok(())
    })?)?;

    globals.set("fillp", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.fillp(fix(&args, 0));
        Ok(())
    })?)?;

    globals.set("fget", lua.create_function(|lua, args: LuaMultiValue| {
        if arg(&args, 0).is_none() {
            return Ok(LuaValue::Nil);
        }
        let con = console_ref!(lua)?;
        let bits = con.fget(int(&args, 0));
        match int_opt(&args, 1) {
            None => Ok(LuaValue::Number(bits as f64)),
            Some(bit) => {
                let set = (0..8).contains(&bit) && bits & (1 << bit) != 0;
                Ok(LuaValue::Boolean(set))
            }
        }
    })?)?;

    globals.set("fset", lua.create_function(|lua, args: LuaMultiValue| {
        if arg(&args, 0).is_none() || arg(&args, 1).is_none() {
            return Ok(());
        }
        let v = arg(&args, 2).map(|_| truthy(&args, 2));
        let mut con = console_mut!(lua)?;
        con.fset(int(&args, 0), int(&args, 1), v);
        Ok(())
    })?)?;

    globals.set("line", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.line(
            fix(&args, 0),
            fix(&args, 1),
            fix(&args, 2),
            fix(&args, 3),
            fix_opt(&args, 4),
        );
        Ok(())
    })?)?;

    globals.set("map", lua.create_function(|lua, args: LuaMultiValue| {
        let size = if arg(&args, 4).is_none() && arg(&args, 5).is_none() {
            None
        } else {
            Some((int(&args, 4), int(&args, 5)))
        };
        let layer = (int(&args, 6) & 0xff) as u8;
        let mut con = console_mut!(lua)?;
        con.map_draw(int(&args, 0), int(&args, 1), fix(&args, 2), fix(&args, 3), size, layer);
        Ok(())
    })?)?;

    globals.set("mget", lua.create_function(|lua, args: LuaMultiValue| {
        let con = console_ref!(lua)?;
        Ok(con.mget(int(&args, 0), int(&args, 1)) as f64)
    })?)?;

    globals.set("mset", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.mset(int(&args, 0), int(&args, 1), (int(&args, 2) & 0xff) as u8);
        Ok(())
    })?)?;

    globals.set("pal", lua.create_function(|lua, args: LuaMultiValue| {
        let mapping = if arg(&args, 0).is_none() || arg(&args, 1).is_none() {
            None
        } else {
            Some((fix(&args, 0), fix(&args, 1), fix(&args, 2)))
        };
        let mut con = console_mut!(lua)?;
        con.pal(mapping);
        Ok(())
    })?)?;

    globals.set("palt", lua.create_function(|lua, args: LuaMultiValue| {
        let mapping = if arg(&args, 0).is_none() || arg(&args, 1).is_none() {
            None
        } else {
            Some((fix(&args, 0), truthy(&args, 1)))
        };
        let mut con = console_mut!(lua)?;
        con.palt(mapping);
        Ok(())
    })?)?;

    globals.set("pget", lua.create_function(|lua, args: LuaMultiValue| {
        let con = console_ref!(lua)?;
        Ok(con.pget(fix(&args, 0), fix(&args, 1)) as f64)
    })?)?;

    globals.set("pset", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.pset(fix(&args, 0), fix(&args, 1), fix_opt(&args, 2));
        Ok(())
    })?)?;

    globals.set("rect", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.rect(
            fix(&args, 0),
            fix(&args, 1),
            fix(&args, 2),
            fix(&args, 3),
            fix_opt(&args, 4),
        );
        Ok(())
    })?)?;

    globals.set("rectfill", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.rectfill(
            fix(&args, 0),
            fix(&args, 1),
            fix(&args, 2),
            fix(&args, 3),
            fix_opt(&args, 4),
        );
        Ok(())
    })?)?;

    globals.set("sget", lua.create_function(|lua, args: LuaMultiValue| {
        let con = console_ref!(lua)?;
        Ok(con.sget(int(&args, 0), int(&args, 1)) as f64)
    })?)?;

    globals.set("sset", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.sset(int(&args, 0), int(&args, 1), fix_opt(&args, 2));
        Ok(())
    })?)?;

    globals.set("spr", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.spr(
            int(&args, 0),
            fix(&args, 1),
            fix(&args, 2),
            fix_opt(&args, 3),
            fix_opt(&args, 4),
            truthy(&args, 5),
            truthy(&args, 6),
        );
        Ok(())
    })?)?;

    globals.set("sspr", lua.create_function(|lua, args: LuaMultiValue| {
        let mut con = console_mut!(lua)?;
        con.sspr(
            int(&args, 0),
            int(&args, 1),
            int(&args, 2),
            int(&args, 3),
            fix(&args, 4),
            fix(&args, 5),
            int_opt(&args, 6),
            int_opt(&args, 7),
            truthy(&args, 8),
            truthy(&args, 9),
        );
        Ok(())
    })?)?;

    Ok(())
}

// ===========================================================================
//  Sound
// ===========================================================================

fn register_sound(lua: &Lua) -> LuaResult<()> {
    let globals = lua.globals();

    globals.set("music", lua.create_function(|lua, args: LuaMultiValue| {
        let n = int_opt(&args, 0).unwrap_or(0);
        let mut con = console_mut!(lua)?;
        con.music(n);
        Ok(())
    })?)?;

    globals.set("sfx", lua.create_function(|lua, args: LuaMultiValue| {
        let n = int(&args, 0);
        let channel = int_opt(&args, 1).unwrap_or(-1);
        let offset = int_opt(&args, 2).unwrap_or(0);
        let mut con = console_mut!(lua)?;
        con.sfx(n, channel, offset);
        Ok(())
    })?)?;

    Ok(())
}

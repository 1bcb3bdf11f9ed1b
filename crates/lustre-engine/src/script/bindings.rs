//! Script-facing functions of the main interpreter.
//!
//! Each binding is a plain function over the shared presenter or worker
//! state; registration wraps it in a Lua closure once per exported name so
//! aliases report errors under the name the script used.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use mlua::{Function, IntoLuaMulti, Lua, MultiValue, Table, Value};

use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::paint::style::decode_escape;
use crate::scene::{DrawCmd, TextAlign};
use crate::text::FontFace;
use crate::worker::{LaunchSpec, ScriptValue, WorkerBridge};

use super::args::{Args, draw_error, usage_error};
use super::console::{self, ConsoleEnv, HostFunction};
use super::driver::Presenter;
use super::image_handle::{ImageHandle, texture_arg};

/// Registry key of the table holding `MainObject` and named callbacks.
pub(crate) const CALLBACKS_KEY: &str = "lustre.callbacks";

/// Default completion callback of worker tasks.
pub const TASK_FINISHED_CALLBACK: &str = "OnTaskFinished";

pub(crate) fn callbacks_table(lua: &Lua) -> mlua::Result<Table> {
    lua.named_registry_value::<Table>(CALLBACKS_KEY)
}

/// Installs every main-interpreter global.
pub(crate) fn register(
    lua: &Lua,
    presenter: &Rc<RefCell<Presenter>>,
    workers: &Rc<RefCell<WorkerBridge>>,
    console_env: &ConsoleEnv,
) -> mlua::Result<()> {
    lua.set_named_registry_value(CALLBACKS_KEY, lua.create_table()?)?;

    register_callbacks(lua)?;
    register_drawing(lua, presenter)?;
    register_text(lua, presenter)?;
    register_screen_and_input(lua, presenter)?;
    register_images(lua, console_env.script_dir.clone())?;
    register_workers(lua, workers)?;

    for f in HostFunction::ALL {
        console::install(lua, f, console_env)?;
    }
    let strip: Function = lua.globals().get(HostFunction::StripEscapes.name())?;
    lua.globals().set("StripStyleCodes", strip)
}

/// Exports one closure per name; `make` receives the exported name.
fn export<F, R>(lua: &Lua, names: &[&'static str], make: impl Fn(&'static str) -> F) -> mlua::Result<()>
where
    F: Fn(&Lua, MultiValue) -> mlua::Result<R> + 'static,
    R: IntoLuaMulti,
{
    let globals = lua.globals();
    for &name in names {
        globals.set(name, lua.create_function(make(name))?)?;
    }
    Ok(())
}

/// Shared-state binding: `f(&presenter, args)`.
fn export_presenter<R>(
    lua: &Lua,
    names: &[&'static str],
    presenter: &Rc<RefCell<Presenter>>,
    f: fn(&RefCell<Presenter>, Args) -> mlua::Result<R>,
) -> mlua::Result<()>
where
    R: IntoLuaMulti + 'static,
{
    export(lua, names, |name| {
        let p = Rc::clone(presenter);
        move |_: &Lua, a: MultiValue| f(&p, Args::new(name, a))
    })
}

// ── callbacks ─────────────────────────────────────────────────────────────

fn register_callbacks(lua: &Lua) -> mlua::Result<()> {
    export(lua, &["SetMainObject"], |name| {
        move |lua: &Lua, a: MultiValue| {
            let args = Args::new(name, a);
            let main = match args.get(1) {
                v @ (Value::Table(_) | Value::Nil) => v.clone(),
                _ => return Err(args.type_error(1, "table or nil")),
            };
            callbacks_table(lua)?.set("MainObject", main)
        }
    })?;

    export(lua, &["SetCallback"], |name| {
        move |lua: &Lua, a: MultiValue| {
            let args = Args::new(name, a);
            args.require(1, "SetCallback(name[, func])")?;
            let key = args.string(1)?;
            let func = match args.get(2) {
                v @ (Value::Function(_) | Value::Nil) => v.clone(),
                _ => return Err(args.type_error(2, "function or nil")),
            };
            callbacks_table(lua)?.set(key, func)
        }
    })?;

    export(lua, &["GetCallback"], |name| {
        move |lua: &Lua, a: MultiValue| {
            let args = Args::new(name, a);
            args.require(1, "GetCallback(name)")?;
            callbacks_table(lua)?.get::<Value>(args.string(1)?)
        }
    })
}

// ── drawing ───────────────────────────────────────────────────────────────

fn register_drawing(lua: &Lua, presenter: &Rc<RefCell<Presenter>>) -> mlua::Result<()> {
    export_presenter(lua, &["SetDrawLayer", "SetLayer"], presenter, set_draw_layer)?;
    export_presenter(lua, &["SetSubLayer"], presenter, set_sub_layer)?;
    export_presenter(lua, &["SetDrawColor", "SetColor"], presenter, set_draw_color)?;
    export_presenter(lua, &["SetViewport"], presenter, set_viewport)?;
    export_presenter(lua, &["DrawImage"], presenter, draw_image)?;
    export_presenter(lua, &["DrawImageQuad", "DrawQuad"], presenter, draw_image_quad)
}

fn ensure_frame(p: &Presenter, args: &Args) -> mlua::Result<()> {
    p.queue.ensure_recording().map_err(|e| draw_error(args.call(), e))
}

fn set_draw_layer(p: &RefCell<Presenter>, args: Args) -> mlua::Result<()> {
    let mut p = p.borrow_mut();
    ensure_frame(&p, &args)?;
    args.require(1, &format!("{}({{layer|nil}}[, subLayer])", args.call()))?;

    let result = if args.is_nil(1) {
        if args.len() < 2 {
            return Err(usage_error(format!("{}(): must provide subLayer if layer is nil", args.call())));
        }
        p.queue.set_sub_layer(args.int(2)?)
    } else {
        let sub = if args.len() >= 2 { args.int(2)? } else { 0 };
        p.queue.set_layer(args.int(1)?, sub)
    };
    result.map_err(|e| draw_error(args.call(), e))
}

fn set_sub_layer(p: &RefCell<Presenter>, args: Args) -> mlua::Result<()> {
    let mut p = p.borrow_mut();
    ensure_frame(&p, &args)?;
    args.require(1, "SetSubLayer(subLayer)")?;
    p.queue.set_sub_layer(args.int(1)?).map_err(|e| draw_error(args.call(), e))
}

/// Reads `(r, g, b[, a])` starting at argument 1.
fn straight_color(args: &Args, usage: &str) -> mlua::Result<Color> {
    args.require(3, usage)?;
    let r = args.number(1)? as f32;
    let g = args.number(2)? as f32;
    let b = args.number(3)? as f32;
    let a = args.opt_number(4)?.unwrap_or(1.0) as f32;
    Ok(Color::from_straight(r, g, b, a))
}

fn set_draw_color(p: &RefCell<Presenter>, args: Args) -> mlua::Result<()> {
    let mut p = p.borrow_mut();
    ensure_frame(&p, &args)?;
    let usage = format!("{0}(red, green, blue[, alpha]) or {0}(escapeStr)", args.call());
    args.require(1, &usage)?;

    let color = match args.get(1) {
        Value::String(s) => {
            let bytes = s.as_bytes();
            let rgb = decode_escape(&bytes, 0)
                .ok_or_else(|| args.value_error(1, "invalid color escape sequence"))?;
            Color::from_rgb(rgb)
        }
        _ => straight_color(&args, &usage)?,
    };
    p.queue.set_color(color).map_err(|e| draw_error(args.call(), e))
}

fn set_viewport(p: &RefCell<Presenter>, args: Args) -> mlua::Result<()> {
    let mut p = p.borrow_mut();
    ensure_frame(&p, &args)?;

    let rect = if args.len() == 0 {
        Rect::full(p.screen)
    } else {
        args.require(4, "SetViewport([x, y, width, height])")?;
        let mut v = [0.0f32; 4];
        for (i, slot) in v.iter_mut().enumerate() {
            *slot = args.number(i + 1)?.floor() as f32;
        }
        Rect::new(v[0], v[1], v[2], v[3])
    };
    p.queue.append(DrawCmd::SetViewport(rect)).map_err(|e| draw_error(args.call(), e))
}

/// Reads `N` numbers starting at argument `first`.
fn numbers<const N: usize>(args: &Args, first: usize) -> mlua::Result<[f32; N]> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = args.number(first + i)? as f32;
    }
    Ok(out)
}

fn draw_image(p: &RefCell<Presenter>, args: Args) -> mlua::Result<()> {
    let mut p = p.borrow_mut();
    ensure_frame(&p, &args)?;
    args.require(
        5,
        &format!("{}({{imgHandle|nil}}, left, top, width, height[, tcLeft, tcTop, tcRight, tcBottom])", args.call()),
    )?;
    let texture = texture_arg(&args, 1)?;
    let [x, y, w, h] = numbers::<4>(&args, 2)?;

    let uv = if args.len() > 5 {
        if args.len() < 9 {
            return Err(usage_error(format!(
                "{}(): incomplete set of texture coordinates provided",
                args.call()
            )));
        }
        Some(numbers::<4>(&args, 6)?)
    } else {
        None
    };
    p.queue
        .push_image(texture, x, y, w, h, uv)
        .map_err(|e| draw_error(args.call(), e))
}

fn draw_image_quad(p: &RefCell<Presenter>, args: Args) -> mlua::Result<()> {
    let mut p = p.borrow_mut();
    ensure_frame(&p, &args)?;
    args.require(
        9,
        &format!(
            "{}({{imgHandle|nil}}, x1, y1, x2, y2, x3, y3, x4, y4[, s1, t1, s2, t2, s3, t3, s4, t4])",
            args.call()
        ),
    )?;
    let texture = texture_arg(&args, 1)?;
    let corners = |v: [f32; 8]| {
        [
            Vec2::new(v[0], v[1]),
            Vec2::new(v[2], v[3]),
            Vec2::new(v[4], v[5]),
            Vec2::new(v[6], v[7]),
        ]
    };
    let positions = corners(numbers::<8>(&args, 2)?);

    let texcoords = if args.len() > 9 {
        if args.len() < 17 {
            return Err(usage_error(format!(
                "{}(): incomplete set of texture coordinates provided",
                args.call()
            )));
        }
        Some(corners(numbers::<8>(&args, 10)?))
    } else {
        None
    };
    p.queue
        .push_quad(texture, positions, texcoords)
        .map_err(|e| draw_error(args.call(), e))
}

// ── text ──────────────────────────────────────────────────────────────────

fn register_text(lua: &Lua, presenter: &Rc<RefCell<Presenter>>) -> mlua::Result<()> {
    export_presenter(lua, &["DrawString", "DrawText"], presenter, draw_string)?;
    export_presenter(lua, &["DrawStringWidth", "MeasureText"], presenter, draw_string_width)?;
    export_presenter(lua, &["DrawStringCursorIndex"], presenter, draw_string_cursor_index)
}

fn font_arg(args: &Args, n: usize) -> mlua::Result<FontFace> {
    let name = args.string(n)?;
    FontFace::from_name(&name).ok_or_else(|| args.value_error(n, format!("invalid option '{name}'")))
}

fn draw_string(p: &RefCell<Presenter>, args: Args) -> mlua::Result<()> {
    let mut p = p.borrow_mut();
    ensure_frame(&p, &args)?;
    args.require(6, &format!("{}(left, top, align, height, font, text)", args.call()))?;

    let x = args.number(1)? as f32;
    let y = args.number(2)? as f32;
    let align = match args.opt_string(3)? {
        None => TextAlign::Left,
        Some(name) => TextAlign::from_name(&name)
            .ok_or_else(|| args.value_error(3, format!("invalid option '{name}'")))?,
    };
    let px = args.text_height(4)?;
    let face = font_arg(&args, 5)?;
    let text = args.string(6)?;

    let p = &mut *p;
    let rendered = p.text.rasterize(face, px, &text);
    let left = align.left_edge(x, rendered.width, p.screen.width);
    p.queue
        .push_text(&rendered, Vec2::new(left, y))
        .map_err(|e| draw_error(args.call(), e))
}

fn draw_string_width(p: &RefCell<Presenter>, args: Args) -> mlua::Result<i64> {
    args.require(3, &format!("{}(height, font, text)", args.call()))?;
    let px = args.text_height(1)?;
    let face = font_arg(&args, 2)?;
    let text = args.string(3)?;
    Ok(p.borrow().text.measure(face, px, &text).width.ceil() as i64)
}

fn draw_string_cursor_index(p: &RefCell<Presenter>, args: Args) -> mlua::Result<i64> {
    args.require(5, "DrawStringCursorIndex(height, font, text, cursorX, cursorY)")?;
    let px = args.text_height(1)?;
    let face = font_arg(&args, 2)?;
    let text = args.string(3)?;
    let x = args.number(4)? as f32;
    let y = args.number(5)? as f32;
    Ok(p.borrow().text.cursor_index(face, px, &text, x, y) as i64)
}

// ── screen / input ────────────────────────────────────────────────────────

fn register_screen_and_input(lua: &Lua, presenter: &Rc<RefCell<Presenter>>) -> mlua::Result<()> {
    export_presenter(lua, &["GetScreenSize"], presenter, |p, _| {
        let screen = p.borrow().screen;
        Ok((screen.width as i64, screen.height as i64))
    })?;

    export_presenter(lua, &["SetClearColor"], presenter, |p, args| {
        let color = straight_color(&args, "SetClearColor(red, green, blue[, alpha])")?;
        p.borrow_mut().clear_color = color;
        Ok(())
    })?;

    export_presenter(lua, &["IsKeyDown"], presenter, |p, args| {
        args.require(1, "IsKeyDown(keyName)")?;
        let name = args.string(1)?;
        if name.is_empty() {
            return Err(args.value_error(1, "string is empty"));
        }
        Ok(p.borrow().input.is_down(&name))
    })?;

    export_presenter(lua, &["GetCursorPos"], presenter, |p, _| {
        let (x, y) = p.borrow().input.cursor();
        Ok((x.floor() as i64, y.floor() as i64))
    })
}

fn register_images(lua: &Lua, script_dir: PathBuf) -> mlua::Result<()> {
    let ctor = lua.create_function(move |_, ()| Ok(ImageHandle::new(script_dir.clone())))?;
    lua.globals().set("NewImageHandle", ctor)
}

// ── workers ───────────────────────────────────────────────────────────────

fn register_workers(lua: &Lua, workers: &Rc<RefCell<WorkerBridge>>) -> mlua::Result<()> {
    let export_workers = |names: &[&'static str], f: fn(&RefCell<WorkerBridge>, Args) -> mlua::Result<Value>| {
        export(lua, names, |name| {
            let w = Rc::clone(workers);
            move |_: &Lua, a: MultiValue| f(&w, Args::new(name, a))
        })
    };

    export_workers(&["Launch", "LaunchSubScript"], launch)?;
    export_workers(&["IsTaskRunning", "IsSubScriptRunning"], |w, args| {
        let id = task_id_arg(&args, "IsTaskRunning(taskId)")?;
        Ok(Value::Boolean(id.is_some_and(|id| w.borrow().is_running(id))))
    })?;
    export_workers(&["AbortTask", "AbortSubScript"], |w, args| {
        let id = task_id_arg(&args, "AbortTask(taskId)")?;
        Ok(Value::Boolean(id.is_some_and(|id| w.borrow().abort(id))))
    })
}

/// Task id argument; negative or fractional ids are never valid.
fn task_id_arg(args: &Args, usage: &str) -> mlua::Result<Option<u64>> {
    args.require(1, usage)?;
    let id = args.number(1)?;
    Ok((id >= 0.0 && id.fract() == 0.0).then_some(id as u64))
}

fn launch(workers: &RefCell<WorkerBridge>, args: Args) -> mlua::Result<Value> {
    args.require(3, &format!("{}(scriptText, callbackName, funcList[, ...])", args.call()))?;

    let source = args.bytes(1)?;
    let callback = args
        .opt_string(2)?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| TASK_FINISHED_CALLBACK.to_string());
    let list = args.opt_string(3)?.unwrap_or_default();
    let exposed = HostFunction::parse_list(&list).map_err(|e| args.value_error(3, e))?;

    let mut task_args = Vec::with_capacity(args.len().saturating_sub(3));
    for n in 4..=args.len() {
        let v = ScriptValue::from_lua(args.get(n), n).map_err(|_| {
            args.value_error(n, "only nil, boolean, number and string types can be passed to a task")
        })?;
        task_args.push(v);
    }

    let id = workers
        .borrow_mut()
        .launch(LaunchSpec { source, callback, exposed, args: task_args })
        .map_err(|e| usage_error(format!("{}(): failed to start worker thread: {e}", args.call())))?;
    Ok(Value::Integer(id as i64))
}

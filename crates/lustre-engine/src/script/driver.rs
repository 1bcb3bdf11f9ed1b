use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use mlua::{Function, Lua, MultiValue, Table, Value};

use crate::coords::Viewport;
use crate::error::FrameError;
use crate::input::InputEvent;
use crate::logging::{SCRIPT_TARGET, WORKER_TARGET};
use crate::paint::Color;
use crate::render::GraphicsContext;
use crate::scene::DrawQueue;
use crate::text::{CacheStats, TextCache, TextCacheConfig, TextRasterizer};
use crate::worker::{Completion, TaskOutcome, WorkerBridge};

use super::bindings::{self, callbacks_table};
use super::console::ConsoleEnv;
use super::events::{InputTranslator, ScriptEvent};

/// Frame driver settings.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Returned by `GetScriptPath()`; relative image paths resolve here.
    pub script_dir: PathBuf,
    /// Returned by `GetUserPath()`.
    pub user_dir: PathBuf,
    pub text_cache: TextCacheConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            script_dir: PathBuf::from("."),
            user_dir: PathBuf::from("."),
            text_cache: TextCacheConfig::default(),
        }
    }
}

/// Where the driver is within a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramePhase {
    Idle,
    CallbackRunning,
    Replaying,
}

/// State the drawing bindings share with the driver.
pub(crate) struct Presenter {
    pub queue: DrawQueue,
    pub text: TextCache,
    pub screen: Viewport,
    pub clear_color: Color,
    pub input: InputTranslator,
}

/// Owns the main interpreter and runs one script frame per tick.
///
/// A tick delivers finished worker tasks, opens the draw queue, calls
/// `OnFrame`, closes the queue and replays it into the graphics context.
/// Whatever `OnFrame` recorded before failing is still replayed; the
/// failure is returned afterwards.
pub struct FrameDriver {
    // Dropped first: the interpreter holds clones of the shared state below.
    lua: Lua,
    presenter: Rc<RefCell<Presenter>>,
    workers: Rc<RefCell<WorkerBridge>>,
    phase: FramePhase,
    pending_events: Vec<ScriptEvent>,
    exited: bool,
}

impl FrameDriver {
    pub fn new(config: DriverConfig, rasterizer: Box<dyn TextRasterizer>) -> Result<Self, FrameError> {
        let start = Instant::now();
        let console = ConsoleEnv {
            start,
            script_dir: config.script_dir.clone(),
            user_dir: config.user_dir.clone(),
            log_target: SCRIPT_TARGET,
        };
        let worker_console = ConsoleEnv { log_target: WORKER_TARGET, ..console.clone() };

        let presenter = Rc::new(RefCell::new(Presenter {
            queue: DrawQueue::new(),
            text: TextCache::new(rasterizer, config.text_cache),
            screen: Viewport::new(0.0, 0.0),
            clear_color: Color::black(),
            input: InputTranslator::new(),
        }));
        let workers = Rc::new(RefCell::new(WorkerBridge::new(worker_console)));

        let lua = Lua::new();
        bindings::register(&lua, &presenter, &workers, &console)?;

        Ok(Self {
            lua,
            presenter,
            workers,
            phase: FramePhase::Idle,
            pending_events: Vec::new(),
            exited: false,
        })
    }

    /// The main interpreter, for registering host-specific globals.
    #[inline]
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    #[inline]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Screen size reported by `GetScreenSize()` until the next frame.
    pub fn set_screen(&self, screen: Viewport) {
        self.presenter.borrow_mut().screen = screen;
    }

    pub fn clear_color(&self) -> Color {
        self.presenter.borrow().clear_color
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.presenter.borrow().text.stats()
    }

    /// Worker tasks launched and not yet delivered.
    pub fn pending_tasks(&self) -> usize {
        self.workers.borrow().pending()
    }

    /// Loads and runs the launch script.
    pub fn run_script(&self, path: &Path) -> Result<(), FrameError> {
        let name = path.display().to_string();
        let source = std::fs::read(path).map_err(|e| FrameError::Launch {
            name: name.clone(),
            source: mlua::Error::external(e),
        })?;
        self.run_source(&name, &source)
    }

    /// Runs a chunk in the main interpreter.
    pub fn run_source(&self, name: &str, source: &[u8]) -> Result<(), FrameError> {
        self.lua
            .load(source)
            .set_name(format!("@{name}"))
            .exec()
            .map_err(|source| FrameError::Launch { name: name.to_string(), source })
    }

    /// Calls `OnInit` if the script defined it.
    pub fn init(&mut self) -> Result<(), FrameError> {
        self.invoke("OnInit", Vec::new()).map(|_| ())
    }

    /// Forwards one input event to `OnKeyDown`, `OnKeyUp` or `OnChar`.
    ///
    /// Every resulting callback runs; the first failure is returned.
    pub fn handle_input(&mut self, ev: &InputEvent) -> Result<(), FrameError> {
        let mut events = std::mem::take(&mut self.pending_events);
        self.presenter
            .borrow_mut()
            .input
            .translate(ev, Instant::now(), &mut events);

        let mut first_err = None;
        for event in events.drain(..) {
            if let Err(e) = self.dispatch(event) {
                first_err.get_or_insert(e);
            }
        }
        self.pending_events = events;
        first_err.map_or(Ok(()), Err)
    }

    fn dispatch(&mut self, event: ScriptEvent) -> Result<(), FrameError> {
        let lua = &self.lua;
        let (name, args) = match event {
            ScriptEvent::KeyDown { key, double_click } => (
                "OnKeyDown",
                vec![Value::String(lua.create_string(&key)?), Value::Boolean(double_click)],
            ),
            ScriptEvent::KeyUp { key } => ("OnKeyUp", vec![Value::String(lua.create_string(&key)?)]),
            ScriptEvent::Char(c) => ("OnChar", vec![Value::String(lua.create_string(&c)?)]),
        };
        self.invoke(name, args).map(|_| ())
    }

    /// Runs one frame and replays it into `ctx`.
    pub fn frame(&mut self, screen: Viewport, ctx: &mut dyn GraphicsContext) -> Result<(), FrameError> {
        self.deliver_completions();

        {
            let mut p = self.presenter.borrow_mut();
            p.screen = screen;
            p.text.begin_frame();
            p.queue.begin_frame();
        }

        self.phase = FramePhase::CallbackRunning;
        let result = self.invoke("OnFrame", Vec::new());
        self.presenter.borrow_mut().queue.end_frame();

        self.phase = FramePhase::Replaying;
        self.presenter.borrow().queue.replay(ctx);
        self.phase = FramePhase::Idle;

        result.map(|_| ())
    }

    /// Calls `OnExit` once and stops every worker task.
    pub fn shutdown(&mut self) -> Result<(), FrameError> {
        if std::mem::replace(&mut self.exited, true) {
            return Ok(());
        }
        let result = self.invoke("OnExit", Vec::new()).map(|_| ());
        let running = self.workers.borrow().pending();
        if running > 0 {
            log::debug!(target: WORKER_TARGET, "stopping {running} task(s)");
        }
        let env = ConsoleEnv {
            start: Instant::now(),
            script_dir: PathBuf::new(),
            user_dir: PathBuf::new(),
            log_target: WORKER_TARGET,
        };
        // Dropping the old bridge aborts and joins its threads.
        drop(self.workers.replace(WorkerBridge::new(env)));
        result
    }

    // ── callbacks ─────────────────────────────────────────────────────────

    /// Looks up `name` on the main object, then among the named callbacks.
    fn lookup(&self, name: &str) -> mlua::Result<Option<(Function, Option<Table>)>> {
        let callbacks = callbacks_table(&self.lua)?;
        if let Some(main) = callbacks.get::<Option<Table>>("MainObject")? {
            if let Some(f) = main.get::<Option<Function>>(name)? {
                return Ok(Some((f, Some(main))));
            }
        }
        Ok(callbacks.get::<Option<Function>>(name)?.map(|f| (f, None)))
    }

    /// Calls callback `name` if defined. Returns whether it was.
    fn invoke(&self, name: &str, args: Vec<Value>) -> Result<bool, FrameError> {
        let Some((func, this)) = self.lookup(name)? else {
            return Ok(false);
        };
        let args: MultiValue = this.map(Value::Table).into_iter().chain(args).collect();
        func.call::<()>(args).map_err(|source| FrameError::Callback { callback: name.to_string(), source })?;
        Ok(true)
    }

    // ── workers ───────────────────────────────────────────────────────────

    fn deliver_completions(&mut self) {
        let done = self.workers.borrow_mut().take_finished();
        for completion in done {
            if let Err(e) = self.deliver(completion) {
                log::error!(target: WORKER_TARGET, "{e}");
            }
        }
    }

    fn deliver(&self, c: Completion) -> Result<(), FrameError> {
        let mut args = vec![Value::Integer(c.id as i64)];
        match c.outcome {
            TaskOutcome::Returned(m) => {
                if let Some(err) = &m.error {
                    log::error!(
                        target: WORKER_TARGET,
                        "task {}: {err}; delivering the {} value(s) before it",
                        c.id,
                        m.values.len()
                    );
                }
                for v in m.values {
                    args.push(v.into_lua(&self.lua)?);
                }
            }
            TaskOutcome::Failed(msg) => {
                log::warn!(target: WORKER_TARGET, "task {} failed: {msg}", c.id);
                args.push(Value::Nil);
                args.push(Value::String(self.lua.create_string(&msg)?));
            }
            TaskOutcome::Aborted => return Ok(()),
        }

        if !self.invoke(&c.callback, args)? {
            log::warn!(target: WORKER_TARGET, "task {}: no {} callback, results dropped", c.id, c.callback);
        }
        Ok(())
    }
}

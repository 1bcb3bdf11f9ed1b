use std::cell::RefCell;
use std::rc::Rc;

use lustre_engine::core::{App, AppControl, FrameCtx};
use lustre_engine::logging::SCRIPT_TARGET;
use lustre_engine::render::{QuadBatch, QuadRenderer};
use lustre_engine::FrameDriver;

use crate::glue::HostRequests;

/// Frames between two debug-level cache reports.
const STATS_INTERVAL: u64 = 600;

/// Window-side adapter: feeds input and ticks to the frame driver and draws
/// the replayed frame.
pub struct HostApp {
    driver: FrameDriver,
    requests: Rc<RefCell<HostRequests>>,
    batch: QuadBatch,
    renderer: QuadRenderer,
    /// Last frame error logged; repeats are suppressed until it changes.
    last_error: Option<String>,
}

impl HostApp {
    pub fn new(driver: FrameDriver, requests: Rc<RefCell<HostRequests>>) -> Self {
        Self {
            driver,
            requests,
            batch: QuadBatch::new(),
            renderer: QuadRenderer::new(),
            last_error: None,
        }
    }

    fn report(&mut self, result: Result<(), lustre_engine::FrameError>) {
        match result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                let msg = e.to_string();
                if self.last_error.as_deref() != Some(msg.as_str()) {
                    log::error!(target: SCRIPT_TARGET, "{msg}");
                    self.last_error = Some(msg);
                }
            }
        }
    }
}

impl App for HostApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        // ── Input ─────────────────────────────────────────────────────────
        for ev in &ctx.input_frame.events {
            if let Err(e) = self.driver.handle_input(ev) {
                log::error!(target: SCRIPT_TARGET, "{e}");
            }
        }

        // ── Script frame ──────────────────────────────────────────────────
        let screen = ctx.window.logical_size();
        self.batch.begin(screen);
        let result = self.driver.frame(screen, &mut self.batch);
        self.report(result);

        if ctx.time.frame_index % STATS_INTERVAL == 0 {
            let stats = self.driver.cache_stats();
            log::debug!(
                "frame {}: text cache {} hits, {} misses, {} evictions; {} task(s) pending; {} GPU texture(s)",
                ctx.time.frame_index,
                stats.hits,
                stats.misses,
                stats.evictions,
                self.driver.pending_tasks(),
                self.renderer.resident_textures(),
            );
        }

        {
            let mut requests = self.requests.borrow_mut();
            if let Some(title) = requests.title.take() {
                ctx.window.set_title(&title);
            }
            if requests.exit {
                ctx.runtime.exit();
            }
        }

        // ── Render ────────────────────────────────────────────────────────
        let batch = &self.batch;
        let renderer = &mut self.renderer;
        ctx.render(self.driver.clear_color(), |rctx, target| {
            renderer.render(rctx, target, batch);
        })
    }

    fn on_exit(&mut self) {
        if let Err(e) = self.driver.shutdown() {
            log::error!(target: SCRIPT_TARGET, "{e}");
        }
    }
}

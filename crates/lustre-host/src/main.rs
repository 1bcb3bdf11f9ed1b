mod app;
mod cli;
mod fonts;
mod glue;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use lustre_engine::coords::Viewport;
use lustre_engine::device::GpuOptions;
use lustre_engine::logging::{init_logging, LoggingConfig};
use lustre_engine::window::{Runtime, RuntimeConfig};
use lustre_engine::{DriverConfig, FrameDriver};
use winit::dpi::LogicalSize;

use crate::app::HostApp;
use crate::cli::Args;
use crate::glue::HostRequests;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(LoggingConfig { filter: args.log.clone(), ..Default::default() });

    let script = args
        .launch_script
        .canonicalize()
        .with_context(|| format!("launch script {} not found", args.launch_script.display()))?;
    let script_dir = script.parent().map(|p| p.to_path_buf()).unwrap_or_default();
    let user_dir = std::env::current_dir().context("failed to read the working directory")?;

    let fonts = fonts::load_fonts(args.font_dir.as_deref());
    let config = DriverConfig { script_dir, user_dir, ..Default::default() };
    let mut driver = FrameDriver::new(config, Box::new(fonts)).map_err(to_anyhow).context("failed to start the script host")?;
    driver.set_screen(Viewport::new(args.width as f32, args.height as f32));

    let requests = Rc::new(RefCell::new(HostRequests::default()));
    glue::register(driver.lua(), &requests).map_err(to_anyhow).context("failed to register host functions")?;

    driver.run_script(&script).map_err(to_anyhow)?;
    driver.init().map_err(to_anyhow)?;

    let runtime = RuntimeConfig {
        title: args.title,
        initial_size: LogicalSize::new(args.width as f64, args.height as f64),
    };
    let gpu = GpuOptions { vsync: !args.no_vsync, ..Default::default() };
    Runtime::run(runtime, gpu, HostApp::new(driver, requests))
}

/// Converts a non-`Send` error (Lua errors are `!Send` here) into an
/// `anyhow::Error`, keeping its full source chain in the message.
fn to_anyhow<E: std::error::Error>(e: E) -> anyhow::Error {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    anyhow::anyhow!(msg)
}

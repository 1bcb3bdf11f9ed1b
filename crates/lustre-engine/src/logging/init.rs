use std::io::Write;
use std::sync::Once;

/// Log target of main-interpreter console output.
pub const SCRIPT_TARGET: &str = "lustre::script";
/// Log target of worker-interpreter console output and worker diagnostics.
pub const WORKER_TARGET: &str = "lustre::worker";

/// Used when neither the config nor `RUST_LOG` sets a filter. The wgpu
/// crates log every resource at info.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter, e.g. "lustre::script=debug". Takes precedence
    /// over `RUST_LOG`.
    pub filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: None, write_style: env_logger::WriteStyle::Auto }
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the `log` backend. Only the first call has any
/// effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = resolve_filter(config.filter, std::env::var("RUST_LOG").ok());
        env_logger::Builder::new()
            .parse_filters(&filter)
            .write_style(config.write_style)
            .format(|buf, record| {
                let prefix = line_prefix(record.target(), record.level());
                writeln!(buf, "{prefix} {}", record.args())
            })
            .init();
        log::debug!("logging initialized with filter '{filter}'");
    });
}

fn resolve_filter(configured: Option<String>, env: Option<String>) -> String {
    configured
        .into_iter()
        .chain(env)
        .find(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Script console output reads as the script's own; everything else names
/// its level and origin.
fn line_prefix(target: &str, level: log::Level) -> String {
    match target {
        SCRIPT_TARGET if level == log::Level::Info => "[script]".to_string(),
        SCRIPT_TARGET => format!("[script {level}]"),
        WORKER_TARGET => format!("[worker {level}]"),
        _ => format!("[{level} {target}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn configured_filter_wins_over_the_environment() {
        assert_eq!(resolve_filter(Some("debug".into()), Some("warn".into())), "debug");
        assert_eq!(resolve_filter(None, Some("warn".into())), "warn");
        assert_eq!(resolve_filter(Some("  ".into()), None), DEFAULT_FILTER);
        assert_eq!(resolve_filter(None, None), DEFAULT_FILTER);
    }

    #[test]
    fn console_lines_are_tagged_by_interpreter() {
        assert_eq!(line_prefix(SCRIPT_TARGET, Level::Info), "[script]");
        assert_eq!(line_prefix(SCRIPT_TARGET, Level::Warn), "[script WARN]");
        assert_eq!(line_prefix(WORKER_TARGET, Level::Debug), "[worker DEBUG]");
        assert_eq!(line_prefix("wgpu_core::device", Level::Error), "[ERROR wgpu_core::device]");
    }
}

use std::path::PathBuf;

use clap::Parser;

/// Runs a Lua launch script in a window.
#[derive(Debug, Parser)]
#[command(name = "lustre-host", version, about)]
pub struct Args {
    /// Script run once at startup; it registers the frame callbacks.
    pub launch_script: PathBuf,

    /// Window title.
    #[arg(long, default_value = "lustre")]
    pub title: String,

    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Directory searched first for the FIXED, VAR and VAR BOLD fonts.
    #[arg(long)]
    pub font_dir: Option<PathBuf>,

    /// Present frames as soon as they are ready instead of on vertical blank.
    #[arg(long)]
    pub no_vsync: bool,

    /// Log filter in env_logger syntax, e.g. "lustre::script=debug".
    #[arg(long)]
    pub log: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["lustre-host", "main.lua"]);
        assert_eq!(args.launch_script, PathBuf::from("main.lua"));
        assert_eq!((args.width, args.height), (1280, 720));
        assert_eq!(args.title, "lustre");
        assert!(args.font_dir.is_none() && args.log.is_none());
        assert!(!args.no_vsync);
    }

    #[test]
    fn overrides() {
        let args = Args::parse_from([
            "lustre-host", "ui/main.lua", "--title", "Builds", "--width", "800", "--height", "600",
            "--font-dir", "fonts", "--log", "debug", "--no-vsync",
        ]);
        assert_eq!(args.title, "Builds");
        assert_eq!((args.width, args.height), (800, 600));
        assert_eq!(args.font_dir, Some(PathBuf::from("fonts")));
        assert_eq!(args.log.as_deref(), Some("debug"));
        assert!(args.no_vsync);
    }
}

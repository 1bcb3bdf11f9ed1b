//! Console, time and path functions.
//!
//! These are the host functions a worker interpreter may be granted, so each
//! installer only captures plain `Send` data.

use std::path::PathBuf;
use std::time::Instant;

use mlua::{Function, Lua, MultiValue};

use crate::paint::style::strip_escapes;

use super::args::Args;

/// Host functions that may be installed into any interpreter.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HostFunction {
    ConPrintf,
    Print,
    GetTime,
    StripEscapes,
    GetScriptPath,
    GetUserPath,
}

impl HostFunction {
    pub const ALL: [HostFunction; 6] = [
        Self::ConPrintf,
        Self::Print,
        Self::GetTime,
        Self::StripEscapes,
        Self::GetScriptPath,
        Self::GetUserPath,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ConPrintf => "ConPrintf",
            Self::Print => "print",
            Self::GetTime => "GetTime",
            Self::StripEscapes => "StripEscapes",
            Self::GetScriptPath => "GetScriptPath",
            Self::GetUserPath => "GetUserPath",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Parses a comma separated isolation list. Blank entries are skipped.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self::from_name(s).ok_or_else(|| format!("unknown host function '{s}'")))
            .collect()
    }
}

/// What the console functions need to know about their host.
#[derive(Debug, Clone)]
pub struct ConsoleEnv {
    pub start: Instant,
    pub script_dir: PathBuf,
    pub user_dir: PathBuf,
    pub log_target: &'static str,
}

impl ConsoleEnv {
    /// Milliseconds since `start`.
    pub fn elapsed_ms(&self) -> i64 {
        self.start.elapsed().as_millis() as i64
    }
}

/// Installs `f` as a global of `lua`.
pub fn install(lua: &Lua, f: HostFunction, env: &ConsoleEnv) -> mlua::Result<()> {
    let target = env.log_target;
    let func = match f {
        HostFunction::ConPrintf => lua.create_function(move |lua, args: MultiValue| {
            let format: Function = lua.globals().get::<mlua::Table>("string")?.get("format")?;
            let line: mlua::String = format.call(args)?;
            log::info!(target: target, "{}", line.to_string_lossy().trim_end_matches('\n'));
            Ok(())
        })?,

        HostFunction::Print => lua.create_function(move |lua, args: MultiValue| {
            let tostring: Function = lua.globals().get("tostring")?;
            let mut parts = Vec::with_capacity(args.len());
            for v in args {
                let s: mlua::String = tostring.call(v)?;
                parts.push(s.to_string_lossy().to_string());
            }
            log::info!(target: target, "{}", parts.join("\t"));
            Ok(())
        })?,

        HostFunction::GetTime => {
            let env = env.clone();
            lua.create_function(move |_, ()| Ok(env.elapsed_ms()))?
        }

        HostFunction::StripEscapes => lua.create_function(|lua, args: MultiValue| {
            let args = Args::new("StripEscapes", args);
            args.require(1, "StripEscapes(string)")?;
            let text = args.bytes(1)?;
            lua.create_string(strip_escapes(&text))
        })?,

        HostFunction::GetScriptPath => {
            let dir = env.script_dir.to_string_lossy().into_owned();
            lua.create_function(move |_, ()| Ok(dir.clone()))?
        }

        HostFunction::GetUserPath => {
            let dir = env.user_dir.to_string_lossy().into_owned();
            lua.create_function(move |_, ()| Ok(dir.clone()))?
        }
    };
    lua.globals().set(f.name(), func)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> ConsoleEnv {
        ConsoleEnv {
            start: Instant::now(),
            script_dir: PathBuf::from("/scripts"),
            user_dir: PathBuf::from("/home/u"),
            log_target: "test",
        }
    }

    #[test]
    fn parses_isolation_lists() {
        assert_eq!(
            HostFunction::parse_list(" ConPrintf, GetTime,,").unwrap(),
            vec![HostFunction::ConPrintf, HostFunction::GetTime]
        );
        assert!(HostFunction::parse_list("").unwrap().is_empty());
        let err = HostFunction::parse_list("ConPrintf,DrawImage").unwrap_err();
        assert!(err.contains("DrawImage"));
    }

    #[test]
    fn installed_functions_are_callable() {
        let lua = Lua::new();
        let env = env();
        for f in HostFunction::ALL {
            install(&lua, f, &env).unwrap();
        }
        let (path, stripped, t): (String, String, i64) = lua
            .load(r#"
                ConPrintf("%d %s", 3, "x")
                print("a", 1, nil)
                return GetScriptPath(), StripEscapes("^1red^x00FF00green"), GetTime()
            "#)
            .eval()
            .unwrap();
        assert_eq!(path, "/scripts");
        assert_eq!(stripped, "redgreen");
        assert!(t >= 0);
    }

    #[test]
    fn strip_escapes_keeps_raw_bytes() {
        let lua = Lua::new();
        install(&lua, HostFunction::StripEscapes, &env()).unwrap();
        let (unchanged, len, stripped): (bool, i64, mlua::String) = lua
            .load(r#"
                local s = "\255\254^xZZ"
                local r = StripEscapes(s)
                return r == s, #r, StripEscapes("\255^2\254")
            "#)
            .eval()
            .unwrap();
        assert!(unchanged);
        assert_eq!(len, 6);
        assert_eq!(&*stripped.as_bytes(), b"\xff\xfe");
    }

    #[test]
    fn uninstalled_functions_are_absent() {
        let lua = Lua::new();
        install(&lua, HostFunction::GetTime, &env()).unwrap();
        let missing: bool = lua.load("return GetUserPath == nil").eval().unwrap();
        assert!(missing);
    }
}

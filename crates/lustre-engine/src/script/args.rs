//! Argument checking for script-facing functions.
//!
//! Every binding reports misuse as `mlua::Error::RuntimeError` carrying a
//! message that names the function, so the error surfaces at the script
//! call site.

use mlua::{MultiValue, Value};

use crate::error::DrawError;

/// Positional arguments of one binding call.
pub(crate) struct Args {
    call: &'static str,
    values: Vec<Value>,
}

impl Args {
    pub fn new(call: &'static str, args: MultiValue) -> Self {
        Self { call, values: args.into_iter().collect() }
    }

    #[inline]
    pub fn call(&self) -> &'static str {
        self.call
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Argument `n` (1-based); `nil` when absent.
    pub fn get(&self, n: usize) -> &Value {
        self.values.get(n - 1).unwrap_or(&Value::Nil)
    }

    pub fn is_nil(&self, n: usize) -> bool {
        matches!(self.get(n), Value::Nil)
    }

    /// Fails with `Usage: <usage>` unless at least `n` arguments were given.
    pub fn require(&self, n: usize, usage: &str) -> mlua::Result<()> {
        if self.len() < n {
            return Err(usage_error(format!("Usage: {usage}")));
        }
        Ok(())
    }

    pub fn number(&self, n: usize) -> mlua::Result<f64> {
        match self.get(n) {
            Value::Integer(i) => Ok(*i as f64),
            Value::Number(v) => Ok(*v),
            Value::String(s) => s
                .to_str()
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .ok_or_else(|| self.type_error(n, "number")),
            _ => Err(self.type_error(n, "number")),
        }
    }

    pub fn opt_number(&self, n: usize) -> mlua::Result<Option<f64>> {
        if self.is_nil(n) { Ok(None) } else { self.number(n).map(Some) }
    }

    pub fn int(&self, n: usize) -> mlua::Result<i32> {
        Ok(self.number(n)?.floor() as i32)
    }

    /// String argument; numbers are converted like Lua does.
    pub fn string(&self, n: usize) -> mlua::Result<String> {
        match self.get(n) {
            Value::String(s) => Ok(s.to_string_lossy().to_string()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Number(v) => Ok(v.to_string()),
            _ => Err(self.type_error(n, "string")),
        }
    }

    /// String argument as raw bytes, with no UTF-8 conversion.
    pub fn bytes(&self, n: usize) -> mlua::Result<Vec<u8>> {
        match self.get(n) {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            Value::Integer(_) | Value::Number(_) => self.string(n).map(String::into_bytes),
            _ => Err(self.type_error(n, "string")),
        }
    }

    /// Text size in pixels: a finite number above zero.
    pub fn text_height(&self, n: usize) -> mlua::Result<f32> {
        let px = self.number(n)?;
        if px.is_finite() && px > 0.0 {
            Ok(px as f32)
        } else {
            Err(self.value_error(n, format!("text height must be a positive number, got {px}")))
        }
    }

    pub fn opt_string(&self, n: usize) -> mlua::Result<Option<String>> {
        if self.is_nil(n) { Ok(None) } else { self.string(n).map(Some) }
    }

    pub fn type_error(&self, n: usize, expected: &str) -> mlua::Error {
        usage_error(format!(
            "{}() argument {n}: expected {expected}, got {}",
            self.call,
            type_name(self.get(n)),
        ))
    }

    /// Error for an argument that has the right type but a bad value.
    pub fn value_error(&self, n: usize, msg: impl std::fmt::Display) -> mlua::Error {
        usage_error(format!("{}() argument {n}: {msg}", self.call))
    }
}

/// Lua's name for the type of `v`.
pub(crate) fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Integer(_) => "number",
        other => other.type_name(),
    }
}

pub(crate) fn usage_error(msg: impl Into<String>) -> mlua::Error {
    mlua::Error::RuntimeError(msg.into())
}

/// Converts a queue error into the script-facing error of `call`.
pub(crate) fn draw_error(call: &str, err: DrawError) -> mlua::Error {
    usage_error(format!("{call}() {err}"))
}

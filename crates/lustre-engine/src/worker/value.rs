use mlua::{Lua, Value};
use thiserror::Error;

/// A value allowed to cross the worker isolation boundary.
///
/// Strings are byte strings: Lua strings need not be UTF-8.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(Vec<u8>),
}

/// A value of an unsupported type met while marshaling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("value #{position} has unsupported type {type_name}")]
pub struct MarshalError {
    /// 1-based position in the marshaled list.
    pub position: usize,
    pub type_name: &'static str,
}

/// Result of marshaling a value list: the supported prefix and, when the
/// list was cut short, why.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Marshaled {
    pub values: Vec<ScriptValue>,
    pub error: Option<MarshalError>,
}

impl ScriptValue {
    /// Copies a Lua value out of its interpreter. `position` is reported in
    /// the error.
    pub fn from_lua(value: &Value, position: usize) -> Result<Self, MarshalError> {
        match value {
            Value::Nil => Ok(Self::Nil),
            Value::Boolean(b) => Ok(Self::Boolean(*b)),
            Value::Integer(i) => Ok(Self::Integer(*i)),
            Value::Number(n) => Ok(Self::Number(*n)),
            Value::String(s) => Ok(Self::String(s.as_bytes().to_vec())),
            other => Err(MarshalError { position, type_name: other.type_name() }),
        }
    }

    /// Creates the equivalent value inside `lua`.
    pub fn into_lua(self, lua: &Lua) -> mlua::Result<Value> {
        Ok(match self {
            Self::Nil => Value::Nil,
            Self::Boolean(b) => Value::Boolean(b),
            Self::Integer(i) => Value::Integer(i),
            Self::Number(n) => Value::Number(n),
            Self::String(bytes) => Value::String(lua.create_string(&bytes)?),
        })
    }

    /// UTF-8 view of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        Self::String(s.as_bytes().to_vec())
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for ScriptValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Copies values until the first unsupported one.
pub fn marshal_values<I>(values: I) -> Marshaled
where
    I: IntoIterator<Item = Value>,
{
    let mut out = Marshaled::default();
    for (i, value) in values.into_iter().enumerate() {
        match ScriptValue::from_lua(&value, i + 1) {
            Ok(v) => out.values.push(v),
            Err(e) => {
                out.error = Some(e);
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_supported_types() {
        let lua = Lua::new();
        let values: mlua::MultiValue = lua
            .load(r#"return nil, true, 42, 1.5, "hi""#)
            .eval()
            .unwrap();
        let m = marshal_values(values);
        assert_eq!(m.error, None);
        assert_eq!(m.values, vec![
            ScriptValue::Nil,
            ScriptValue::Boolean(true),
            ScriptValue::Integer(42),
            ScriptValue::Number(1.5),
            ScriptValue::from("hi"),
        ]);
    }

    #[test]
    fn stops_at_first_unsupported_value() {
        let lua = Lua::new();
        let values: mlua::MultiValue = lua
            .load(r#"return 1, "two", {}, 4"#)
            .eval()
            .unwrap();
        let m = marshal_values(values);
        assert_eq!(m.values, vec![ScriptValue::Integer(1), ScriptValue::from("two")]);
        assert_eq!(m.error, Some(MarshalError { position: 3, type_name: "table" }));
    }

    #[test]
    fn binary_strings_survive() {
        let lua = Lua::new();
        let v = ScriptValue::String(vec![0, 255, 10]).into_lua(&lua).unwrap();
        let back = ScriptValue::from_lua(&v, 1).unwrap();
        assert_eq!(back, ScriptValue::String(vec![0, 255, 10]));
        assert_eq!(back.as_str(), None);
    }
}

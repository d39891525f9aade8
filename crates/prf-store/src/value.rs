use std::fmt;

use serde::{Deserialize, Serialize};

/// A value in one of the shapes the underlying store can hold natively.
///
/// This is a closed set: every higher-level type must reduce to one of these
/// variants through an adapter before it reaches the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    /// UTF-8 text.
    String(String),
    /// 64-bit signed integer.
    Int(i64),
    /// Boolean flag.
    Bool(bool),
    /// Double-precision float.
    Double(f64),
    /// Opaque byte sequence.
    Bytes(Vec<u8>),
    /// Native list of strings.
    StringList(Vec<String>),
    /// Native list of 64-bit integers.
    IntList(Vec<i64>),
}

/// Discriminant of a [`RawValue`], used when reporting shape mismatches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawKind {
    String,
    Int,
    Bool,
    Double,
    Bytes,
    StringList,
    IntList,
}

impl RawValue {
    /// The shape of this value.
    pub fn kind(&self) -> RawKind {
        match self {
            Self::String(_) => RawKind::String,
            Self::Int(_) => RawKind::Int,
            Self::Bool(_) => RawKind::Bool,
            Self::Double(_) => RawKind::Double,
            Self::Bytes(_) => RawKind::Bytes,
            Self::StringList(_) => RawKind::StringList,
            Self::IntList(_) => RawKind::IntList,
        }
    }
}

impl RawKind {
    /// Stable lowercase name of the shape.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Double => "double",
            Self::Bytes => "bytes",
            Self::StringList => "string_list",
            Self::IntList => "int_list",
        }
    }
}

impl fmt::Display for RawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

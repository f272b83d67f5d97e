//! Wire value definitions
//!
//! Every unit exchanged on the wire (and stored in the append-only log).

use bytes::Bytes;

/// Type marker bytes
pub const SIMPLE_STRING: u8 = b'+';
pub const ERROR: u8 = b'-';
pub const INTEGER: u8 = b':';
pub const BULK_STRING: u8 = b'$';
pub const ARRAY: u8 = b'*';

/// A single protocol value
///
/// Payloads are raw bytes; nothing here is validated as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `+OK\r\n`
    SimpleString(Bytes),

    /// `-ERR message\r\n`
    Error(Bytes),

    /// `:1000\r\n`
    Integer(i64),

    /// `$6\r\nfoobar\r\n`
    BulkString(Bytes),

    /// `$-1\r\n`, an absent bulk string (not the same as an empty one)
    Null,

    /// `*2\r\n...`
    Array(Vec<Value>),
}

impl Value {
    pub fn ok() -> Self {
        Value::SimpleString(Bytes::from_static(b"OK"))
    }

    pub fn simple(s: impl Into<Bytes>) -> Self {
        Value::SimpleString(s.into())
    }

    /// Error reply. The text is used as-is, so callers include the
    /// `ERR` prefix themselves when they want one.
    pub fn error(s: impl Into<Bytes>) -> Self {
        Value::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        Value::Integer(n)
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Value::BulkString(data.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(items)
    }

    /// Build an array of bulk strings, the shape every client request takes.
    pub fn command<I, T>(parts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        Value::Array(parts.into_iter().map(|p| Value::BulkString(p.into())).collect())
    }

    /// Payload of a string-like value (bulk or simple).
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::BulkString(data) | Value::SimpleString(data) => Some(data),
            _ => None,
        }
    }

    /// Short variant name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::SimpleString(_) => "simple string",
            Value::Error(_) => "error",
            Value::Integer(_) => "integer",
            Value::BulkString(_) => "bulk string",
            Value::Null => "null",
            Value::Array(_) => "array",
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<Option<Bytes>> for Value {
    fn from(data: Option<Bytes>) -> Self {
        match data {
            Some(data) => Value::BulkString(data),
            None => Value::Null,
        }
    }
}

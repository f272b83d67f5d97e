//! Command Module
//!
//! Maps command names to handlers.
//!
//! ## Commands
//! | Name   | Args | Writes | Reply                          |
//! |--------|------|--------|--------------------------------|
//! | PING   | 0–1  | no     | `+PONG` or the argument        |
//! | ECHO   | 1    | no     | the argument                   |
//! | SET    | 2    | yes    | `+OK`                          |
//! | GET    | 1    | no     | bulk string or null            |
//! | DEL    | ≥1   | yes    | number of keys removed         |
//! | EXISTS | ≥1   | no     | number of keys present         |
//! | DBSIZE | 0    | no     | number of keys                 |
//! | SHUTDOWN | 0  | no     | `+OK`, then the server stops   |

mod dispatcher;
mod handlers;

use bytes::Bytes;

use crate::error::{KvError, Result};
use crate::protocol::Value;
use crate::store::Store;

pub use dispatcher::{error_reply, Dispatcher};

/// Handler signature shared by every command
pub type Handler = fn(&Store, &[Bytes]) -> Value;

/// Every supported command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Ping,
    Echo,
    Set,
    Get,
    Del,
    Exists,
    DbSize,
    Shutdown,
}

/// Accepted argument counts (not counting the command name)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(want) => n == want,
            Arity::Range(lo, hi) => (lo..=hi).contains(&n),
            Arity::AtLeast(lo) => n >= lo,
        }
    }
}

/// Registry entry
pub struct CommandSpec {
    pub kind: CommandKind,
    pub name: &'static str,
    pub arity: Arity,
    /// Mutates the store, so it is logged and replayed
    pub write: bool,
    pub handler: Handler,
}

/// The command table
pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        kind: CommandKind::Ping,
        name: "PING",
        arity: Arity::Range(0, 1),
        write: false,
        handler: handlers::ping,
    },
    CommandSpec {
        kind: CommandKind::Echo,
        name: "ECHO",
        arity: Arity::Exact(1),
        write: false,
        handler: handlers::echo,
    },
    CommandSpec {
        kind: CommandKind::Set,
        name: "SET",
        arity: Arity::Exact(2),
        write: true,
        handler: handlers::set,
    },
    CommandSpec {
        kind: CommandKind::Get,
        name: "GET",
        arity: Arity::Exact(1),
        write: false,
        handler: handlers::get,
    },
    CommandSpec {
        kind: CommandKind::Del,
        name: "DEL",
        arity: Arity::AtLeast(1),
        write: true,
        handler: handlers::del,
    },
    CommandSpec {
        kind: CommandKind::Exists,
        name: "EXISTS",
        arity: Arity::AtLeast(1),
        write: false,
        handler: handlers::exists,
    },
    CommandSpec {
        kind: CommandKind::DbSize,
        name: "DBSIZE",
        arity: Arity::Exact(0),
        write: false,
        handler: handlers::dbsize,
    },
    CommandSpec {
        kind: CommandKind::Shutdown,
        name: "SHUTDOWN",
        arity: Arity::Exact(0),
        write: false,
        handler: handlers::shutdown,
    },
];

impl CommandKind {
    /// Find a command by name, ignoring ASCII case
    pub fn lookup(name: &[u8]) -> Option<CommandKind> {
        COMMANDS
            .iter()
            .find(|spec| spec.name.as_bytes().eq_ignore_ascii_case(name))
            .map(|spec| spec.kind)
    }

    pub fn spec(self) -> &'static CommandSpec {
        // COMMANDS is laid out in variant order.
        &COMMANDS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn is_write(self) -> bool {
        self.spec().write
    }
}

/// A command extracted from an array value
///
/// The first element names the command; the rest are its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub kind: CommandKind,
    pub args: Vec<Bytes>,
}

impl Request {
    /// Validate shape, name, and argument count
    pub fn from_value(value: &Value) -> Result<Request> {
        let items = match value {
            Value::Array(items) if !items.is_empty() => items,
            Value::Array(_) => {
                return Err(KvError::InvalidRequest("empty command".to_string()));
            }
            other => {
                return Err(KvError::InvalidRequest(format!(
                    "expected array, got {}",
                    other.kind()
                )));
            }
        };

        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            let part = item.as_bytes().ok_or_else(|| {
                KvError::InvalidRequest(format!(
                    "expected string arguments, got {}",
                    item.kind()
                ))
            })?;
            parts.push(part.clone());
        }

        let name = parts.remove(0);
        let kind = CommandKind::lookup(&name)
            .ok_or_else(|| KvError::UnknownCommand(String::from_utf8_lossy(&name).into_owned()))?;

        if !kind.spec().arity.accepts(parts.len()) {
            return Err(KvError::WrongArgCount(kind.name().to_ascii_lowercase()));
        }

        Ok(Request { kind, args: parts })
    }

    /// Canonical array form: upper-case name followed by bulk arguments
    pub fn to_value(&self) -> Value {
        let mut items = Vec::with_capacity(1 + self.args.len());
        items.push(Value::bulk(self.kind.name()));
        items.extend(self.args.iter().cloned().map(Value::BulkString));
        Value::Array(items)
    }
}

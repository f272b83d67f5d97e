//! Append-only Log (AOF) Module
//!
//! Provides durability by recording every mutating command.
//!
//! ## Responsibilities
//! - Append each mutating command before it is acknowledged
//! - Sync the file to stable storage once per interval, in the background
//! - Replay every recorded command at startup
//!
//! ## File Format
//! No header, no checksums, no record count: the file is the concatenation
//! of marshaled values, byte-identical to what a client sends.
//! ```text
//! *3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
//! *3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbaz\r\n
//! ...
//! ```
//! A record cut short by a crash surfaces as a protocol error on replay and
//! is not repaired.

mod log;
mod sync;

pub use log::{AppendLog, LogStats};

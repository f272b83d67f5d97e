//! # respkv
//!
//! A minimal in-memory key-value store with:
//! - A RESP-style line-oriented wire protocol
//! - An append-only command log for durability, synced once per interval
//! - Startup replay of the log through the same codec used on the wire
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                 (one connection at a time)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ bytes ⇄ Value (codec)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │          (append mutating commands, then dispatch)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ AppendLog   │          │ Dispatcher  │
//!   │ (+ sync     │          │   → Store   │
//!   │   thread)   │          │  (RwLock)   │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod aof;
pub mod store;
pub mod command;
pub mod network;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::Engine;
pub use protocol::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of respkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single thread accepts and serves one client at a time
//! - Requests routed through Engine

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;

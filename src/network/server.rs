//! TCP Server
//!
//! Accepts connections and serves them one at a time until a client sends
//! SHUTDOWN.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;

use super::Connection;

/// TCP server for respkv
///
/// Connections are served sequentially: the next `accept` happens only
/// after the current client has gone away.
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            engine,
            listener,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until a client sends SHUTDOWN (blocking)
    ///
    /// Returns once that client's connection is closed; the caller then owns
    /// closing the engine.
    pub fn run(&self) -> Result<()> {
        while !self.engine.shutdown_requested() {
            self.serve_next()?;
        }
        tracing::info!("Server shut down");
        Ok(())
    }

    /// Accept one connection and serve it to completion
    ///
    /// Per-connection failures are logged and swallowed; only a failing
    /// listener is returned as an error.
    pub fn serve_next(&self) -> Result<()> {
        let (stream, addr) = self.listener.accept()?;
        tracing::debug!("Accepted connection from {}", addr);

        let result = Connection::new(stream, Arc::clone(&self.engine)).and_then(|mut conn| {
            conn.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)?;
            conn.handle()
        });

        if let Err(e) = result {
            tracing::warn!("Connection {} ended with error: {}", addr, e);
        }
        Ok(())
    }
}

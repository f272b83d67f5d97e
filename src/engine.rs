//! Engine Module
//!
//! Ties the store, the dispatcher, and the append-only log together.
//!
//! ## Responsibilities
//! - Rebuild the store from the log on startup
//! - Log every mutating command before it is applied and acknowledged
//! - Turn request values into reply values

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::aof::{AppendLog, LogStats};
use crate::command::{error_reply, CommandKind, Dispatcher, Request};
use crate::config::Config;
use crate::error::{KvError, Result};
use crate::protocol::Value;
use crate::store::Store;

/// The key-value engine
///
/// ## Ordering
/// For a write command: validate → append to log → apply to store → reply.
/// A command that fails validation is never logged, and a command whose
/// append fails is never applied, so the log and the store agree.
pub struct Engine {
    /// The key-value map (shared with the dispatcher)
    store: Arc<Store>,

    /// Command registry bound to `store`
    dispatcher: Dispatcher,

    /// Durability log, absent when `appendonly` is off
    aof: Option<AppendLog>,

    /// Set by a SHUTDOWN request
    shutdown: AtomicBool,
}

impl Engine {
    /// Open an engine with the given config
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Open/create the append-only log
    /// 3. Replay its write commands into a fresh store
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(Store::new());
        let dispatcher = Dispatcher::new(Arc::clone(&store));

        let aof = if config.appendonly {
            if let Some(parent) = config.aof_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }

            let log = AppendLog::open(&config.aof_path, config.sync_interval)?;
            let replayed = log.replay(|value| Self::replay_one(&dispatcher, &value))?;

            tracing::info!(
                path = %config.aof_path.display(),
                commands = replayed,
                keys = store.len(),
                "append-only log replayed"
            );
            Some(log)
        } else {
            None
        };

        Ok(Self {
            store,
            dispatcher,
            aof,
            shutdown: AtomicBool::new(false),
        })
    }

    /// Open with a log path (convenience method)
    ///
    /// Uses default config with the specified log file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().aof_path(path).build();
        Self::open(config)
    }

    fn replay_one(dispatcher: &Dispatcher, value: &Value) -> Result<()> {
        let request = Request::from_value(value)
            .map_err(|e| KvError::AofCorruption(format!("unreplayable record: {}", e)))?;

        if request.kind.is_write() {
            dispatcher.dispatch(&request);
        }
        Ok(())
    }

    /// Execute one request and produce the reply
    ///
    /// Failures are reported as error values, never as `Err`, because they
    /// are meant for the client.
    pub fn execute(&self, value: &Value) -> Value {
        let request = match Request::from_value(value) {
            Ok(request) => request,
            Err(e) => return error_reply(&e),
        };

        if request.kind.is_write() {
            if let Some(aof) = &self.aof {
                if let Err(e) = aof.append(&request.to_value()) {
                    tracing::error!(command = request.kind.name(), error = %e, "append to log failed");
                    return error_reply(&e);
                }
            }
        }

        if request.kind == CommandKind::Shutdown {
            tracing::info!("shutdown requested");
            self.shutdown.store(true, Ordering::SeqCst);
        }

        self.dispatcher.dispatch(&request)
    }

    /// Whether a client has sent SHUTDOWN
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Force the log onto stable storage now
    pub fn sync(&self) -> Result<()> {
        match &self.aof {
            Some(aof) => aof.sync(),
            None => Ok(()),
        }
    }

    /// Close the engine gracefully
    ///
    /// Stops the log's sync task and syncs it one last time
    pub fn close(self) -> Result<()> {
        match self.aof {
            Some(aof) => aof.close(),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Log counters, if the log is enabled
    pub fn aof_stats(&self) -> Option<Arc<LogStats>> {
        self.aof.as_ref().map(AppendLog::stats)
    }
}

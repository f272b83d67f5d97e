//! Background sync task
//!
//! A thread that runs a callback on a fixed interval until told to stop.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use crossbeam::select;

/// Periodic task owned by an [`AppendLog`](super::AppendLog)
///
/// Stopping drops the shutdown sender, which wakes the thread immediately,
/// and then joins it. Once `stop` returns the callback will not run again.
pub(crate) struct SyncTask {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SyncTask {
    /// Spawn the thread. The first tick fires one `interval` after spawning.
    pub(crate) fn spawn<F>(name: &str, interval: Duration, mut on_tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let ticker = channel::tick(interval);
                loop {
                    select! {
                        recv(ticker) -> _ => on_tick(),
                        recv(shutdown_rx) -> _ => break,
                    }
                }
            })?;

        tracing::debug!(task = name, ?interval, "sync task started");

        Ok(Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it to exit
    pub(crate) fn stop(&mut self) {
        drop(self.shutdown.take());

        if let Some(handle) = self.handle.take() {
            let name = handle.thread().name().unwrap_or("sync").to_string();
            if handle.join().is_err() {
                tracing::warn!(task = %name, "sync task panicked");
            } else {
                tracing::debug!(task = %name, "sync task stopped");
            }
        }
    }
}

impl Drop for SyncTask {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Append-only log
//!
//! Appends marshaled values to a file, syncs it in the background, and
//! replays it through the codec at startup.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{KvError, Result};
use crate::protocol::{marshal, Decoder, Value};

use super::sync::SyncTask;

/// File handle plus the bookkeeping that must change with it
struct LogFile {
    file: File,

    /// Appended since the last successful sync
    dirty: bool,

    /// Failure from the background task, reported by the next `sync`/`close`
    sync_error: Option<io::Error>,

    /// Set once a write fails. The tail may now hold a partial record, and
    /// anything appended after it could never be replayed.
    write_failed: Option<io::ErrorKind>,
}

impl LogFile {
    fn sync(&mut self, stats: &LogStats) -> io::Result<()> {
        self.file.sync_data()?;
        self.dirty = false;
        stats.syncs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Counters describing log activity
#[derive(Debug, Default)]
pub struct LogStats {
    appends: AtomicU64,
    syncs: AtomicU64,
}

impl LogStats {
    /// Number of values appended since open
    pub fn appends(&self) -> u64 {
        self.appends.load(Ordering::Relaxed)
    }

    /// Number of completed fsyncs (background, explicit, and on close)
    pub fn syncs(&self) -> u64 {
        self.syncs.load(Ordering::Relaxed)
    }
}

/// Append-only command log
///
/// ## Concurrency:
/// - The file handle, its read cursor, and the dirty flag live behind one
///   `Mutex`. Append, replay, and every sync (background or explicit) take
///   it, so none of them ever touch the file at the same time.
/// - Appends land in lock-acquisition order. The file is opened in append
///   mode, so writes always go to end-of-file no matter where replay left
///   the read cursor.
/// - The background sync thread is stopped and joined by `close` (or drop)
///   before the file is released.
pub struct AppendLog {
    path: PathBuf,
    inner: Arc<Mutex<LogFile>>,
    stats: Arc<LogStats>,
    sync_task: Option<SyncTask>,
    closed: bool,
}

impl AppendLog {
    /// Open or create the log and start syncing it every `sync_interval`
    pub fn open(path: impl AsRef<Path>, sync_interval: Duration) -> Result<Self> {
        if sync_interval.is_zero() {
            return Err(KvError::Config(
                "sync interval must be greater than zero".to_string(),
            ));
        }

        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let inner = Arc::new(Mutex::new(LogFile {
            file,
            dirty: false,
            sync_error: None,
            write_failed: None,
        }));
        let stats = Arc::new(LogStats::default());

        let task_inner = Arc::clone(&inner);
        let task_stats = Arc::clone(&stats);
        let sync_task = SyncTask::spawn("aof-sync", sync_interval, move || {
            let mut log = task_inner.lock();
            if !log.dirty {
                return;
            }
            if let Err(e) = log.sync(&task_stats) {
                log.sync_error = Some(e);
            }
        })?;

        tracing::debug!(path = %path.display(), "append-only log opened");

        Ok(Self {
            path,
            inner,
            stats,
            sync_task: Some(sync_task),
            closed: false,
        })
    }

    /// Append one value to the end of the log
    ///
    /// The bytes reach the OS immediately; they reach stable storage at the
    /// next sync.
    ///
    /// After one failed write every later append is refused with
    /// `KvError::AofWrite`, leaving a possibly torn record as the last one
    /// in the file.
    pub fn append(&self, value: &Value) -> Result<()> {
        let bytes = marshal(value);

        let mut log = self.inner.lock();
        if let Some(kind) = log.write_failed {
            return Err(KvError::AofWrite(format!(
                "log refuses writes after an earlier {:?} failure",
                kind
            )));
        }
        if let Err(e) = log.file.write_all(&bytes) {
            log.write_failed = Some(e.kind());
            return Err(e.into());
        }
        log.dirty = true;
        self.stats.appends.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    /// Feed every value in the log, in file order, to `handler`
    ///
    /// Returns the number of values replayed. A malformed or truncated
    /// record stops the replay with `KvError::Protocol`; errors from
    /// `handler` stop it too.
    ///
    /// The log stays locked while `handler` runs, so `handler` must not call
    /// back into this log.
    pub fn replay<F>(&self, mut handler: F) -> Result<usize>
    where
        F: FnMut(Value) -> Result<()>,
    {
        let mut log = self.inner.lock();
        log.file.seek(SeekFrom::Start(0))?;

        let mut count = 0;
        for value in Decoder::new(BufReader::new(&mut log.file)) {
            handler(value?)?;
            count += 1;
        }

        Ok(count)
    }

    /// Force everything appended so far onto stable storage
    ///
    /// Also reports a failure left behind by the background task, if any.
    /// The fsync is attempted either way; the earlier failure wins.
    pub fn sync(&self) -> Result<()> {
        let mut log = self.inner.lock();
        let deferred = log.sync_error.take();
        let result = log.sync(&self.stats);

        match deferred {
            Some(e) => Err(e.into()),
            None => Ok(result?),
        }
    }

    /// Stop the background task, sync a final time, and close the file
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    /// Current size of the log file in bytes
    pub fn size(&self) -> Result<u64> {
        Ok(self.inner.lock().file.metadata()?.len())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Activity counters, shared with the background task
    pub fn stats(&self) -> Arc<LogStats> {
        Arc::clone(&self.stats)
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(mut task) = self.sync_task.take() {
            task.stop();
        }
        self.sync()
    }
}

impl Drop for AppendLog {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sync_still_runs_after_background_failure() {
        let temp = TempDir::new().unwrap();
        let log = AppendLog::open(temp.path().join("test.aof"), Duration::from_secs(3600)).unwrap();
        log.append(&Value::command(["SET", "k", "v"])).unwrap();

        log.inner.lock().sync_error = Some(io::Error::new(io::ErrorKind::Other, "disk gone"));

        assert!(matches!(log.sync(), Err(KvError::Io(_))));
        assert_eq!(log.stats().syncs(), 1);
        assert!(!log.inner.lock().dirty);

        // The deferred error is reported once
        log.sync().unwrap();
    }

    #[test]
    fn test_close_still_syncs_after_background_failure() {
        let temp = TempDir::new().unwrap();
        let log = AppendLog::open(temp.path().join("test.aof"), Duration::from_secs(3600)).unwrap();
        let stats = log.stats();
        log.append(&Value::command(["SET", "k", "v"])).unwrap();

        log.inner.lock().sync_error = Some(io::Error::new(io::ErrorKind::Other, "disk gone"));

        assert!(log.close().is_err());
        assert_eq!(stats.syncs(), 1);
    }

    #[test]
    fn test_append_refused_after_write_failure() {
        let temp = TempDir::new().unwrap();
        let log = AppendLog::open(temp.path().join("test.aof"), Duration::from_secs(3600)).unwrap();
        log.append(&Value::command(["SET", "a", "1"])).unwrap();
        let size = log.size().unwrap();

        log.inner.lock().write_failed = Some(io::ErrorKind::WriteZero);

        let result = log.append(&Value::command(["SET", "c", "3"]));
        assert!(matches!(result, Err(KvError::AofWrite(_))));
        assert_eq!(log.size().unwrap(), size);
        assert_eq!(log.stats().appends(), 1);
    }
}

//! Durable append log of titles that could not be resolved or fetched.
//!
//! The [`FailureRecorder`] is opened once at startup and shared by every
//! pipeline worker behind an `Arc`. Each record is a single line written under
//! a lock, so concurrent workers never interleave partial lines. Lines are
//! flushed as they are written; [`FailureRecorder::close`] additionally syncs
//! the file and releases the handle, and `Drop` flushes on every other exit
//! path (including unwinding).

use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::parser::normalize_title;

/// Errors from the failure log.
#[derive(Debug, Error)]
pub enum FailureRecorderError {
    /// The log file could not be opened or its directory created.
    #[error("cannot open failure log {path}: {source}")]
    Open {
        /// Log path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be written or flushed.
    #[error("cannot write failure log {path}: {source}")]
    Write {
        /// Log path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The log was already closed.
    #[error("failure log {path} is closed")]
    Closed {
        /// Log path.
        path: PathBuf,
    },
}

/// Process-wide append log of failed titles.
#[derive(Debug)]
pub struct FailureRecorder {
    path: PathBuf,
    writer: Mutex<Option<LineWriter<File>>>,
    recorded: AtomicUsize,
}

impl FailureRecorder {
    /// Opens (or creates) the log at `path` in append mode.
    ///
    /// Missing parent directories are created. Existing content is kept;
    /// records from earlier runs are not deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`FailureRecorderError::Open`] if the file cannot be opened.
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, FailureRecorderError> {
        let open_error = |source| FailureRecorderError::Open {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_error)?;

        debug!("failure log opened");
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(Some(LineWriter::new(file))),
            recorded: AtomicUsize::new(0),
        })
    }

    /// Log path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written by this recorder.
    #[must_use]
    pub fn count(&self) -> usize {
        self.recorded.load(Ordering::SeqCst)
    }

    /// Appends the normalized `title` as one line.
    ///
    /// # Errors
    ///
    /// Returns [`FailureRecorderError`] if the log is closed or the write fails.
    pub fn record(&self, title: &str) -> Result<(), FailureRecorderError> {
        let line = format!("{}\n", normalize_title(title));

        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(writer) = guard.as_mut() else {
            return Err(FailureRecorderError::Closed {
                path: self.path.clone(),
            });
        };
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|source| FailureRecorderError::Write {
                path: self.path.clone(),
                source,
            })?;
        drop(guard);

        self.recorded.fetch_add(1, Ordering::SeqCst);
        debug!(title = line.trim_end(), "failure recorded");
        Ok(())
    }

    /// Appends the normalized `title` from async code.
    ///
    /// The locked write and flush run on the blocking pool, so tokio worker
    /// threads never wait on the file.
    ///
    /// # Errors
    ///
    /// Same as [`record`](Self::record). A writer task that could not finish
    /// is reported as [`FailureRecorderError::Write`].
    pub async fn record_async(self: &Arc<Self>, title: &str) -> Result<(), FailureRecorderError> {
        let recorder = Arc::clone(self);
        let title = title.to_string();
        tokio::task::spawn_blocking(move || recorder.record(&title))
            .await
            .map_err(|join_error| FailureRecorderError::Write {
                path: self.path.clone(),
                source: std::io::Error::other(join_error),
            })?
    }

    /// Flushes, syncs and releases the log handle.
    ///
    /// Calling `close` more than once is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`FailureRecorderError::Write`] if the final flush or sync fails.
    pub fn close(&self) -> Result<(), FailureRecorderError> {
        let taken = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut writer) = taken else {
            return Ok(());
        };

        let write_error = |source| FailureRecorderError::Write {
            path: self.path.clone(),
            source,
        };
        writer.flush().map_err(write_error)?;
        writer.get_ref().sync_all().map_err(write_error)?;
        info!(path = %self.path.display(), records = self.count(), "failure log closed");
        Ok(())
    }
}

impl Drop for FailureRecorder {
    fn drop(&mut self) {
        let writer = self
            .writer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(writer) = writer.as_mut()
            && let Err(error) = writer.flush()
        {
            warn!(path = %self.path.display(), error = %error, "failed to flush failure log on drop");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_record_writes_normalized_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("failed.log");
        let recorder = FailureRecorder::open(&path).unwrap();

        recorder.record("  Attention Is All You Need ").unwrap();

        assert_eq!(read_lines(&path), vec!["attention is all you need"]);
        assert_eq!(recorder.count(), 1);
    }

    #[test]
    fn test_record_visible_before_close() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("failed.log");
        let recorder = FailureRecorder::open(&path).unwrap();

        recorder.record("A").unwrap();
        recorder.record("B").unwrap();

        // No close or drop yet: lines must already be on disk.
        assert_eq!(read_lines(&path), vec!["a", "b"]);
    }

    #[test]
    fn test_open_appends_to_existing_log() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("failed.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        let recorder = FailureRecorder::open(&path).unwrap();
        recorder.record("Later Run").unwrap();
        recorder.close().unwrap();

        assert_eq!(read_lines(&path), vec!["earlier run", "later run"]);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logs").join("batch1").join("failed.log");
        let recorder = FailureRecorder::open(&path).unwrap();
        recorder.record("x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_record_after_close_is_error() {
        let temp = TempDir::new().unwrap();
        let recorder = FailureRecorder::open(&temp.path().join("failed.log")).unwrap();
        recorder.close().unwrap();
        recorder.close().unwrap();
        assert!(matches!(
            recorder.record("late"),
            Err(FailureRecorderError::Closed { .. })
        ));
    }

    #[test]
    fn test_concurrent_records_never_interleave() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("failed.log");
        let recorder = Arc::new(FailureRecorder::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let recorder = Arc::clone(&recorder);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        recorder.record(&format!("Thread {t} Title {i}")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        drop(recorder);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 400);
        for line in &lines {
            assert!(line.starts_with("thread "), "corrupted line: {line}");
            assert!(line.contains(" title "), "corrupted line: {line}");
        }
    }

    #[tokio::test]
    async fn test_record_async_writes_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("failed.log");
        let recorder = Arc::new(FailureRecorder::open(&path).unwrap());

        recorder.record_async("Deep Residual Learning").await.unwrap();

        assert_eq!(read_lines(&path), vec!["deep residual learning"]);
        assert_eq!(recorder.count(), 1);
    }

    #[tokio::test]
    async fn test_record_async_after_close_is_error() {
        let temp = TempDir::new().unwrap();
        let recorder = Arc::new(FailureRecorder::open(&temp.path().join("failed.log")).unwrap());
        recorder.close().unwrap();

        let result = recorder.record_async("late").await;
        assert!(matches!(result, Err(FailureRecorderError::Closed { .. })));
    }

    #[test]
    fn test_open_error_for_directory_path() {
        let temp = TempDir::new().unwrap();
        let result = FailureRecorder::open(temp.path());
        assert!(matches!(result, Err(FailureRecorderError::Open { .. })));
    }
}

//! Crash-report directory watcher.
//!
//! Subscribes to filesystem creation events in the client's crash-report
//! directory and forwards each new report as a [`CrashEvent`].

use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use notify_debouncer_full::{
    new_debouncer,
    notify::{self, RecursiveMode},
    DebounceEventResult,
};
use tokio::sync::mpsc;

use super::error::WatcherError;

/// A crash report appeared. Carries no payload beyond the report path.
#[derive(Debug, Clone)]
pub struct CrashEvent {
    /// Path of the newly created crash report.
    pub report: PathBuf,
}

/// Watches the crash-report directory for new files.
///
/// Uses notify-debouncer-full and bridges events from the debouncer's std
/// channel to a tokio mpsc channel on a dedicated thread. The underlying
/// subscription is single-use: restarting a stopped watcher means
/// constructing a fresh instance.
pub struct CrashWatcher {
    /// The directory being watched.
    crash_dir: PathBuf,
    /// Signals the bridge thread to exit.
    stop_tx: std_mpsc::Sender<()>,
    /// Handle to the bridge thread, joined on stop.
    bridge_handle: thread::JoinHandle<()>,
}

impl CrashWatcher {
    /// Start watching `crash_dir` for newly created files.
    ///
    /// Returns the watcher and a receiver of [`CrashEvent`]s.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be watched (missing
    /// directory, watch limit reached). A missing crash directory fails
    /// the watcher at startup rather than being silently retried.
    pub fn start(
        crash_dir: &Path,
    ) -> Result<(Self, mpsc::UnboundedReceiver<CrashEvent>), WatcherError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();
        let (notify_tx, notify_rx) = std_mpsc::channel();

        let mut debouncer = new_debouncer(Duration::from_millis(100), None, move |result| {
            let _ = notify_tx.send(result);
        })?;

        debouncer.watch(crash_dir, RecursiveMode::NonRecursive)?;

        let bridge_handle = thread::spawn(move || {
            loop {
                if stop_rx.try_recv().is_ok() {
                    break;
                }

                match notify_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(result) => Self::handle_debounce_result(result, &event_tx),
                    Err(std_mpsc::RecvTimeoutError::Timeout) => {}
                    Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }

            // Keep the subscription alive until the thread exits.
            drop(debouncer);
        });

        Ok((
            Self {
                crash_dir: crash_dir.to_path_buf(),
                stop_tx,
                bridge_handle,
            },
            event_rx,
        ))
    }

    /// Forward creation events from a debounce result.
    fn handle_debounce_result(
        result: DebounceEventResult,
        event_tx: &mpsc::UnboundedSender<CrashEvent>,
    ) {
        match result {
            Ok(events) => {
                for event in &events {
                    if matches!(event.kind, notify::EventKind::Create(_)) {
                        for path in &event.paths {
                            let _ = event_tx.send(CrashEvent {
                                report: path.clone(),
                            });
                        }
                    }
                }
            }
            Err(errors) => {
                for error in errors {
                    tracing::warn!(error = %error, "Crash directory watch error");
                }
            }
        }
    }

    /// Get the directory being watched.
    #[must_use]
    pub fn crash_dir(&self) -> &PathBuf {
        &self.crash_dir
    }

    /// Stop the watcher and join its bridge thread.
    ///
    /// Takes effect immediately; the underlying subscription is released.
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.bridge_handle.join();
    }
}

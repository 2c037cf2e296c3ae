//! Captcha alert monitor.
//!
//! The macro mod appends a line to its alerts file whenever the server
//! presents a captcha. The monitor tails that file, snapshots the game
//! window for each new line, archives the snapshot under a timestamped
//! name, and pushes photo plus text to the alert sink.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::WatchConfig;
use crate::game::GameActions;
use crate::watcher::{LogTailer, WatcherError};

use super::sink::AlertSink;

/// Timestamp layout for archived captcha samples (Windows-safe, no colons).
const SAMPLE_STAMP_FORMAT: &str = "%d-%m-%Y %H;%M;%S";

/// Message accompanying every captcha photo.
const ALERT_TEXT: &str = "Captcha detected! The macro is paused until it is solved.";

struct MonitorSession {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Watches the macro mod's alerts file and raises captcha alerts.
pub struct CaptchaMonitor {
    actions: Arc<dyn GameActions>,
    sink: Arc<dyn AlertSink>,
    alerts_path: PathBuf,
    samples_dir: PathBuf,
    chat_id: Arc<AtomicI64>,
    poll_interval: Duration,
    session: Option<MonitorSession>,
}

impl CaptchaMonitor {
    /// Build a monitor from configuration.
    #[must_use]
    pub fn new(
        actions: Arc<dyn GameActions>,
        sink: Arc<dyn AlertSink>,
        config: &WatchConfig,
    ) -> Self {
        Self {
            actions,
            sink,
            alerts_path: config.paths.captcha_alerts.clone(),
            samples_dir: config.paths.captcha_samples_dir.clone(),
            chat_id: Arc::new(AtomicI64::new(config.captcha.default_chat_id)),
            poll_interval: config.reconnect.poll_interval(),
            session: None,
        }
    }

    /// Override the alerts file poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Redirect future alerts to a different chat. Takes effect for the
    /// next alert; a running session picks it up without a restart.
    pub fn set_alerts_chat(&self, chat_id: i64) {
        self.chat_id.store(chat_id, Ordering::SeqCst);
        tracing::info!(chat_id, "Captcha alerts redirected");
    }

    /// Whether the monitor is currently running.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.session.is_some()
    }

    /// Start monitoring the alerts file.
    ///
    /// Tailing begins at the file's current end; alerts raised before
    /// startup are not replayed. A no-op when already running.
    ///
    /// # Errors
    ///
    /// Fails when the alerts file cannot be read.
    pub async fn start(&mut self) -> Result<(), WatcherError> {
        if self.session.is_some() {
            tracing::debug!("Captcha monitor already running");
            return Ok(());
        }

        let tailer = LogTailer::from_end(&self.alerts_path).await?;
        let cancel = CancellationToken::new();
        let task = tokio::spawn(watch_alerts(
            tailer,
            self.actions.clone(),
            self.sink.clone(),
            self.samples_dir.clone(),
            self.chat_id.clone(),
            self.poll_interval,
            cancel.clone(),
        ));

        self.session = Some(MonitorSession { cancel, task });
        tracing::info!(alerts = %self.alerts_path.display(), "Captcha monitor started");
        Ok(())
    }

    /// Stop the monitor, if running, and wait for its task to exit.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.cancel.cancel();
        if let Err(e) = session.task.await {
            tracing::warn!(error = %e, "Captcha monitor task did not shut down cleanly");
        }
        tracing::info!("Captcha monitor stopped");
    }
}

/// Poll the alerts file and raise one alert per new line.
async fn watch_alerts(
    mut tailer: LogTailer,
    actions: Arc<dyn GameActions>,
    sink: Arc<dyn AlertSink>,
    samples_dir: PathBuf,
    chat_id: Arc<AtomicI64>,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(poll_interval) => {
                let lines = match tailer.read_new_lines().await {
                    Ok(lines) => lines,
                    Err(e) => {
                        tracing::warn!(error = %e, "Captcha alerts read failed");
                        continue;
                    }
                };
                for line in lines {
                    tracing::warn!(line, "Captcha alert raised");
                    let chat = chat_id.load(Ordering::SeqCst);
                    raise_alert(&actions, &sink, &samples_dir, chat).await;
                }
            }
        }
    }
}

/// Snapshot the game window and deliver it.
///
/// Each failure is logged and the remaining steps still run; a broken
/// screenshot must not swallow the text alert.
async fn raise_alert(
    actions: &Arc<dyn GameActions>,
    sink: &Arc<dyn AlertSink>,
    samples_dir: &Path,
    chat_id: i64,
) {
    if let Err(e) = tokio::fs::create_dir_all(samples_dir).await {
        tracing::warn!(error = %e, "Could not create captcha samples directory");
    }

    let stamp = chrono::Local::now().format(SAMPLE_STAMP_FORMAT);
    let sample = samples_dir.join(format!("{stamp}.bmp"));

    match actions.save_live_image(&sample).await {
        Ok(()) => {
            if let Err(e) = sink.send_photo(chat_id, &sample).await {
                tracing::error!(error = %e, "Captcha photo delivery failed");
            }
        }
        Err(e) => tracing::error!(error = %e, "Could not capture captcha sample"),
    }

    if let Err(e) = sink.send_text(chat_id, ALERT_TEXT).await {
        tracing::error!(error = %e, "Captcha message delivery failed");
    }
}

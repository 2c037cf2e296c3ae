//! Supervised watch session.
//!
//! [`Reconnector`] owns the background tasks that keep the client
//! connected: a log-tail loop feeding the retry policy and a crash-watch
//! loop that relaunches on new crash reports. Startup validates its inputs
//! up front; a missing client log or crash directory fails `keep_connected`
//! instead of spinning silently.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::WatchConfig;
use crate::game::GameActions;
use crate::watcher::{
    Classifier, ClassifierRules, CrashEvent, CrashWatcher, LogTailer, WatcherError,
};

use super::policy::{ReconnectPolicy, RecoveryDecision};

/// Handles to a running session's tasks.
struct WatchSession {
    cancel: CancellationToken,
    log_task: JoinHandle<()>,
    crash_task: JoinHandle<()>,
    crash_watcher: CrashWatcher,
}

/// Starts and stops the connection-supervision loops.
pub struct Reconnector {
    actions: Arc<dyn GameActions>,
    rules: ClassifierRules,
    client_log: PathBuf,
    crash_dir: PathBuf,
    max_tries: u32,
    poll_interval: Duration,
    session: Option<WatchSession>,
}

impl Reconnector {
    /// Build a reconnector from configuration with the default pattern
    /// table.
    #[must_use]
    pub fn new(actions: Arc<dyn GameActions>, config: &WatchConfig) -> Self {
        Self {
            actions,
            rules: ClassifierRules::default(),
            client_log: config.paths.client_log.clone(),
            crash_dir: config.paths.crash_dir.clone(),
            max_tries: config.reconnect.max_tries,
            poll_interval: config.reconnect.poll_interval(),
            session: None,
        }
    }

    /// Replace the pattern table used to classify log lines.
    #[must_use]
    pub fn with_rules(mut self, rules: ClassifierRules) -> Self {
        self.rules = rules;
        self
    }

    /// Override the log poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Whether a session is currently running.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.session.is_some()
    }

    /// Start supervising the client.
    ///
    /// Tailing begins at the log's current end so stale history never
    /// triggers recovery. Calling this while a session is already running
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Fails when the client log cannot be read or the crash directory
    /// cannot be watched.
    pub async fn keep_connected(&mut self) -> Result<(), WatcherError> {
        if self.session.is_some() {
            tracing::debug!("Watch session already running");
            return Ok(());
        }

        let tailer = LogTailer::from_end(&self.client_log).await?;
        let (crash_watcher, crash_rx) = CrashWatcher::start(&self.crash_dir)?;

        let cancel = CancellationToken::new();

        let log_task = tokio::spawn(watch_log(
            tailer,
            Classifier::with_rules(self.rules.clone()),
            ReconnectPolicy::new(self.max_tries),
            self.actions.clone(),
            self.poll_interval,
            cancel.clone(),
        ));
        let crash_task = tokio::spawn(watch_crashes(
            crash_rx,
            self.actions.clone(),
            cancel.clone(),
        ));

        self.session = Some(WatchSession {
            cancel,
            log_task,
            crash_task,
            crash_watcher,
        });
        tracing::info!(
            log = %self.client_log.display(),
            crash_dir = %self.crash_dir.display(),
            "Watch session started"
        );
        Ok(())
    }

    /// Stop the running session, if any, and wait for its tasks to exit.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        session.cancel.cancel();
        if let Err(e) = session.log_task.await {
            tracing::warn!(error = %e, "Log watch task did not shut down cleanly");
        }
        if let Err(e) = session.crash_task.await {
            tracing::warn!(error = %e, "Crash watch task did not shut down cleanly");
        }
        session.crash_watcher.stop();
        tracing::info!("Watch session stopped");
    }
}

/// Poll the client log, classify new lines, and execute policy decisions.
async fn watch_log(
    mut tailer: LogTailer,
    classifier: Classifier,
    mut policy: ReconnectPolicy,
    actions: Arc<dyn GameActions>,
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
                        tracing::warn!(error = %e, "Client log read failed");
                        continue;
                    }
                };
                for line in lines {
                    let decision = policy.observe(classifier.classify(&line));
                    execute(decision, &actions).await;
                }
            }
        }
    }
}

/// Relaunch the client whenever a crash report appears.
async fn watch_crashes(
    mut crash_rx: tokio::sync::mpsc::UnboundedReceiver<CrashEvent>,
    actions: Arc<dyn GameActions>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            event = crash_rx.recv() => {
                let Some(crash) = event else { break };
                tracing::error!(
                    report = %crash.report.display(),
                    "Crash report detected, relaunching client"
                );
                execute(RecoveryDecision::Relaunch, &actions).await;
            }
        }
    }
}

/// Run one policy decision against the game client.
///
/// Action failures are logged, never fatal: the next log event gets
/// another chance.
async fn execute(decision: RecoveryDecision, actions: &Arc<dyn GameActions>) {
    let result = match decision {
        RecoveryDecision::Ignore => return,
        RecoveryDecision::Reconnect => actions.connect().await,
        RecoveryDecision::Relaunch => actions.relaunch().await,
    };
    if let Err(e) = result {
        tracing::error!(error = %e, ?decision, "Recovery action failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ActionError;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingActions {
        connects: AtomicU32,
        relaunches: AtomicU32,
    }

    #[async_trait]
    impl GameActions for CountingActions {
        async fn connect(&self) -> Result<(), ActionError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn relaunch(&self) -> Result<(), ActionError> {
            self.relaunches.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn save_live_image(&self, _path: &Path) -> Result<(), ActionError> {
            Ok(())
        }
    }

    fn test_setup(temp_dir: &TempDir) -> (WatchConfig, Arc<CountingActions>) {
        let mut config = WatchConfig::default();
        config.paths.client_log = temp_dir.path().join("latest.log");
        config.paths.crash_dir = temp_dir.path().join("crash-reports");
        std::fs::write(&config.paths.client_log, "").unwrap();
        std::fs::create_dir(&config.paths.crash_dir).unwrap();
        (config, Arc::new(CountingActions::default()))
    }

    #[tokio::test]
    async fn test_keep_connected_fails_on_missing_log() {
        let temp_dir = TempDir::new().unwrap();
        let (mut config, actions) = test_setup(&temp_dir);
        config.paths.client_log = temp_dir.path().join("no-such.log");

        let mut reconnector = Reconnector::new(actions, &config);
        let result = reconnector.keep_connected().await;
        assert!(matches!(result, Err(WatcherError::FileMissing(_))));
        assert!(!reconnector.is_up());
    }

    #[tokio::test]
    async fn test_keep_connected_is_idempotent_while_running() {
        let temp_dir = TempDir::new().unwrap();
        let (config, actions) = test_setup(&temp_dir);

        let mut reconnector = Reconnector::new(actions, &config);
        if reconnector.keep_connected().await.is_err() {
            // Inotify watch limit reached; nothing to assert.
            return;
        }
        assert!(reconnector.is_up());

        // Second call must not tear down or duplicate the session.
        reconnector.keep_connected().await.unwrap();
        assert!(reconnector.is_up());

        reconnector.stop().await;
        assert!(!reconnector.is_up());
    }

    #[tokio::test]
    async fn test_stop_without_session_is_a_no_op() {
        let temp_dir = TempDir::new().unwrap();
        let (config, actions) = test_setup(&temp_dir);

        let mut reconnector = Reconnector::new(actions, &config);
        reconnector.stop().await;
        assert!(!reconnector.is_up());
    }

    #[tokio::test]
    async fn test_crash_event_invokes_exactly_one_relaunch() {
        let actions = Arc::new(CountingActions::default());
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(watch_crashes(rx, actions.clone(), cancel));

        tx.send(CrashEvent {
            report: std::path::PathBuf::from("crash-reports/crash-2020-05-01_12.00.00-client.txt"),
        })
        .unwrap();
        // Closing the channel ends the loop once the event is consumed.
        drop(tx);
        task.await.unwrap();

        assert_eq!(actions.relaunches.load(Ordering::SeqCst), 1);
        assert_eq!(actions.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_each_crash_event_relaunches() {
        let actions = Arc::new(CountingActions::default());
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(watch_crashes(rx, actions.clone(), cancel));

        for n in 0..3 {
            tx.send(CrashEvent {
                report: std::path::PathBuf::from(format!("crash-reports/crash-{n}.txt")),
            })
            .unwrap();
        }
        drop(tx);
        task.await.unwrap();

        assert_eq!(actions.relaunches.load(Ordering::SeqCst), 3);
        assert_eq!(actions.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disconnect_line_triggers_connect() {
        let temp_dir = TempDir::new().unwrap();
        let (config, actions) = test_setup(&temp_dir);

        let mut reconnector = Reconnector::new(actions.clone(), &config)
            .with_poll_interval(Duration::from_millis(20));
        if reconnector.keep_connected().await.is_err() {
            return;
        }

        let mut log = std::fs::OpenOptions::new()
            .append(true)
            .open(&config.paths.client_log)
            .unwrap();
        use std::io::Write;
        writeln!(log, "[12:00:01] [Client thread/INFO]: Couldn't connect to server").unwrap();
        log.sync_all().unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        reconnector.stop().await;

        assert_eq!(actions.connects.load(Ordering::SeqCst), 1);
        assert_eq!(actions.relaunches.load(Ordering::SeqCst), 0);
    }
}

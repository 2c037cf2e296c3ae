//! Process control for the game client and its launcher.

use std::path::Path;

use sysinfo::{ProcessesToUpdate, System};

/// Kill every running process whose executable name matches `name` exactly.
///
/// Returns the number of processes signalled. Matching is exact (including
/// the `.exe` suffix on Windows) so an overly broad name cannot take down
/// unrelated processes.
pub fn kill_by_name(name: &str) -> usize {
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::All, false);

    let mut killed = 0;
    for process in sys.processes().values() {
        if process.name().to_string_lossy() == name {
            tracing::info!(process = name, pid = %process.pid(), "Killing process");
            if process.kill() {
                killed += 1;
            }
        }
    }

    if killed == 0 {
        tracing::debug!(process = name, "No matching process to kill");
    }
    killed
}

/// Start an executable without tracking the child.
///
/// The launcher manages its own lifetime; the watchdog only needs it
/// started.
///
/// # Errors
///
/// Returns the spawn error when the executable cannot be started.
pub fn spawn_detached(executable: &Path) -> std::io::Result<()> {
    tokio::process::Command::new(executable).spawn()?;
    Ok(())
}

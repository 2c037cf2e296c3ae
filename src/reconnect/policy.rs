//! Bounded-retry recovery policy.
//!
//! Decides, per log event, whether to ignore it, rejoin the server, or
//! escalate to a full client relaunch. Deciding is separated from doing:
//! the policy is a pure state machine over a retry counter and the session
//! executes its decisions.

use crate::watcher::LogEvent;

/// Default number of in-place reconnects before escalating to a relaunch.
pub const MAX_RECONNECT_TRIES: u32 = 5;

/// What the session should do in response to an observed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryDecision {
    /// No action required.
    Ignore,
    /// Rejoin the server from the server-list screen.
    Reconnect,
    /// Kill and restart the whole client.
    Relaunch,
}

/// Coarse view of the policy's current position in the retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyState {
    /// No unresolved disconnects.
    Stable,
    /// Burning through the reconnect budget.
    Recovering,
    /// One more disconnect triggers a relaunch.
    Escalating,
}

/// Counts consecutive unresolved disconnects against a fixed budget.
///
/// Each disconnect consumes one try. While tries remain the decision is
/// [`RecoveryDecision::Reconnect`]; the disconnect that exhausts the
/// budget yields [`RecoveryDecision::Relaunch`] and resets the counter, so
/// the relaunched client starts with a full budget. A join confirmation
/// resets the counter at any point.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    tries: u32,
    max_tries: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(MAX_RECONNECT_TRIES)
    }
}

impl ReconnectPolicy {
    /// Create a policy with the given retry budget.
    #[must_use]
    pub fn new(max_tries: u32) -> Self {
        Self {
            tries: 0,
            max_tries: max_tries.max(1),
        }
    }

    /// Feed one observed event and get the resulting decision.
    pub fn observe(&mut self, event: LogEvent) -> RecoveryDecision {
        match event {
            LogEvent::Unrelated => RecoveryDecision::Ignore,
            LogEvent::Joined => {
                if self.tries > 0 {
                    tracing::info!(tries = self.tries, "Join confirmed, retry counter reset");
                }
                self.tries = 0;
                RecoveryDecision::Ignore
            }
            LogEvent::Disconnected => {
                self.tries += 1;
                if self.tries < self.max_tries {
                    tracing::warn!(
                        tries = self.tries,
                        max_tries = self.max_tries,
                        "Disconnect detected, reconnecting"
                    );
                    RecoveryDecision::Reconnect
                } else {
                    tracing::warn!(
                        tries = self.tries,
                        "Reconnect budget exhausted, relaunching client"
                    );
                    self.tries = 0;
                    RecoveryDecision::Relaunch
                }
            }
        }
    }

    /// Consecutive unresolved disconnects observed so far.
    #[must_use]
    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Where the policy sits in its retry budget.
    #[must_use]
    pub fn state(&self) -> PolicyState {
        if self.tries == 0 {
            PolicyState::Stable
        } else if self.tries + 1 >= self.max_tries {
            PolicyState::Escalating
        } else {
            PolicyState::Recovering
        }
    }
}

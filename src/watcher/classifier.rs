//! Log line classification.
//!
//! Maps raw log lines to semantic events via a fixed table of regular
//! expressions. The pattern table is injectable so tests can feed
//! synthetic lines without any file I/O.

use regex::Regex;

/// Semantic event derived from a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    /// The client lost its server connection.
    Disconnected,
    /// The client (re)joined the server.
    Joined,
    /// Line carries no connectivity signal.
    Unrelated,
}

/// Pattern table used to classify log lines.
///
/// Patterns are anchored at line start. The defaults match the signals
/// the macro mod and the vanilla client write on disconnect and join.
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    /// Matches lines signalling a lost connection.
    pub disconnect: Regex,
    /// Matches the join confirmation line.
    pub join: Regex,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            disconnect: Regex::new(
                r"^.*(?:Terminating .+ active macro|Couldn't connect to server|java\.io\.IOException: An existing connection was forcibly closed)",
            )
            .expect("default disconnect pattern is valid"),
            join: Regex::new(r"^.* Joined server\.").expect("default join pattern is valid"),
        }
    }
}

/// Classifies log lines into [`LogEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: ClassifierRules,
}

impl Classifier {
    /// Create a classifier with the default pattern table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with a custom pattern table.
    #[must_use]
    pub fn with_rules(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    /// Classify a single log line.
    ///
    /// Disconnect patterns are checked first; unmatched lines are
    /// [`LogEvent::Unrelated`].
    #[must_use]
    pub fn classify(&self, line: &str) -> LogEvent {
        if self.rules.disconnect.is_match(line) {
            LogEvent::Disconnected
        } else if self.rules.join.is_match(line) {
            LogEvent::Joined
        } else {
            LogEvent::Unrelated
        }
    }
}

//! Connection supervision.
//!
//! The [`ReconnectPolicy`] turns classified log events into recovery
//! decisions under a bounded retry budget; the [`Reconnector`] runs the
//! watch loops that feed it and executes what it decides.

mod policy;
mod session;

pub use policy::{PolicyState, ReconnectPolicy, RecoveryDecision, MAX_RECONNECT_TRIES};
pub use session::Reconnector;

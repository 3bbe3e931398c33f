//! Helpers for tests that need a real database, a scripted payment gateway or a notifier that records what it sent.
pub mod prepare_env;

mod gateway;
mod notifier;

pub use gateway::ScriptedGateway;
pub use notifier::RecordingNotifier;

//! Application State

use std::sync::Arc;

use agent_core::{Engine, LlmProvider};
use mail_assistant::store::ReminderStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The plan-execution engine, fully wired
    pub engine: Arc<Engine>,

    /// LLM provider, kept for health reporting
    pub provider: Arc<dyn LlmProvider>,

    /// Reminder store, exposed read-only over the API
    pub reminders: Arc<dyn ReminderStore>,

    /// Mailbox backend name, for health reporting
    pub mailbox_name: String,
}

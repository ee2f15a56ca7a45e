//! Reminder Creation Adapter

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;

use agent_core::adapter::{names, ToolAdapter, ToolInput, ToolOutcome};

use crate::model::Reminder;
use crate::store::ReminderStore;

/// Creates reminders in the reminder store
pub struct CreateReminderAdapter {
    reminders: Arc<dyn ReminderStore>,
}

impl CreateReminderAdapter {
    pub fn new(reminders: Arc<dyn ReminderStore>) -> Self {
        Self { reminders }
    }
}

#[async_trait]
impl ToolAdapter for CreateReminderAdapter {
    fn name(&self) -> &str {
        names::CREATE_REMINDER
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let Some(title) = input.str("title") else {
            return ToolOutcome::failure("missing parameter: title");
        };

        // An unreadable date still produces a reminder, just undated.
        let due_date = input
            .str("due_date")
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

        let mut reminder = Reminder::new(title, due_date);
        if let Some(record_id) = input.str("record_id") {
            reminder = reminder.with_record_id(record_id);
        }

        match self.reminders.create(reminder) {
            Ok(id) => ToolOutcome::ok().with("reminder_id", json!(id)),
            Err(e) => ToolOutcome::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryReminderStore;

    #[tokio::test]
    async fn test_create_reminder_with_due_date() {
        let store = Arc::new(MemoryReminderStore::new());
        let adapter = CreateReminderAdapter::new(store.clone());

        let outcome = adapter
            .invoke(
                ToolInput::new()
                    .with("title", json!("City Hydro due"))
                    .with("due_date", json!("2026-08-09"))
                    .with("record_id", json!("rec-1")),
            )
            .await;

        assert!(outcome.success);
        let reminders = store.list().unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(
            reminders[0].due_date,
            NaiveDate::from_ymd_opt(2026, 8, 9)
        );
        assert_eq!(reminders[0].record_id.as_deref(), Some("rec-1"));
    }

    #[tokio::test]
    async fn test_unreadable_due_date_is_kept_undated() {
        let store = Arc::new(MemoryReminderStore::new());
        let adapter = CreateReminderAdapter::new(store.clone());

        let outcome = adapter
            .invoke(
                ToolInput::new()
                    .with("title", json!("follow up"))
                    .with("due_date", json!("next friday")),
            )
            .await;

        assert!(outcome.success);
        assert_eq!(store.list().unwrap()[0].due_date, None);
    }
}

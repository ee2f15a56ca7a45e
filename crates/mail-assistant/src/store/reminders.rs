//! Reminder Store

use std::sync::RwLock;

use crate::error::Result;
use crate::model::Reminder;

/// Reminder store trait for persistence
pub trait ReminderStore: Send + Sync {
    /// Save a reminder, returning its id
    fn create(&self, reminder: Reminder) -> Result<String>;

    /// All reminders, soonest due first (undated last)
    fn list(&self) -> Result<Vec<Reminder>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory reminder store
pub struct MemoryReminderStore {
    reminders: RwLock<Vec<Reminder>>,
}

impl Default for MemoryReminderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryReminderStore {
    pub fn new() -> Self {
        Self {
            reminders: RwLock::new(Vec::new()),
        }
    }
}

impl ReminderStore for MemoryReminderStore {
    fn create(&self, reminder: Reminder) -> Result<String> {
        let id = reminder.id.clone();
        self.reminders.write().unwrap().push(reminder);
        Ok(id)
    }

    fn list(&self) -> Result<Vec<Reminder>> {
        let mut reminders = self.reminders.read().unwrap().clone();
        reminders.sort_by_key(|r| (r.due_date.is_none(), r.due_date));
        Ok(reminders)
    }

    fn len(&self) -> usize {
        self.reminders.read().unwrap().len()
    }
}

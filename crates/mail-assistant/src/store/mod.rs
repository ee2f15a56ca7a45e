//! Local Stores
//!
//! Persistence for what the assistant learns from a mailbox: a vector
//! store for raw document text, a record store for extracted structured
//! records, and a reminder store. All are small, file- or memory-backed,
//! and safe to share behind `Arc`.

mod records;
mod reminders;
mod vector;

pub use records::{FileRecordStore, MemoryRecordStore, RecordFilter, RecordStore};
pub use reminders::{MemoryReminderStore, ReminderStore};
pub use vector::{ScoredChunk, VectorStore};

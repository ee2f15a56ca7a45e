//! # mail-assistant
//!
//! Domain toolkit for a personal mail assistant: mailbox clients, document
//! text extraction, structured record models (bills, promotions, orders),
//! local stores, web search, and the tool adapters that expose all of it
//! to the plan-execution engine.
//!
//! ## Layout
//!
//! - [`mailbox`] - Gmail REST client and a mock backend, behind one trait
//! - [`model`] - mail messages, category-shaped records, store rows
//! - [`store`] - vector store, record store, reminder store
//! - [`toolkit`] - the adapters the engine invokes by name
//!
//! Everything the engine sees goes through the adapter contract; nothing
//! in this crate reaches into the engine's state directly.

pub mod error;
pub mod mailbox;
pub mod model;
pub mod store;
pub mod toolkit;

pub use error::{AssistantError, Result};
pub use mailbox::{GmailClient, GmailConfig, MailQuery, MailboxClient, MockMailboxClient};
pub use model::{
    BillRecord, EmailAttachment, EmailMessage, GeneralRecord, OrderRecord, PromotionRecord,
    RecordRow, Reminder,
};
pub use store::{
    FileRecordStore, MemoryRecordStore, MemoryReminderStore, RecordFilter, RecordStore,
    ReminderStore, VectorStore,
};

//! Mailbox Integration
//!
//! Abstractions and implementations for mail backends.

mod gmail;
mod mock;

pub use gmail::{GmailClient, GmailConfig};
pub use mock::MockMailboxClient;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::model::EmailMessage;

/// A mailbox search request
#[derive(Clone, Debug)]
pub struct MailQuery {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// Restrict to messages carrying attachments
    pub require_attachments: bool,
    /// Extra backend-syntax clause, parenthesized into the query
    pub extra_clause: Option<String>,
    pub max_results: u32,
}

impl MailQuery {
    /// Render to Gmail search syntax: `after:<date> before:<date>`, plus
    /// `has:attachment` and the optional custom clause.
    pub fn to_query_string(&self) -> String {
        let mut query = format!(
            "after:{} before:{}",
            self.date_from.format("%Y-%m-%d"),
            self.date_to.format("%Y-%m-%d")
        );
        if self.require_attachments {
            query.push_str(" has:attachment");
        }
        if let Some(clause) = &self.extra_clause {
            if !clause.trim().is_empty() {
                query.push_str(&format!(" ({})", clause.trim()));
            }
        }
        query
    }
}

/// Mailbox client trait (Strategy pattern)
///
/// Implement this for each backend: Gmail, IMAP, a local maildir, etc.
#[async_trait]
pub trait MailboxClient: Send + Sync {
    /// Search for message ids matching the query
    async fn search(&self, query: &MailQuery) -> Result<Vec<String>>;

    /// Fetch one full message
    async fn fetch(&self, message_id: &str) -> Result<EmailMessage>;

    /// Fetch raw attachment bytes
    async fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Backend name
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> MailQuery {
        MailQuery {
            date_from: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            require_attachments: true,
            extra_clause: None,
            max_results: 50,
        }
    }

    #[test]
    fn test_query_string_with_attachments() {
        assert_eq!(
            query().to_query_string(),
            "after:2026-07-01 before:2026-08-01 has:attachment"
        );
    }

    #[test]
    fn test_query_string_with_custom_clause() {
        let mut q = query();
        q.require_attachments = false;
        q.extra_clause = Some("invoice OR bill".into());
        assert_eq!(
            q.to_query_string(),
            "after:2026-07-01 before:2026-08-01 (invoice OR bill)"
        );
    }
}

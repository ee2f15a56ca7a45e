//! Mock Mailbox Client
//!
//! For testing and demo purposes. Serves a small fixed inbox so the whole
//! pipeline can run without Gmail credentials.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{MailQuery, MailboxClient};
use crate::error::{AssistantError, Result};
use crate::model::{EmailAttachment, EmailMessage};

const HYDRO_INVOICE: &str = "CITY HYDRO\nInvoice #HY-20260719\n\n\
Account: 4417-220\nBilling period: 2026-06-15 to 2026-07-15\n\
Amount due: $84.20\nDue date: 2026-08-09\n\n\
Electricity usage: 312 kWh\nDelivery charge: $21.10\n";

const GYM_PROMO_BODY: &str = "Summer deal! Get 40% off your first three months \
with code SUN40. Offer expires 2026-08-31.";

const ORDER_BODY: &str = "Thanks for your order #88-2041 placed on 2026-07-28. \
Total: $56.90. Items: trail socks x2, water bottle. Estimated delivery: 2026-08-06.";

/// Mock mailbox with a fixed set of messages
pub struct MockMailboxClient {
    messages: Vec<EmailMessage>,
    attachments: HashMap<(String, String), Vec<u8>>,
}

impl Default for MockMailboxClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMailboxClient {
    pub fn new() -> Self {
        let messages = vec![
            EmailMessage {
                id: "msg-hydro".into(),
                subject: "Your City Hydro bill is ready".into(),
                sender: "City Hydro <billing@cityhydro.example>".into(),
                date: "Sun, 19 Jul 2026 08:12:00 +0000".into(),
                body: "Your latest bill is attached. Amount due: $84.20 by 2026-08-09.".into(),
                attachments: vec![EmailAttachment {
                    id: "att-hydro-1".into(),
                    filename: "hydro_invoice.txt".into(),
                    mime_type: "text/plain".into(),
                }],
            },
            EmailMessage {
                id: "msg-gym".into(),
                subject: "40% off at FlexFit".into(),
                sender: "FlexFit <offers@flexfit.example>".into(),
                date: "Tue, 21 Jul 2026 17:40:00 +0000".into(),
                body: GYM_PROMO_BODY.into(),
                attachments: Vec::new(),
            },
            EmailMessage {
                id: "msg-order".into(),
                subject: "Order confirmation #88-2041".into(),
                sender: "Trailhead Outfitters <orders@trailhead.example>".into(),
                date: "Tue, 28 Jul 2026 11:03:00 +0000".into(),
                body: ORDER_BODY.into(),
                attachments: Vec::new(),
            },
        ];

        let mut attachments = HashMap::new();
        attachments.insert(
            ("msg-hydro".to_string(), "att-hydro-1".to_string()),
            HYDRO_INVOICE.as_bytes().to_vec(),
        );

        Self {
            messages,
            attachments,
        }
    }
}

#[async_trait]
impl MailboxClient for MockMailboxClient {
    async fn search(&self, query: &MailQuery) -> Result<Vec<String>> {
        let ids = self
            .messages
            .iter()
            .filter(|m| !query.require_attachments || !m.attachments.is_empty())
            .take(query.max_results as usize)
            .map(|m| m.id.clone())
            .collect();
        Ok(ids)
    }

    async fn fetch(&self, message_id: &str) -> Result<EmailMessage> {
        self.messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .ok_or_else(|| AssistantError::Mailbox(format!("no such message: {}", message_id)))
    }

    async fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>> {
        self.attachments
            .get(&(message_id.to_string(), attachment_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                AssistantError::AttachmentUnavailable(format!(
                    "{}/{}",
                    message_id, attachment_id
                ))
            })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "MockMailbox"
    }
}

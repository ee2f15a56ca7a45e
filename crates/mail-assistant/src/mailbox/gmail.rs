//! Gmail REST Client
//!
//! Read-only access to a Gmail mailbox over the REST API. The OAuth dance
//! happens elsewhere; this client only needs a ready access token. Message
//! bodies arrive as a MIME part tree: the walk prefers text/plain, falls
//! back to text/html converted with html2text, and recurses into nested
//! multiparts.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::Deserialize;

use super::{MailQuery, MailboxClient};
use crate::error::{AssistantError, Result};
use crate::model::{EmailAttachment, EmailMessage};

/// Attachment extensions worth downloading for parsing or archiving
const ATTACHMENT_EXTENSIONS: [&str; 9] = [
    ".pdf", ".png", ".jpg", ".jpeg", ".doc", ".docx", ".txt", ".csv", ".html",
];

/// Gmail client configuration
#[derive(Clone, Debug)]
pub struct GmailConfig {
    /// OAuth2 access token with gmail.readonly scope
    pub access_token: String,

    /// API base URL (no trailing slash)
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: "https://gmail.googleapis.com/gmail/v1".into(),
            timeout_secs: 30,
        }
    }
}

impl GmailConfig {
    pub fn from_env() -> Result<Self> {
        let access_token = std::env::var("GMAIL_ACCESS_TOKEN")
            .map_err(|_| AssistantError::Config("GMAIL_ACCESS_TOKEN is not set".into()))?;
        let base_url = std::env::var("GMAIL_BASE_URL")
            .unwrap_or_else(|_| "https://gmail.googleapis.com/gmail/v1".into());

        Ok(Self {
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Default::default()
        })
    }
}

// ---- wire types ------------------------------------------------------------

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Deserialize)]
struct WireMessage {
    id: String,
    payload: Option<WirePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    headers: Vec<WireHeader>,
    body: Option<WireBody>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Deserialize)]
struct WireHeader {
    name: String,
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBody {
    data: Option<String>,
    attachment_id: Option<String>,
}

#[derive(Deserialize)]
struct WireAttachment {
    data: Option<String>,
}

// ---- client ----------------------------------------------------------------

/// Gmail mailbox client
pub struct GmailClient {
    client: reqwest::Client,
    config: GmailConfig,
}

impl GmailClient {
    pub fn from_config(config: GmailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(GmailConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/users/me/{}", self.config.base_url, path)
    }

    fn decode_base64url(data: &str) -> Option<Vec<u8>> {
        URL_SAFE
            .decode(data)
            .or_else(|_| URL_SAFE_NO_PAD.decode(data))
            .ok()
    }

    fn header<'a>(part: &'a WirePart, name: &str) -> Option<&'a str> {
        part.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Walk the MIME tree for a readable body: text/plain first, then
    /// text/html through html2text, then nested multiparts.
    fn extract_body(part: &WirePart) -> String {
        if !part.parts.is_empty() {
            let mut html_body = String::new();
            for child in &part.parts {
                if child.mime_type == "text/plain" {
                    if let Some(text) = Self::decode_text(child) {
                        return text;
                    }
                } else if child.mime_type == "text/html" && html_body.is_empty() {
                    if let Some(html) = Self::decode_text(child) {
                        html_body = html2text::from_read(html.as_bytes(), 100)
                            .unwrap_or_default();
                    }
                } else if !child.parts.is_empty() {
                    let nested = Self::extract_body(child);
                    if !nested.is_empty() {
                        return nested;
                    }
                }
            }
            return html_body;
        }
        Self::decode_text(part).unwrap_or_default()
    }

    fn decode_text(part: &WirePart) -> Option<String> {
        let data = part.body.as_ref()?.data.as_deref()?;
        let bytes = Self::decode_base64url(data)?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn collect_attachments(part: &WirePart, out: &mut Vec<EmailAttachment>) {
        if !part.filename.is_empty() {
            let lower = part.filename.to_lowercase();
            let keep = ATTACHMENT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext));
            if keep {
                if let Some(id) = part.body.as_ref().and_then(|b| b.attachment_id.clone()) {
                    out.push(EmailAttachment {
                        id,
                        filename: part.filename.clone(),
                        mime_type: part.mime_type.clone(),
                    });
                }
            }
        }
        for child in &part.parts {
            Self::collect_attachments(child, out);
        }
    }
}

#[async_trait]
impl MailboxClient for GmailClient {
    async fn search(&self, query: &MailQuery) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url("messages"))
            .bearer_auth(&self.config.access_token)
            .query(&[
                ("q", query.to_query_string()),
                ("maxResults", query.max_results.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Mailbox(format!("search HTTP {}", status)));
        }

        let list: ListResponse = response.json().await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn fetch(&self, message_id: &str) -> Result<EmailMessage> {
        let response = self
            .client
            .get(self.url(&format!("messages/{}", message_id)))
            .bearer_auth(&self.config.access_token)
            .query(&[("format", "full")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Mailbox(format!(
                "fetch {} HTTP {}",
                message_id, status
            )));
        }

        let wire: WireMessage = response.json().await?;
        let payload = wire.payload.ok_or_else(|| {
            AssistantError::Mailbox(format!("message {} has no payload", message_id))
        })?;

        let mut attachments = Vec::new();
        Self::collect_attachments(&payload, &mut attachments);

        Ok(EmailMessage {
            id: wire.id,
            subject: Self::header(&payload, "Subject").unwrap_or("No_Subject").to_string(),
            sender: Self::header(&payload, "From").unwrap_or("Unknown").to_string(),
            date: Self::header(&payload, "Date").unwrap_or_default().to_string(),
            body: Self::extract_body(&payload),
            attachments,
        })
    }

    async fn fetch_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url(&format!(
                "messages/{}/attachments/{}",
                message_id, attachment_id
            )))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::AttachmentUnavailable(format!(
                "{} HTTP {}",
                attachment_id, status
            )));
        }

        let wire: WireAttachment = response.json().await?;
        wire.data
            .as_deref()
            .and_then(Self::decode_base64url)
            .ok_or_else(|| {
                AssistantError::AttachmentUnavailable(format!(
                    "{} returned no decodable data",
                    attachment_id
                ))
            })
    }

    async fn health_check(&self) -> bool {
        let response = self
            .client
            .get(self.url("profile"))
            .bearer_auth(&self.config.access_token)
            .send()
            .await;
        matches!(response, Ok(resp) if resp.status().is_success())
    }

    fn name(&self) -> &str {
        "Gmail"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64url_decoding_tolerates_padding() {
        let padded = URL_SAFE.encode(b"invoice body");
        let unpadded = URL_SAFE_NO_PAD.encode(b"invoice body");
        assert_eq!(
            GmailClient::decode_base64url(&padded).unwrap(),
            b"invoice body"
        );
        assert_eq!(
            GmailClient::decode_base64url(&unpadded).unwrap(),
            b"invoice body"
        );
    }

    #[test]
    fn test_body_walk_prefers_plain_text() {
        let part = WirePart {
            mime_type: "multipart/alternative".into(),
            filename: String::new(),
            headers: Vec::new(),
            body: None,
            parts: vec![
                WirePart {
                    mime_type: "text/html".into(),
                    filename: String::new(),
                    headers: Vec::new(),
                    body: Some(WireBody {
                        data: Some(URL_SAFE.encode(b"<p>html version</p>")),
                        attachment_id: None,
                    }),
                    parts: Vec::new(),
                },
                WirePart {
                    mime_type: "text/plain".into(),
                    filename: String::new(),
                    headers: Vec::new(),
                    body: Some(WireBody {
                        data: Some(URL_SAFE.encode(b"plain version")),
                        attachment_id: None,
                    }),
                    parts: Vec::new(),
                },
            ],
        };
        assert_eq!(GmailClient::extract_body(&part), "plain version");
    }

    #[test]
    fn test_attachment_filter_by_extension() {
        let part = WirePart {
            mime_type: "multipart/mixed".into(),
            filename: String::new(),
            headers: Vec::new(),
            body: None,
            parts: vec![
                WirePart {
                    mime_type: "application/pdf".into(),
                    filename: "invoice.pdf".into(),
                    headers: Vec::new(),
                    body: Some(WireBody {
                        data: None,
                        attachment_id: Some("att-1".into()),
                    }),
                    parts: Vec::new(),
                },
                WirePart {
                    mime_type: "application/x-msdownload".into(),
                    filename: "setup.exe".into(),
                    headers: Vec::new(),
                    body: Some(WireBody {
                        data: None,
                        attachment_id: Some("att-2".into()),
                    }),
                    parts: Vec::new(),
                },
            ],
        };
        let mut attachments = Vec::new();
        GmailClient::collect_attachments(&part, &mut attachments);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename, "invoice.pdf");
    }
}

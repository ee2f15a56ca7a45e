//! Domain Models
//!
//! Mail messages as fetched from a mailbox backend, the category-shaped
//! records the extraction adapter validates LLM output against, and the
//! rows the stores persist.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use agent_core::RecordCategory;

/// An attachment as described by the mailbox backend (bytes fetched lazily)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailAttachment {
    /// Backend attachment identifier
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub mime_type: String,
}

/// A full mail message as fetched from the mailbox
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub date: String,
    /// Plain-text body (HTML already converted)
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<EmailAttachment>,
}

/// Deserialize a money amount from a JSON number, a bare string, or a
/// `$`-prefixed string. Anything unreadable becomes `None` rather than a
/// hard failure, because model output is involved.
fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().and_then(Decimal::from_f64_retain),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').replace(',', "").parse().ok(),
        _ => None,
    })
}

/// Structured data for bills and invoices
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BillRecord {
    #[serde(default)]
    pub vendor: Option<String>,
    /// Total amount due
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Due date in YYYY-MM-DD format
    #[serde(default)]
    pub due_date: Option<String>,
    /// Invoice date in YYYY-MM-DD format
    #[serde(default)]
    pub bill_date: Option<String>,
    /// Category (utility, subscription, etc.)
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    /// Summary of main line items
    #[serde(default)]
    pub line_items: Vec<String>,
}

fn default_currency() -> String {
    "USD".into()
}

/// Structured data for marketing mail and offers
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PromotionRecord {
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub promo_code: Option<String>,
    /// Description of the discount (e.g., "50% off")
    #[serde(default)]
    pub discount_details: String,
    /// Expiration date YYYY-MM-DD
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub product_category: Option<String>,
}

/// Structured data for order confirmations
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub order_number: Option<String>,
    /// Date of purchase YYYY-MM-DD
    #[serde(default)]
    pub order_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub delivery_status: Option<String>,
}

/// Fallback shape for anything else
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GeneralRecord {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_dates: Vec<String>,
    /// Names of companies or people
    #[serde(default)]
    pub entities: Vec<String>,
}

/// Validate raw extraction output against the category's shape and return
/// the normalized field map.
pub fn validate_record(
    category: RecordCategory,
    raw: Value,
) -> crate::error::Result<Map<String, Value>> {
    let normalized = match category {
        RecordCategory::Bills => serde_json::to_value(serde_json::from_value::<BillRecord>(raw)?)?,
        RecordCategory::Promotions => {
            serde_json::to_value(serde_json::from_value::<PromotionRecord>(raw)?)?
        }
        RecordCategory::Orders => {
            serde_json::to_value(serde_json::from_value::<OrderRecord>(raw)?)?
        }
        RecordCategory::General => {
            serde_json::to_value(serde_json::from_value::<GeneralRecord>(raw)?)?
        }
    };
    match normalized {
        Value::Object(map) => Ok(map),
        other => Err(crate::error::AssistantError::Store(format!(
            "record did not normalize to an object: {}",
            other
        ))),
    }
}

/// A persisted record row
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: String,
    pub category: RecordCategory,
    pub fields: Map<String, Value>,
    pub source: String,
    pub saved_at: DateTime<Utc>,
}

impl RecordRow {
    pub fn new(category: RecordCategory, fields: Map<String, Value>, source: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category,
            fields,
            source,
            saved_at: Utc::now(),
        }
    }

    /// Due date parsed from the fields, when present and well-formed
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.fields
            .get("due_date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    /// Flattened text of all fields, for keyword matching
    pub fn haystack(&self) -> String {
        let mut text = String::new();
        for value in self.fields.values() {
            match value {
                Value::String(s) => {
                    text.push_str(s);
                    text.push(' ');
                }
                Value::Array(items) => {
                    for item in items.iter().filter_map(Value::as_str) {
                        text.push_str(item);
                        text.push(' ');
                    }
                }
                other => {
                    text.push_str(&other.to_string());
                    text.push(' ');
                }
            }
        }
        text.push_str(&self.source);
        text.to_lowercase()
    }
}

/// A reminder created for a due-dated record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub record_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn new(title: impl Into<String>, due_date: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            due_date,
            record_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_bill_amount_from_number_and_string() {
        let from_number: BillRecord =
            serde_json::from_value(json!({"vendor": "Hydro", "amount": 84.20})).unwrap();
        assert_eq!(from_number.amount, Decimal::from_f64_retain(84.20));

        let from_string: BillRecord =
            serde_json::from_value(json!({"vendor": "Hydro", "amount": "$1,284.50"})).unwrap();
        assert_eq!(from_string.amount, Some(dec!(1284.50)));

        let missing: BillRecord = serde_json::from_value(json!({"vendor": "Hydro"})).unwrap();
        assert_eq!(missing.amount, None);
        assert_eq!(missing.currency, "USD");
    }

    #[test]
    fn test_validate_record_normalizes_shape() {
        let fields = validate_record(
            RecordCategory::Bills,
            json!({"vendor": "Telco", "amount": "42.00", "due_date": "2026-09-01"}),
        )
        .unwrap();
        assert_eq!(fields.get("vendor"), Some(&json!("Telco")));
        assert!(fields.contains_key("currency"));
    }

    #[test]
    fn test_record_row_due_date() {
        let mut fields = Map::new();
        fields.insert("vendor".into(), json!("Telco"));
        fields.insert("due_date".into(), json!("2026-09-01"));
        let row = RecordRow::new(RecordCategory::Bills, fields, "test".into());
        assert_eq!(
            row.due_date(),
            NaiveDate::from_ymd_opt(2026, 9, 1)
        );
        assert!(row.haystack().contains("telco"));
    }

    #[test]
    fn test_garbage_amount_becomes_none() {
        let bill: BillRecord =
            serde_json::from_value(json!({"vendor": "X", "amount": "soon"})).unwrap();
        assert_eq!(bill.amount, None);
    }
}

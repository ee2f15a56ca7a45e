//! Structured Extraction Adapter
//!
//! Prompts the LLM for category-shaped JSON and validates the answer
//! against the matching record model before handing it back, so malformed
//! model output surfaces here instead of deep inside a store.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_core::{
    adapter::{names, ToolAdapter, ToolInput, ToolOutcome},
    provider::{GenerationOptions, LlmProvider},
    Message, RecordCategory,
};

use crate::model::validate_record;

use super::extract_json;

fn schema_instructions(category: RecordCategory) -> &'static str {
    match category {
        RecordCategory::Bills => {
            "{\"vendor\": \"company name\", \"amount\": 0.0, \"currency\": \"USD\", \
             \"due_date\": \"YYYY-MM-DD\", \"bill_date\": \"YYYY-MM-DD\", \
             \"category\": \"utility|subscription|...\", \"invoice_number\": \"...\", \
             \"line_items\": [\"...\"]}"
        }
        RecordCategory::Promotions => {
            "{\"vendor\": \"company offering the promotion\", \"promo_code\": \"...\", \
             \"discount_details\": \"e.g. 50% off\", \"expiration_date\": \"YYYY-MM-DD\", \
             \"product_category\": \"...\"}"
        }
        RecordCategory::Orders => {
            "{\"vendor\": \"store name\", \"order_number\": \"...\", \
             \"order_date\": \"YYYY-MM-DD\", \"total_amount\": 0.0, \
             \"items\": [\"...\"], \"delivery_status\": \"...\"}"
        }
        RecordCategory::General => {
            "{\"summary\": \"brief summary\", \"key_dates\": [\"YYYY-MM-DD\"], \
             \"entities\": [\"companies or people\"]}"
        }
    }
}

/// LLM-backed structured data extraction
pub struct ExtractRecordsAdapter {
    llm: Arc<dyn LlmProvider>,
    options: GenerationOptions,
}

impl ExtractRecordsAdapter {
    pub fn new(llm: Arc<dyn LlmProvider>, options: GenerationOptions) -> Self {
        Self { llm, options }
    }
}

#[async_trait]
impl ToolAdapter for ExtractRecordsAdapter {
    fn name(&self) -> &str {
        names::EXTRACT_RECORDS
    }

    async fn invoke(&self, input: ToolInput) -> ToolOutcome {
        let Some(text) = input.str("text") else {
            return ToolOutcome::failure("missing parameter: text");
        };
        let category = input.field::<RecordCategory>("category").unwrap_or_default();

        let system = format!(
            "Extract {} data from the text. Respond with JSON only, in this shape:\n{}\n\
             Use null for anything the text does not state.",
            category,
            schema_instructions(category)
        );
        let messages = [
            Message::system(system),
            Message::user(format!("Text:\n{}\n\nProvide data:", text)),
        ];

        let completion = match self.llm.complete(&messages, &self.options).await {
            Ok(completion) => completion,
            Err(e) => return ToolOutcome::failure(e.to_string()),
        };

        let Some(raw) = extract_json(&completion.content) else {
            return ToolOutcome::failure("could not parse extraction output");
        };

        match validate_record(category, raw) {
            Ok(fields) => ToolOutcome::ok()
                .with("record", Value::Object(fields))
                .with("category", json!(category)),
            Err(e) => ToolOutcome::failure(format!("extraction did not validate: {}", e)),
        }
    }
}

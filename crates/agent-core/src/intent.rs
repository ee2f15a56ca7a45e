//! Intent Taxonomy
//!
//! Closed enumeration of the request kinds the planner knows how to handle.
//! The classifier runs first and may emit labels outside this set; those are
//! preserved in [`Intent::Other`] and fall to the planner's fallback row,
//! while a failed classification degrades to [`Intent::Unknown`] and is
//! routed straight to the error terminal.

use serde::{Deserialize, Serialize};

use crate::state::{Entities, RecordCategory};

/// User intent, as resolved by the classification step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Fetch new mail and extract bill records
    ScanBills,
    /// Fetch new mail of any category
    ScanMailbox,
    /// Search records the assistant has already stored
    QueryHistory,
    /// Summarize spending from stored bill records
    AnalyzeSpending,
    /// Create reminders for upcoming due dates
    SetReminder,
    /// Look for cheaper alternatives to a stored bill
    FindAlternatives,
    /// Extract and store a record the user typed in directly
    ManualAdd,
    /// Classification failed or produced nothing usable
    Unknown,
    /// A classifier label outside the closed set
    #[serde(untagged)]
    Other(String),
}

impl Intent {
    /// Parse a classifier label, tolerating the synonyms older prompt
    /// revisions produced. Labels outside the closed set are preserved.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "scan_bills" => Intent::ScanBills,
            "scan_emails" | "scan_mailbox" | "scan_inbox" => Intent::ScanMailbox,
            "query_history" | "search_history" => Intent::QueryHistory,
            "analyze_spending" => Intent::AnalyzeSpending,
            "set_reminder" | "create_reminder" => Intent::SetReminder,
            "find_alternatives" => Intent::FindAlternatives,
            "manual_add" | "add_manual" => Intent::ManualAdd,
            "unknown" | "" => Intent::Unknown,
            other => Intent::Other(other.to_string()),
        }
    }

    /// Collapse a generic mailbox scan into the bill-specific intent when
    /// the classifier tagged the scan category as bills.
    pub fn refined(self, entities: &Entities) -> Self {
        match (&self, entities.category) {
            (Intent::ScanMailbox, Some(RecordCategory::Bills)) => Intent::ScanBills,
            _ => self,
        }
    }

    /// Whether this request could not be classified
    pub fn is_unknown(&self) -> bool {
        matches!(self, Intent::Unknown)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::ScanBills => write!(f, "scan_bills"),
            Intent::ScanMailbox => write!(f, "scan_mailbox"),
            Intent::QueryHistory => write!(f, "query_history"),
            Intent::AnalyzeSpending => write!(f, "analyze_spending"),
            Intent::SetReminder => write!(f, "set_reminder"),
            Intent::FindAlternatives => write!(f, "find_alternatives"),
            Intent::ManualAdd => write!(f, "manual_add"),
            Intent::Unknown => write!(f, "unknown"),
            Intent::Other(label) => write!(f, "{}", label),
        }
    }
}

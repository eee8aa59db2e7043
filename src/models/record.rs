// src/models/record.rs

//! Review record and page data structures.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::language::LanguageTag;

/// Sentinel for an absolute date no extraction tier could resolve.
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Opaque provider-issued pagination cursor.
///
/// `None` in the cursor manager denotes the first page; a token is never
/// mutated, only replaced by its successor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Undecoded response for one page.
///
/// Owned by the transport, consumed immediately by the parser.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Response body as received (anti-JSON prefix still attached)
    pub body: String,

    /// HTTP status of the final (successful) attempt
    pub status: u16,

    /// Latency of the final attempt
    pub latency: Duration,

    /// 1-based page number within the run
    pub page_number: usize,
}

/// One decoded review.
///
/// Immutable after parsing, except that classification may attach
/// `language` and translation may attach `translated_text`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Provider-side review identifier; unique within a run
    pub id: String,

    /// Reviewer display name
    pub author_name: String,

    /// Reviewer profile URL (empty if unavailable)
    pub author_url: String,

    /// Star rating, 1-5 (0 if unavailable)
    pub rating: u8,

    /// Absolute review date in RFC 3339, or [`UNKNOWN_DATE`]
    pub date: String,

    /// Resolved timestamp backing `date`, when any tier produced one
    pub timestamp: Option<DateTime<Utc>>,

    /// Provider's human-relative date text, e.g. "2 weeks ago"
    pub relative_date: String,

    /// Review body text
    pub text: String,

    /// Like / helpful count
    pub likes: u32,

    /// Owner response text (empty if none)
    pub owner_response: String,

    /// Detected language of `text`
    #[serde(default)]
    pub language: Option<LanguageTag>,

    /// Translation of `text`, when a translator is attached
    #[serde(default)]
    pub translated_text: Option<String>,

    /// 1-based page this record was decoded from
    pub source_page: usize,
}

impl Record {
    /// Whether any tier resolved an absolute date for this record.
    pub fn has_known_date(&self) -> bool {
        self.date != UNKNOWN_DATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_token_equality() {
        let a = PageToken::new("CAESBkVnSUlDZw==");
        let b = PageToken::new("CAESBkVnSUlDZw==");
        let c = PageToken::new("CAESBkVnSUlEQQ==");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_unknown_date_sentinel() {
        let record = Record {
            id: "r1".into(),
            author_name: "A".into(),
            author_url: String::new(),
            rating: 5,
            date: UNKNOWN_DATE.into(),
            timestamp: None,
            relative_date: "2 weeks ago".into(),
            text: String::new(),
            likes: 0,
            owner_response: String::new(),
            language: None,
            translated_text: None,
            source_page: 1,
        };
        assert!(!record.has_known_date());
    }
}

// src/pipeline/parse.rs

//! Tiered parsing of the provider's positional payload.
//!
//! The RPC response is a deeply nested, sparse array structure with no
//! field names; its shape varies by locale and provider revision. Every
//! field is extracted through an ordered list of strategies, and a failed
//! field degrades to a sentinel value instead of discarding the record.
//! A record is dropped only when no tier resolves its identity.
//!
//! Positions observed from the provider's own client (may shift without
//! notice, which is exactly why the tiers exist):
//!
//! ```text
//! root[1]              continuation token ("" or absent on the last page)
//! root[2]              review entries
//! root[3]              total review count hint
//! entry[0][0]          review id
//! entry[0][1][2]       absolute date, epoch microseconds
//! entry[0][1][6]       human-relative date text
//! entry[0][1][4][5]    author [name, profile url]
//! entry[0][2][0][0]    star rating
//! entry[0][2][6]       fallback date triple [year, month, day]
//! entry[0][2][15][0][0] review text
//! entry[0][3][14][0][0] owner response
//! entry[0][4][1]       like count
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::error::ParseError;
use crate::models::{PageToken, RawPage, Record, UNKNOWN_DATE};
use crate::utils::dates;

/// Anti-JSON hijacking prefix the provider prepends to every payload.
const PAYLOAD_PREFIX: &str = ")]}'";

/// Decoded content of one page.
#[derive(Debug, Default)]
pub struct ParsedPage {
    /// Records in provider order
    pub records: Vec<Record>,

    /// Continuation token for the next page, absent on the last page
    pub next_token: Option<PageToken>,

    /// Provider's total review count, when the payload carries one
    pub total_hint: Option<u64>,

    /// Entries dropped for unresolvable identity
    pub discarded: usize,
}

/// Decode one raw page into typed records.
///
/// Fails only when the payload body is not the provider envelope at all;
/// individual entry failures degrade per field.
pub fn parse_page(page: &RawPage, now: DateTime<Utc>) -> Result<ParsedPage, ParseError> {
    let body = page
        .body
        .strip_prefix(PAYLOAD_PREFIX)
        .unwrap_or(&page.body)
        .trim_start();
    let root: Value =
        serde_json::from_str(body).map_err(|e| ParseError::MalformedPayload(e.to_string()))?;

    let next_token = root
        .get(1)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(PageToken::new);
    let total_hint = root.get(3).and_then(Value::as_u64);

    let mut parsed = ParsedPage {
        next_token,
        total_hint,
        ..ParsedPage::default()
    };

    let Some(entries) = root.get(2).and_then(Value::as_array) else {
        return Ok(parsed);
    };

    for entry in entries {
        match parse_entry(entry, page.page_number, now) {
            Ok(record) => parsed.records.push(record),
            Err(error) => {
                parsed.discarded += 1;
                log::debug!("entry discarded: {error}");
            }
        }
    }

    Ok(parsed)
}

/// Decode one review entry; fails only when identity is unresolvable.
fn parse_entry(
    entry: &Value,
    page_number: usize,
    now: DateTime<Utc>,
) -> Result<Record, ParseError> {
    // Identity tiers: nested core, then the flat payload revision.
    let id = pluck_str(entry, &[0, 0])
        .or_else(|| pluck_str(entry, &[0]))
        .ok_or(ParseError::UnresolvableIdentity { page: page_number })?
        .to_string();

    let relative_date = pluck_str(entry, &[0, 1, 6])
        .map(str::to_string)
        .or_else(|| find_relative_string(entry.get(0)?.get(1)?, 3).map(str::to_string))
        .unwrap_or_default();

    let timestamp = resolve_date(entry, &relative_date, now);
    let date = timestamp
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    Ok(Record {
        id,
        author_name: pluck_str(entry, &[0, 1, 4, 5, 0]).unwrap_or_default().to_string(),
        author_url: pluck_str(entry, &[0, 1, 4, 5, 1]).unwrap_or_default().to_string(),
        rating: pluck_u64(entry, &[0, 2, 0, 0]).map(|r| r.min(5) as u8).unwrap_or(0),
        date,
        timestamp,
        relative_date,
        text: extract_text(entry),
        likes: pluck_u64(entry, &[0, 4, 1]).unwrap_or(0) as u32,
        owner_response: pluck_str(entry, &[0, 3, 14, 0, 0]).unwrap_or_default().to_string(),
        language: None,
        translated_text: None,
        source_page: page_number,
    })
}

/// Date tiers, in order: primary epoch path, container search near the
/// author blob, fixed fallback triple, relative-date heuristic.
fn resolve_date(entry: &Value, relative_date: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(epoch) = pluck_i64(entry, &[0, 1, 2]) {
        if let Some(date) = dates::from_epoch(epoch) {
            return Some(date);
        }
    }

    if let Some(container) = pluck(entry, &[0, 1]) {
        if let Some(date) = find_date_triple(container, 3) {
            return Some(date);
        }
    }

    if let Some(triple) = pluck(entry, &[0, 2, 6]) {
        if let Some(date) = date_from_triple(triple) {
            return Some(date);
        }
    }

    dates::resolve_relative(relative_date, now)
}

/// Review text tiers: primary path, then the first plausible free-text
/// string anywhere in the review blob.
fn extract_text(entry: &Value) -> String {
    if let Some(text) = pluck_str(entry, &[0, 2, 15, 0, 0]) {
        return text.to_string();
    }
    pluck(entry, &[0, 2])
        .and_then(|blob| find_free_text(blob, 4))
        .unwrap_or_default()
        .to_string()
}

// --- Positional navigation helpers ---

fn pluck<'a>(value: &'a Value, path: &[usize]) -> Option<&'a Value> {
    let mut current = value;
    for &index in path {
        current = current.get(index)?;
    }
    Some(current)
}

fn pluck_str<'a>(value: &'a Value, path: &[usize]) -> Option<&'a str> {
    pluck(value, path)?.as_str().filter(|s| !s.is_empty())
}

fn pluck_i64(value: &Value, path: &[usize]) -> Option<i64> {
    let v = pluck(value, path)?;
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

fn pluck_u64(value: &Value, path: &[usize]) -> Option<u64> {
    let v = pluck(value, path)?;
    v.as_u64()
        .or_else(|| v.as_f64().map(|f| f.round().max(0.0) as u64))
}

/// Scan nearby structure for a plausible `[year, month, day]` sub-array.
fn find_date_triple(value: &Value, depth: usize) -> Option<DateTime<Utc>> {
    let array = value.as_array()?;
    if let Some(date) = date_from_triple(value) {
        return Some(date);
    }
    if depth == 0 {
        return None;
    }
    array
        .iter()
        .find_map(|child| find_date_triple(child, depth - 1))
}

fn date_from_triple(value: &Value) -> Option<DateTime<Utc>> {
    let array = value.as_array()?;
    let year = array.first()?.as_i64()?;
    let month = array.get(1)?.as_i64()?;
    let day = array.get(2)?.as_i64()?;
    if !(1990..=2100).contains(&year) || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Utc.with_ymd_and_hms(year as i32, month as u32, day as u32, 0, 0, 0)
        .single()
}

/// First string in a subtree that reads as a relative date.
fn find_relative_string(value: &Value, depth: usize) -> Option<&str> {
    match value {
        Value::String(s) if dates::is_relative_date(s) => Some(s),
        Value::Array(items) if depth > 0 => {
            items.iter().find_map(|v| find_relative_string(v, depth - 1))
        }
        _ => None,
    }
}

/// First string in a subtree that reads as free text rather than a URL,
/// token, or relative date.
fn find_free_text(value: &Value, depth: usize) -> Option<&str> {
    match value {
        Value::String(s) => {
            let s = s.as_str();
            let plausible = s.chars().count() >= 4
                && !s.starts_with("http")
                && !s.starts_with("0x")
                && !dates::is_relative_date(s);
            plausible.then_some(s)
        }
        Value::Array(items) if depth > 0 => {
            items.iter().find_map(|v| find_free_text(v, depth - 1))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn raw(body: impl Into<String>) -> RawPage {
        RawPage {
            body: body.into(),
            status: 200,
            latency: std::time::Duration::from_millis(80),
            page_number: 1,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    /// A full entry in the provider's primary shape.
    fn full_entry(id: &str) -> Value {
        json!([[
            id,
            [null, null, 1_700_000_000_000_000i64, null,
             [null, null, null, null, null, ["Kim Minji", "https://example.com/u/kim"]],
             null, "2 weeks ago"],
            [[5]],
            [],
            [null, 12]
        ]])
    }

    fn page_body(token: Option<&str>, entries: Vec<Value>) -> String {
        let root = json!([null, token, entries, 42]);
        format!(")]}}'\n{root}")
    }

    #[test]
    fn test_full_entry_decodes_every_field() {
        let body = page_body(Some("TOKEN_A"), vec![full_entry("rev-1")]);
        let parsed = parse_page(&raw(body), now()).unwrap();

        assert_eq!(parsed.next_token, Some(PageToken::new("TOKEN_A")));
        assert_eq!(parsed.total_hint, Some(42));
        assert_eq!(parsed.discarded, 0);
        assert_eq!(parsed.records.len(), 1);

        let record = &parsed.records[0];
        assert_eq!(record.id, "rev-1");
        assert_eq!(record.author_name, "Kim Minji");
        assert_eq!(record.author_url, "https://example.com/u/kim");
        assert_eq!(record.rating, 5);
        assert_eq!(record.relative_date, "2 weeks ago");
        assert_eq!(record.likes, 12);
        assert_eq!(record.timestamp.unwrap().timestamp(), 1_700_000_000);
        assert!(record.has_known_date());
        assert_eq!(record.source_page, 1);
    }

    #[test]
    fn test_missing_token_means_last_page() {
        let parsed = parse_page(&raw(page_body(None, vec![])), now()).unwrap();
        assert!(parsed.next_token.is_none());

        let parsed = parse_page(&raw(page_body(Some(""), vec![])), now()).unwrap();
        assert!(parsed.next_token.is_none());
    }

    #[test]
    fn test_container_search_finds_nearby_date() {
        // No epoch at [0][1][2]; a [y, m, d] array sits elsewhere in the blob.
        let entry = json!([["rev-2", [null, [2025, 3, 9], null], [[4]]]]);
        let parsed = parse_page(&raw(page_body(None, vec![entry])), now()).unwrap();

        let record = &parsed.records[0];
        assert!(record.has_known_date());
        assert_eq!(
            record.timestamp.unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_secondary_fixed_path_date() {
        // Only the fallback triple at [0][2][6] is present.
        let entry = json!([[
            "rev-3",
            [],
            [[3], null, null, null, null, null, [2024, 11, 2]]
        ]]);
        let parsed = parse_page(&raw(page_body(None, vec![entry])), now()).unwrap();

        let record = &parsed.records[0];
        assert_eq!(
            record.timestamp.unwrap(),
            Utc.with_ymd_and_hms(2024, 11, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_relative_date_heuristic_as_last_tier() {
        let entry = json!([["rev-4", [null, null, null, null, null, null, "3 days ago"]]]);
        let parsed = parse_page(&raw(page_body(None, vec![entry])), now()).unwrap();

        let record = &parsed.records[0];
        assert_eq!(record.relative_date, "3 days ago");
        assert_eq!(record.timestamp.unwrap(), now() - Duration::days(3));
    }

    #[test]
    fn test_all_date_tiers_missing_yields_sentinel_not_drop() {
        let entry = json!([["rev-5", [], [[5]]]]);
        let parsed = parse_page(&raw(page_body(None, vec![entry])), now()).unwrap();

        assert_eq!(parsed.discarded, 0);
        let record = &parsed.records[0];
        assert_eq!(record.date, UNKNOWN_DATE);
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn test_unresolvable_identity_drops_only_that_entry() {
        let nameless = json!([[null, [], [[5]]]]);
        let body = page_body(None, vec![full_entry("rev-6"), nameless]);
        let parsed = parse_page(&raw(body), now()).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id, "rev-6");
        assert_eq!(parsed.discarded, 1);
    }

    #[test]
    fn test_review_text_primary_path() {
        let entry = json!([[
            "rev-7",
            [],
            [[5], null, null, null, null, null, null, null, null, null,
             null, null, null, null, null, [["The noodles were excellent."]]]
        ]]);
        let parsed = parse_page(&raw(page_body(None, vec![entry])), now()).unwrap();
        assert_eq!(parsed.records[0].text, "The noodles were excellent.");
    }

    #[test]
    fn test_short_text_survives_primary_path() {
        // Three characters: the free-text scan would reject this, so it
        // only decodes through the fixed path.
        let entry = json!([[
            "rev-10",
            [],
            [[5], null, null, null, null, null, null, null, null, null,
             null, null, null, null, null, [["wow"]]]
        ]]);
        let parsed = parse_page(&raw(page_body(None, vec![entry])), now()).unwrap();
        assert_eq!(parsed.records[0].text, "wow");
    }

    #[test]
    fn test_review_text_container_fallback() {
        let entry = json!([["rev-8", [], [[4], ["Surprisingly quiet on weekends"]]]]);
        let parsed = parse_page(&raw(page_body(None, vec![entry])), now()).unwrap();
        assert_eq!(parsed.records[0].text, "Surprisingly quiet on weekends");
    }

    #[test]
    fn test_prefix_optional() {
        let root = json!([null, null, [full_entry("rev-9")]]);
        let parsed = parse_page(&raw(root.to_string()), now()).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        let result = parse_page(&raw(")]}'\n<html>blocked</html>"), now());
        assert!(matches!(result, Err(ParseError::MalformedPayload(_))));
    }

    #[test]
    fn test_implausible_triples_rejected() {
        assert!(date_from_triple(&json!([3000, 1, 1])).is_none());
        assert!(date_from_triple(&json!([2024, 13, 1])).is_none());
        assert!(date_from_triple(&json!([2024, 1, 32])).is_none());
        assert!(date_from_triple(&json!([2024, 2, 2])).is_some());
    }
}

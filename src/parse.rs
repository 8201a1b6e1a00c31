//! The single boundary where untrusted model text becomes a typed value.
//!
//! Model responses are expected to be JSON, but frequently arrive wrapped
//! in markdown fences or surrounded by prose. All structured parsing in
//! the crate goes through [`parse_structured`], so fallback-on-parse-failure
//! decisions live at the call sites where the fallback is documented, never
//! deep inside business logic.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from structured-response parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in response")]
    NoJson,

    #[error("malformed JSON in response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse a typed value out of raw model output.
///
/// Tries, in order: the raw text as-is, the contents of a ```json fence,
/// the contents of a bare ``` fence, and finally the substring between the
/// first `{` and the last `}`.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    if let Ok(value) = serde_json::from_str::<T>(raw) {
        return Ok(value);
    }

    if let Some(block) = fenced_block(raw, "```json") {
        return Ok(serde_json::from_str(block)?);
    }
    if let Some(block) = fenced_block(raw, "```") {
        return Ok(serde_json::from_str(block)?);
    }

    let start = raw.find('{').ok_or(ParseError::NoJson)?;
    let end = raw.rfind('}').ok_or(ParseError::NoJson)?;
    if end <= start {
        return Err(ParseError::NoJson);
    }
    Ok(serde_json::from_str(&raw[start..=end])?)
}

/// Extract the contents of the first fence opened by `opener`.
fn fenced_block<'a>(raw: &'a str, opener: &str) -> Option<&'a str> {
    let after = &raw[raw.find(opener)? + opener.len()..];
    let end = after.find("```")?;
    Some(after[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        verdict: String,
        #[serde(default)]
        score: Option<f64>,
    }

    #[test]
    fn test_plain_json() {
        let reply: Reply = parse_structured(r#"{"verdict": "hold", "score": 6.5}"#).unwrap();
        assert_eq!(reply.verdict, "hold");
        assert_eq!(reply.score, Some(6.5));
    }

    #[test]
    fn test_json_fence() {
        let raw = "Here is my assessment:\n```json\n{\"verdict\": \"buy\"}\n```\nDone.";
        let reply: Reply = parse_structured(raw).unwrap();
        assert_eq!(reply.verdict, "buy");
        assert_eq!(reply.score, None);
    }

    #[test]
    fn test_bare_fence() {
        let raw = "```\n{\"verdict\": \"sell\", \"score\": 2.0}\n```";
        let reply: Reply = parse_structured(raw).unwrap();
        assert_eq!(reply.verdict, "sell");
    }

    #[test]
    fn test_embedded_object() {
        let raw = "I think the answer is {\"verdict\": \"hold\"} overall.";
        let reply: Reply = parse_structured(raw).unwrap();
        assert_eq!(reply.verdict, "hold");
    }

    #[test]
    fn test_no_json_at_all() {
        let err = parse_structured::<Reply>("the market looks frothy").unwrap_err();
        assert!(matches!(err, ParseError::NoJson));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_structured::<Reply>("{\"verdict\": }").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let err = parse_structured::<Reply>(r#"{"score": 5.0}"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }
}

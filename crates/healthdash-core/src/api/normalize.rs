//! Payload normalization applied before structural parsing.
//!
//! The backend serializes missing floating point values with the bare
//! tokens `NaN` and `Infinity`, which are not valid JSON. Rather than
//! failing the whole payload, every such token that appears outside a
//! string literal is rewritten to `null`, the explicit missing-value
//! marker. String contents are copied through untouched, so a chat message
//! that mentions "NaN" survives intact.

use std::borrow::Cow;

use serde::de::DeserializeOwned;

use super::FetchError;

/// Tokens rewritten to `null`, longest first so `-Infinity` wins over `-`.
const NON_FINITE_TOKENS: [&str; 4] = ["-Infinity", "Infinity", "-NaN", "NaN"];

const MISSING: &str = "null";

/// Rewrite non-finite numeric tokens to `null`.
///
/// Returns the input unchanged (borrowed) when there is nothing to rewrite.
pub fn normalize_non_finite(text: &str) -> Cow<'_, str> {
    if !text.contains("NaN") && !text.contains("Infinity") {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied_to = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }

        if matches!(b, b'-' | b'N' | b'I') {
            if let Some(token) = NON_FINITE_TOKENS
                .iter()
                .find(|t| bytes[i..].starts_with(t.as_bytes()))
            {
                out.push_str(&text[copied_to..i]);
                out.push_str(MISSING);
                i += token.len();
                copied_to = i;
                continue;
            }
        }
        i += 1;
    }

    if copied_to == 0 {
        return Cow::Borrowed(text);
    }
    out.push_str(&text[copied_to..]);
    Cow::Owned(out)
}

/// Normalize and parse a response body.
pub fn parse_payload<T: DeserializeOwned>(text: &str) -> Result<T, FetchError> {
    let normalized = normalize_non_finite(text);
    if let Cow::Owned(_) = normalized {
        tracing::debug!("Response contained non-finite numbers, rewritten to null");
    }
    serde_json::from_str(&normalized).map_err(|e| FetchError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn test_clean_payload_is_borrowed() {
        let text = r#"{"value": 1.5}"#;
        assert!(matches!(normalize_non_finite(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_nan_in_object_and_array() {
        let text = r#"{"a": NaN, "b": [1, NaN, -Infinity], "c": Infinity}"#;
        assert_eq!(
            normalize_non_finite(text),
            r#"{"a": null, "b": [1, null, null], "c": null}"#
        );
    }

    #[test]
    fn test_nan_inside_string_untouched() {
        let text = r#"{"note": "value was NaN, \"NaN\" again", "v": NaN}"#;
        let parsed: Value = parse_payload(text).unwrap();
        assert_eq!(parsed["note"], json!("value was NaN, \"NaN\" again"));
        assert_eq!(parsed["v"], Value::Null);
    }

    #[test]
    fn test_only_string_mentions_is_borrowed() {
        let text = r#"{"note": "Infinity and beyond"}"#;
        assert!(matches!(normalize_non_finite(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_negative_numbers_untouched() {
        let text = r#"{"delta": -3.5, "x": -NaN}"#;
        assert_eq!(normalize_non_finite(text), r#"{"delta": -3.5, "x": null}"#);
    }

    #[test]
    fn test_parse_payload_malformed() {
        let err = parse_payload::<Value>("{not json").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_nan_field_maps_to_missing_marker() {
        #[derive(serde::Deserialize)]
        struct Reading {
            value: Option<f64>,
            unit: String,
        }

        let reading: Reading = parse_payload(r#"{"value": NaN, "unit": "mg/dL"}"#).unwrap();
        assert_eq!(reading.value, None);
        assert_eq!(reading.unit, "mg/dL");
    }
}

//! Tolerant JSON payload isolation for LLM output.
//!
//! The backend is asked for JSON only, but in practice replies arrive wrapped
//! in markdown fences, preceded by commentary, or truncated mid-object. This
//! module isolates the first complete top-level JSON object from such a blob,
//! or fails with `PayloadError::Extraction`. Parsing and schema checks happen
//! afterwards in `editing::schema`.

use thiserror::Error;

/// Failure variants of the extraction/validation pipeline. These are expected
/// outcomes, not exceptions: the proposal layer turns them into a repair
/// retry and, if that also fails, the safe fallback.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("JSON extraction failed: {0}")]
    Extraction(String),

    #[error("Schema validation failed: {0}")]
    Validation(String),
}

/// Strips an outer ```-style fence and an optional leading language tag.
/// Text without a leading fence is returned unchanged (trimmed).
pub fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag (e.g. "json"), which runs to the first newline.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").map(str::trim).unwrap_or_else(|| rest.trim())
}

/// Isolates the first complete top-level JSON object in `text`.
///
/// If the trimmed text is already a single object (starts with `{`, ends with
/// `}`), it is returned as-is. Otherwise the scan starts at the first `{` and
/// walks forward tracking brace depth; characters inside quoted strings,
/// including escaped quotes, are non-structural. The candidate ends where the
/// depth returns to zero.
pub fn extract_object(text: &str) -> Result<&str, PayloadError> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed);
    }

    let start = trimmed
        .find('{')
        .ok_or_else(|| PayloadError::Extraction("no JSON object found in output".to_string()))?;

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in trimmed[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&trimmed[start..start + idx + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    Err(PayloadError::Extraction(
        "unterminated JSON object in output".to_string(),
    ))
}

/// Full isolation step: fence removal, then object extraction.
pub fn isolate(text: &str) -> Result<&str, PayloadError> {
    extract_object(strip_fences(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_fences_unterminated_fence() {
        let input = "```json\n{\"key\": \"value\"}";
        assert_eq!(strip_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_extract_object_plain() {
        assert_eq!(extract_object(r#"{"a": 1}"#).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_object_surrounded_by_commentary() {
        let input = "Sure! Here is the JSON you asked for:\n{\"a\": {\"b\": 2}}\nLet me know if you need anything else.";
        assert_eq!(extract_object(input).unwrap(), r#"{"a": {"b": 2}}"#);
    }

    #[test]
    fn test_extract_object_braces_inside_strings() {
        let input = r#"note {"msg": "use {braces} freely", "n": 1} trailing"#;
        assert_eq!(
            extract_object(input).unwrap(),
            r#"{"msg": "use {braces} freely", "n": 1}"#
        );
    }

    #[test]
    fn test_extract_object_escaped_quote_in_string() {
        let input = r#"{"msg": "she said \"hi {\" ", "n": 1}"#;
        assert_eq!(extract_object(input).unwrap(), input);
    }

    #[test]
    fn test_extract_object_no_brace_fails() {
        let err = extract_object("there is no object here").unwrap_err();
        assert!(matches!(err, PayloadError::Extraction(_)));
    }

    #[test]
    fn test_extract_object_unbalanced_fails() {
        let err = extract_object(r#"prefix {"a": "b""#).unwrap_err();
        assert!(matches!(err, PayloadError::Extraction(_)));
    }

    #[test]
    fn test_isolate_fenced_object_with_commentary() {
        let input = "```json\nThe object: {\"edits\": []}\n```";
        assert_eq!(isolate(input).unwrap(), r#"{"edits": []}"#);
    }

    #[test]
    fn test_isolate_picks_first_object() {
        let input = r#"{"first": 1} {"second": 2}"#;
        assert_eq!(isolate(input).unwrap(), input.trim());
        // Leading/trailing already an object: returned whole. A wrapped scan
        // still isolates the first object when the blob is not one object.
        let wrapped = r#"x {"first": 1} {"second": 2}"#;
        assert_eq!(isolate(wrapped).unwrap(), r#"{"first": 1}"#);
    }
}

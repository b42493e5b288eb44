//! Response normalization
//!
//! Generated replies are either prose or JSON documents. JSON is reformatted
//! with two-space indentation so it renders predictably; anything else is
//! shown verbatim.
//!
//! `is_structured` is a display hint derived from the reply's shape. It is
//! true for every bracket-delimited reply, even one that never parsed, and
//! callers must not read it as "valid JSON".

use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

/// A reply ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub display_text: String,
    pub is_structured: bool,
}

/// Normalize a raw text reply; never fails
pub fn normalize(raw: &str) -> Normalized {
    let trimmed = raw.trim();

    if let Some(pretty) = parse_document(trimmed) {
        return Normalized {
            display_text: pretty,
            is_structured: true,
        };
    }

    let looks_structured = is_bracketed(trimmed);
    if looks_structured {
        if let Some(pretty) = parse_document(&repair(trimmed)) {
            return Normalized {
                display_text: pretty,
                is_structured: true,
            };
        }
    }

    Normalized {
        display_text: raw.to_string(),
        is_structured: looks_structured,
    }
}

/// Normalize a reply the backend already sent as JSON
pub fn normalize_value(value: &Value) -> Normalized {
    match value {
        Value::String(text) => normalize(text),
        Value::Object(_) | Value::Array(_) => Normalized {
            display_text: pretty(value).unwrap_or_else(|| value.to_string()),
            is_structured: true,
        },
        other => Normalized {
            display_text: other.to_string(),
            is_structured: false,
        },
    }
}

/// Strict parse; only objects and arrays count as documents
fn parse_document(text: &str) -> Option<String> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => pretty(&value),
        _ => None,
    }
}

fn pretty(value: &Value) -> Option<String> {
    serde_json::to_string_pretty(value).ok()
}

fn is_bracketed(text: &str) -> bool {
    (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']'))
}

fn bareword_key() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([\{,]\s*)([A-Za-z_][A-Za-z0-9_\-]*)\s*:").expect("valid regex")
    })
}

fn bareword_value() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(:\s*)([A-Za-z_][A-Za-z0-9_ \-\.]*?)(\s*[,\}\]])").expect("valid regex")
    })
}

/// Best-effort rewrite of JavaScript-ish object literals into JSON
///
/// Single and typographic quotes become double quotes, bare keys get quoted,
/// and bare word values other than `true`, `false` and `null` get quoted.
fn repair(text: &str) -> String {
    let quoted: String = text
        .chars()
        .map(|c| match c {
            '\'' | '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect();

    let keys = bareword_key().replace_all(&quoted, "$1\"$2\":");

    bareword_value()
        .replace_all(&keys, |caps: &Captures| {
            let word = &caps[2];
            if matches!(word, "true" | "false" | "null") {
                caps[0].to_string()
            } else {
                format!("{}\"{}\"{}", &caps[1], word, &caps[3])
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json_is_pretty_printed() {
        let out = normalize(r#"{"a":1}"#);
        assert!(out.is_structured);
        assert_eq!(out.display_text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let out = normalize("hello");
        assert!(!out.is_structured);
        assert_eq!(out.display_text, "hello");
    }

    #[test]
    fn test_plain_text_keeps_surrounding_whitespace() {
        let out = normalize("  hola mundo \n");
        assert_eq!(out.display_text, "  hola mundo \n");
        assert!(!out.is_structured);
    }

    #[test]
    fn test_scalar_json_is_not_a_document() {
        let out = normalize("42");
        assert!(!out.is_structured);
        assert_eq!(out.display_text, "42");
    }

    #[test]
    fn test_array_is_structured() {
        let out = normalize("[1, 2]");
        assert!(out.is_structured);
        assert_eq!(out.display_text, "[\n  1,\n  2\n]");
    }

    #[test]
    fn test_repairs_single_quotes() {
        let out = normalize("{'nombre': 'Ana'}");
        assert!(out.is_structured);
        assert_eq!(out.display_text, "{\n  \"nombre\": \"Ana\"\n}");
    }

    #[test]
    fn test_repairs_bare_keys_and_values() {
        let out = normalize("{name: Ana, age: 30, active: true, city: Madrid}");
        assert!(out.is_structured);

        let parsed: Value = serde_json::from_str(&out.display_text).unwrap();
        assert_eq!(parsed["name"], "Ana");
        assert_eq!(parsed["age"], 30);
        assert_eq!(parsed["active"], true);
        assert_eq!(parsed["city"], "Madrid");
    }

    #[test]
    fn test_unrepairable_bracketed_text_is_flagged_but_verbatim() {
        let raw = "{esto no es json: [}";
        let out = normalize(raw);
        assert!(out.is_structured);
        assert_eq!(out.display_text, raw);
    }

    #[test]
    fn test_bracketed_prose_is_flagged() {
        let raw = "[nota al margen]";
        let out = normalize(raw);
        assert!(out.is_structured);
        assert_eq!(out.display_text, raw);
    }

    #[test]
    fn test_unbalanced_brackets_are_plain() {
        let out = normalize("{abierto");
        assert!(!out.is_structured);
        assert_eq!(out.display_text, "{abierto");
    }

    #[test]
    fn test_empty_input() {
        let out = normalize("");
        assert!(!out.is_structured);
        assert_eq!(out.display_text, "");
    }

    #[test]
    fn test_normalize_value_variants() {
        let text = normalize_value(&Value::String("hola".into()));
        assert_eq!(text.display_text, "hola");
        assert!(!text.is_structured);

        let object = normalize_value(&serde_json::json!({"ok": true}));
        assert!(object.is_structured);
        assert_eq!(object.display_text, "{\n  \"ok\": true\n}");

        let number = normalize_value(&serde_json::json!(7));
        assert!(!number.is_structured);
        assert_eq!(number.display_text, "7");
    }
}

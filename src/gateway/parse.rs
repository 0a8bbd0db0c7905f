use crate::error::ParseError;
use regex::Regex;
use serde_json::{Deserializer, Value};
use std::sync::OnceLock;

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"`{3}[A-Za-z]*").expect("fence pattern is valid"))
}

/// Recover a JSON value from raw model output.
///
/// Skips any text before the first `{` or `[`, strips markdown fences,
/// `//` and `/* */` comments outside strings and trailing commas before a
/// closing bracket, then parses the first complete JSON value. Text after
/// that value is ignored.
pub fn parse_json_response(text: &str) -> Result<Value, ParseError> {
    let start = text.find(['{', '[']).ok_or(ParseError::NoJson)?;
    let unfenced = fence_pattern().replace_all(&text[start..], "");
    let cleaned = strip_trailing_commas(&strip_comments(&unfenced));

    let mut stream = Deserializer::from_str(&cleaned).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(ParseError::Malformed(e.to_string())),
        None => Err(ParseError::NoJson),
    }
}

/// Remove `//` line comments and `/* */` block comments outside string literals
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Drop commas that are followed only by whitespace and a closing bracket
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_object() {
        let value = parse_json_response(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_leading_prose_and_fences() {
        let text = "Sure! Here is the plan:\n```json\n{\"name\": \"Knight\", \"parts\": []}\n```\nEnjoy.";
        let value = parse_json_response(text).unwrap();
        assert_eq!(value, json!({"name": "Knight", "parts": []}));
    }

    #[test]
    fn test_comments_and_trailing_commas() {
        let text = r#"{
            // the body
            "shapes": [
                {"id": "torso", "x": 1,}, /* block */
            ],
        }"#;
        let value = parse_json_response(text).unwrap();
        assert_eq!(value, json!({"shapes": [{"id": "torso", "x": 1}]}));
    }

    #[test]
    fn test_comment_markers_inside_strings_survive() {
        let text = r#"{"url": "http://example.com/a,]", "note": "/* keep */"}"#;
        let value = parse_json_response(text).unwrap();
        assert_eq!(value["url"], json!("http://example.com/a,]"));
        assert_eq!(value["note"], json!("/* keep */"));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"quote": "she said \"hi\", // not a comment"}"#;
        let value = parse_json_response(text).unwrap();
        assert_eq!(value["quote"], json!("she said \"hi\", // not a comment"));
    }

    #[test]
    fn test_top_level_array() {
        let value = parse_json_response("Variations: [\"a\", \"b\",]").unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }

    #[test]
    fn test_trailing_text_after_value_is_ignored() {
        let value = parse_json_response("{\"a\": 1} and then {\"b\": 2}").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_no_json() {
        assert_eq!(parse_json_response("no braces here"), Err(ParseError::NoJson));
    }

    #[test]
    fn test_malformed() {
        let err = parse_json_response("{\"a\": }").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }
}

//! 回應資料的文字呈現：縮排 JSON 或簡易 Markdown。

use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

const MAX_DEPTH: usize = 3;
const NESTED_ITEMS: usize = 5;
const TOP_LEVEL_ITEMS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum RenderFormat {
    #[default]
    Json,
    Markdown,
}

pub fn render(value: &Value, title: &str, format: RenderFormat) -> Result<String> {
    match format {
        RenderFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        RenderFormat::Markdown => Ok(json_to_markdown(value, title)),
    }
}

pub fn json_to_markdown(value: &Value, title: &str) -> String {
    let mut out = String::new();
    write_value(&mut out, value, title, 0);
    out
}

fn write_value(out: &mut String, value: &Value, title: &str, depth: usize) {
    if depth > MAX_DEPTH {
        out.push_str("*(nested data truncated)*");
        return;
    }

    match value {
        Value::Object(map) => {
            let _ = writeln!(out, "{} {}\n", "#".repeat(depth + 2), title);
            for (key, item) in map {
                match item {
                    Value::Object(inner) if !inner.is_empty() => {
                        write_value(out, item, key, depth + 1)
                    }
                    Value::Array(items) if !items.is_empty() => {
                        let _ = writeln!(out, "**{}:**\n", key);
                        for (i, entry) in items.iter().take(NESTED_ITEMS).enumerate() {
                            if entry.is_object() {
                                write_value(out, entry, &format!("{} {}", key, i + 1), depth + 1);
                            } else {
                                let _ = writeln!(out, "- {}", scalar(entry));
                            }
                        }
                        if items.len() > NESTED_ITEMS {
                            let _ = writeln!(
                                out,
                                "- *(and {} more items)*",
                                items.len() - NESTED_ITEMS
                            );
                        }
                        out.push('\n');
                    }
                    _ => {
                        let _ = writeln!(out, "**{}:** {}\n", key, field_value(item));
                    }
                }
            }
        }
        Value::Array(items) => {
            if depth == 0 {
                let _ = writeln!(out, "## {}\n", title);
            } else {
                let _ = writeln!(out, "**{}:**\n", title);
            }
            for (i, entry) in items.iter().take(TOP_LEVEL_ITEMS).enumerate() {
                if entry.is_object() {
                    write_value(out, entry, &format!("Item {}", i + 1), depth + 1);
                } else {
                    let _ = writeln!(out, "{}. {}", i + 1, scalar(entry));
                }
            }
            if items.len() > TOP_LEVEL_ITEMS {
                let _ = writeln!(out, "*(and {} more items)*", items.len() - TOP_LEVEL_ITEMS);
            }
            out.push('\n');
        }
        other => {
            let _ = writeln!(out, "## {}\n\n{}\n", title, scalar(other));
        }
    }
}

fn field_value(value: &Value) -> String {
    match value {
        Value::Null => "*Not provided*".to_string(),
        Value::String(s) if s.trim().is_empty() => "*Empty*".to_string(),
        Value::Bool(true) => "✅ Yes".to_string(),
        Value::Bool(false) => "❌ No".to_string(),
        other => scalar(other),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_fields() {
        let md = json_to_markdown(
            &json!({"Company": "Acme", "Website": null, "Hiring": true, "Note": " "}),
            "Enrichment",
        );
        assert!(md.starts_with("## Enrichment\n\n"));
        assert!(md.contains("**Company:** Acme"));
        assert!(md.contains("**Website:** *Not provided*"));
        assert!(md.contains("**Hiring:** ✅ Yes"));
        assert!(md.contains("**Note:** *Empty*"));
    }

    #[test]
    fn test_nested_arrays_are_capped() {
        let md = json_to_markdown(&json!({"tags": [1, 2, 3, 4, 5, 6, 7]}), "Data");
        assert!(md.contains("- 5\n"));
        assert!(!md.contains("- 6\n"));
        assert!(md.contains("*(and 2 more items)*"));
    }

    #[test]
    fn test_top_level_arrays_are_capped() {
        let items: Vec<u32> = (1..=12).collect();
        let md = json_to_markdown(&json!(items), "List");
        assert!(md.contains("10. 10\n"));
        assert!(!md.contains("11. 11"));
        assert!(md.contains("*(and 2 more items)*"));
    }

    #[test]
    fn test_deep_nesting_is_truncated() {
        let md = json_to_markdown(&json!({"a": {"b": {"c": {"d": {"e": 1}}}}}), "Deep");
        assert!(md.contains("##### c"));
        assert!(md.contains("*(nested data truncated)*"));
        assert!(!md.contains("**e:**"));
    }

    #[test]
    fn test_render_json_is_pretty() {
        let out = render(&json!({"a": 1}), "x", RenderFormat::Json).unwrap();
        assert_eq!(out, "{\n  \"a\": 1\n}");
    }
}

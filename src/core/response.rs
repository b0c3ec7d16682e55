use crate::config::endpoints::ResponseExtractor;
use serde_json::{Map, Value};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// flow 回應中所有訊息文字，依出現順序
///
/// 結構為 `outputs[].outputs[].messages[].message`；部分 flow 會多包一層
/// `outputs[].outputs[].outputs.messages`。
pub fn message_texts(data: &Value) -> Vec<&str> {
    let items = data
        .get("outputs")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|output| output.get("outputs").and_then(Value::as_array))
        .flatten();

    let mut texts = Vec::new();
    for item in items {
        let messages = item
            .get("messages")
            .and_then(Value::as_array)
            .filter(|m| !m.is_empty())
            .or_else(|| {
                item.get("outputs")
                    .and_then(|o| o.get("messages"))
                    .and_then(Value::as_array)
            });

        for message in messages.into_iter().flatten() {
            if let Some(text) = message.get("message").and_then(Value::as_str) {
                texts.push(text);
            }
        }
    }
    texts
}

/// 取出 ```json ... ``` 區塊的內容
pub fn fenced_json_block(text: &str) -> Option<&str> {
    let start = text.find(JSON_FENCE)? + JSON_FENCE.len();
    let rest = &text[start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// 回傳 (處理後資料, 處理錯誤)；原始回應不受影響
pub fn extract(data: &Value, extractor: ResponseExtractor) -> (Option<Value>, Option<String>) {
    let block = message_texts(data).into_iter().find_map(fenced_json_block);

    let Some(block) = block else {
        return (None, Some("No embedded JSON found in messages".to_string()));
    };

    let parsed: Value = match serde_json::from_str(block) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("⚠️ Embedded JSON block could not be parsed: {}", e);
            return (None, Some(format!("Failed to parse JSON: {}", e)));
        }
    };

    match extractor {
        ResponseExtractor::EmbeddedJson => (Some(parsed), None),
        ResponseExtractor::EmbeddedFields(fields) => {
            let picked: Map<String, Value> = fields
                .iter()
                .map(|f| (f.to_string(), parsed.get(*f).cloned().unwrap_or(Value::Null)))
                .collect();
            (Some(Value::Object(picked)), None)
        }
    }
}

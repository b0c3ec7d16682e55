//! 通用的 API 呼叫：所有端點共用同一套流程，差異全部來自
//! [`EndpointSpec`] 表。

use crate::adapters::http::AgentHiveClient;
use crate::config::endpoints::{Endpoint, EndpointSpec, FieldCheck, InputKind};
use crate::core::response;
use crate::domain::model::ApiResponse;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_linkedin_url;
use serde_json::{json, Map, Value};
use std::time::Duration;

pub type FormValues = Map<String, Value>;

/// 空值判斷：null、空字串、空陣列/物件、false、0
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// 把使用者輸入的文字轉成表單：JSON 物件，或（文字型端點）單一欄位
pub fn parse_form(spec: &EndpointSpec, raw: &str) -> Result<FormValues> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("input", "Please provide input data"));
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(form)) => Ok(form),
        Ok(_) if matches!(spec.input, InputKind::JsonObject) => Err(AppError::validation(
            "input",
            "JSON input must be an object (dictionary), not an array or primitive value",
        )),
        Ok(Value::String(text)) => text_form(spec, &text),
        Ok(_) => text_form(spec, trimmed),
        Err(e) => match spec.input {
            InputKind::Text { .. } => text_form(spec, trimmed),
            InputKind::JsonObject => Err(AppError::validation(
                "input",
                format!("Invalid JSON format: {}", e),
            )),
        },
    }
}

fn text_form(spec: &EndpointSpec, text: &str) -> Result<FormValues> {
    match spec.input {
        InputKind::Text { field } => {
            let mut form = Map::new();
            form.insert(field.to_string(), Value::String(text.trim().to_string()));
            Ok(form)
        }
        InputKind::JsonObject => Err(AppError::validation(
            "input",
            "JSON input must be an object (dictionary)",
        )),
    }
}

/// 依欄位表改名、補預設值並檢查必填欄位
pub fn build_input(spec: &EndpointSpec, form: &FormValues) -> Result<Map<String, Value>> {
    if form.is_empty() {
        return Err(AppError::validation("input", "Input data cannot be empty"));
    }

    let mut input = Map::new();
    for (key, value) in form {
        let target = spec
            .fields
            .iter()
            .find(|rule| rule.source == key)
            .map(|rule| rule.target.to_string())
            .unwrap_or_else(|| key.clone());
        input.insert(target, value.clone());
    }

    for (key, default) in spec.defaults {
        if input.get(*key).map_or(true, is_blank) {
            input.insert(key.to_string(), Value::String(default.to_string()));
        }
    }

    let missing: Vec<&str> = spec
        .required_targets()
        .filter(|target| input.get(*target).map_or(true, is_blank))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::validation(
            missing.join(", "),
            format!("Missing required fields: {}", missing.join(", ")),
        ));
    }

    for rule in spec.fields {
        if let (FieldCheck::LinkedinProfileUrl, Some(value)) = (rule.check, input.get(rule.target)) {
            validate_linkedin_url(rule.target, value.as_str().unwrap_or_default())?;
        }
    }

    if !spec.recommended_any.is_empty()
        && !input
            .keys()
            .any(|k| spec.recommended_any.iter().any(|r| r.eq_ignore_ascii_case(k)))
    {
        tracing::warn!(
            "For best results, include at least one of: {}",
            spec.recommended_any.join(", ")
        );
    }

    Ok(input)
}

/// flow API 的請求本體
pub fn build_payload(spec: &EndpointSpec, input: &Map<String, Value>) -> Result<Value> {
    let input_value = match spec.input {
        InputKind::JsonObject => serde_json::to_string(input)?,
        InputKind::Text { field } => match input.get(field) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(other) => other.to_string(),
            None => return Err(AppError::validation(field, "Input data cannot be empty")),
        },
    };

    let mut payload = json!({
        "output_type": "chat",
        "input_type": "chat",
        "input_value": input_value,
    });
    if let Some(tweaks) = spec.tweaks() {
        payload["tweaks"] = tweaks;
    }
    Ok(payload)
}

/// 驗證 → 組請求 → 單次呼叫 → 擷取內嵌 JSON
pub async fn call(
    client: &AgentHiveClient,
    endpoint: Endpoint,
    form: &FormValues,
) -> Result<ApiResponse> {
    let spec = endpoint.spec();
    let input = build_input(spec, form)?;
    let payload = build_payload(spec, &input)?;

    tracing::info!("🚀 Calling {} ({})", spec.title, spec.flow);
    let (status, data) = client
        .run_flow(spec.flow, &payload, spec.timeout_seconds.map(Duration::from_secs))
        .await?;

    let (processed, processing_error) = response::extract(&data, spec.extractor);
    if let Some(err) = &processing_error {
        tracing::warn!("⚠️ {}: {}", endpoint, err);
    }
    tracing::info!("✅ {} completed", spec.title);

    Ok(ApiResponse {
        endpoint: endpoint.name().to_string(),
        status,
        data,
        processed,
        processing_error,
    })
}

use crate::config::endpoints::Endpoint;
use crate::domain::model::{ApiResponse, ConversionResult};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

pub const LAST_CONVERSION: &str = "last_conversion";
pub const WORKFLOW: &str = "workflow";

pub fn last_response_key(endpoint: Endpoint) -> String {
    format!("last_response.{}", endpoint.name())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub source: String,
    pub saved_at: DateTime<Utc>,
    pub total_companies: usize,
    pub total_records: usize,
}

/// 單一使用者 session 的狀態；由呼叫端持有並以 `&mut` 傳入各個 handler
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    values: HashMap<String, Value>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    pub fn get_ref(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        tracing::debug!("Session set: {}", key);
        self.values.insert(key, value);
    }

    pub fn set_serialized<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.set(key, serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn clear(&mut self) {
        tracing::debug!("Session cleared ({} keys)", self.values.len());
        self.values.clear();
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 保存最近一次轉換結果（包含報告），供之後顯示
    pub fn store_conversion(&mut self, result: &ConversionResult) {
        self.set(
            LAST_CONVERSION,
            json!({
                "groups": result.groups_document(),
                "report": result.report_document(),
            }),
        );
    }

    pub fn store_response(&mut self, response: &ApiResponse, endpoint: Endpoint) -> Result<()> {
        self.set_serialized(last_response_key(endpoint), response)
    }

    pub fn last_response(&self, endpoint: Endpoint) -> Option<ApiResponse> {
        self.get_ref(&last_response_key(endpoint))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// 把轉換結果存成 workflow 資料，其他區段可以接著使用
    pub fn save_workflow(&mut self, result: &ConversionResult, source: &str) -> WorkflowMetadata {
        let metadata = WorkflowMetadata {
            source: source.to_string(),
            saved_at: Utc::now(),
            total_companies: result.summary.companies,
            total_records: result.summary.rows_grouped,
        };

        let companies: Vec<&str> = result.company_names();
        let mut entries = serde_json::Map::new();
        entries.insert("data".to_string(), result.groups_document());
        entries.insert("companies".to_string(), json!(companies));
        entries.insert(
            "metadata".to_string(),
            serde_json::to_value(&metadata).unwrap_or(Value::Null),
        );
        self.set(WORKFLOW, Value::Object(entries));

        tracing::info!(
            "💾 Workflow data saved from {} ({} companies, {} records)",
            source,
            metadata.total_companies,
            metadata.total_records
        );
        metadata
    }

    pub fn workflow_metadata(&self) -> Option<WorkflowMetadata> {
        self.get_ref(WORKFLOW)
            .and_then(|w| w.get("metadata"))
            .and_then(|m| serde_json::from_value(m.clone()).ok())
    }

    pub fn workflow_data(&self) -> Option<&Value> {
        self.get_ref(WORKFLOW).and_then(|w| w.get("data"))
    }

    /// `company_people` 形狀下的第 `index` 筆
    pub fn workflow_entry(&self, index: usize) -> Option<&Value> {
        self.workflow_data()?.as_array()?.get(index)
    }

    /// 批次處理把結果寫回 workflow 用
    pub fn workflow_entry_mut(
        &mut self,
        index: usize,
    ) -> Option<&mut serde_json::Map<String, Value>> {
        self.values
            .get_mut(WORKFLOW)?
            .get_mut("data")?
            .as_array_mut()?
            .get_mut(index)?
            .as_object_mut()
    }

    pub fn companies(&self) -> Vec<String> {
        self.get_ref(WORKFLOW)
            .and_then(|w| w.get("companies"))
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 依公司名稱取出 workflow 中該公司的資料
    pub fn company(&self, name: &str) -> Option<Value> {
        let position = self.companies().iter().position(|c| c == name)?;
        match self.workflow_data()? {
            Value::Object(groups) => groups.get(name).cloned(),
            Value::Array(entries) => entries.get(position).cloned(),
            _ => None,
        }
    }

    pub fn export_workflow(&self) -> Result<Option<String>> {
        match self.workflow_data() {
            Some(data) => Ok(Some(serde_json::to_string_pretty(data)?)),
            None => Ok(None),
        }
    }

    pub fn clear_workflow(&mut self) {
        self.remove(WORKFLOW);
    }
}

//! Workflow 批次處理：對 `company_people` 形狀的 workflow 逐筆呼叫同一個端點，
//! 結果寫回 session。
//!
//! 每一筆資料的狀態都記在自己的欄位上：成功時寫入結果與時間戳並移除舊的錯誤，
//! 失敗時只寫入錯誤欄位，其他資料列照常處理。

use crate::adapters::http::AgentHiveClient;
use crate::config::endpoints::Endpoint;
use crate::core::playground::{self, is_blank, FormValues};
use crate::core::session::SessionState;
use crate::domain::model::ApiResponse;
use crate::utils::error::{AppError, Result};
use chrono::{Local, Utc};
use serde_json::{json, Map, Value};
use std::str::FromStr;

const NO_ENRICHED_DATA: &str = "No enriched data available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPass {
    Enrich,
    Icp,
    Market,
}

impl BatchPass {
    pub fn endpoint(self) -> Endpoint {
        match self {
            BatchPass::Enrich => Endpoint::Enrichment,
            BatchPass::Icp => Endpoint::IcpProfiling,
            BatchPass::Market => Endpoint::MarketIntelligence,
        }
    }

    pub fn result_key(self) -> &'static str {
        match self {
            BatchPass::Enrich => "enriched_lead",
            BatchPass::Icp => "icp_analysis",
            BatchPass::Market => "market_intelligence",
        }
    }

    pub fn error_key(self) -> &'static str {
        match self {
            BatchPass::Enrich => "api_enrichment_error",
            BatchPass::Icp => "icp_analysis_error",
            BatchPass::Market => "market_intelligence_error",
        }
    }

    pub fn timestamp_key(self) -> &'static str {
        match self {
            BatchPass::Enrich => "enrichment_timestamp",
            BatchPass::Icp => "icp_analysis_timestamp",
            BatchPass::Market => "intelligence_timestamp",
        }
    }

    /// 分析類的結果另外記一個 Unix 秒數，方便依時間篩選
    fn numeric_timestamp_key(self) -> Option<&'static str> {
        match self {
            BatchPass::Enrich => None,
            BatchPass::Icp => Some("icp_analysis_timestamp_numeric"),
            BatchPass::Market => Some("intelligence_timestamp_numeric"),
        }
    }
}

impl FromStr for BatchPass {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enrich" | "enrichment" => Ok(BatchPass::Enrich),
            "icp" => Ok(BatchPass::Icp),
            "market" => Ok(BatchPass::Market),
            other => Err(AppError::validation(
                "pass",
                format!("Unknown batch pass '{}', expected enrich, icp or market", other),
            )),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 每一筆的處理方式；`Skip` 可附帶要寫回的錯誤
enum Plan {
    Skip { error: Option<&'static str> },
    Send(FormValues),
}

/// 對 workflow 第 `start..=end` 筆執行 `pass`；`end` 超出範圍時截到最後一筆
pub async fn run_batch(
    client: &AgentHiveClient,
    session: &mut SessionState,
    pass: BatchPass,
    start: usize,
    end: usize,
    reanalyze: bool,
) -> Result<BatchSummary> {
    let total = workflow_len(session)?;
    if start > end {
        return Err(AppError::validation(
            "range",
            format!("Start index {} is after end index {}", start, end),
        ));
    }
    if start >= total {
        return Err(AppError::validation(
            "range",
            format!("Start index {} is out of range (workflow has {} rows)", start, total),
        ));
    }
    let end = end.min(total - 1);

    tracing::info!(
        "🔄 Batch {} over rows {}-{} ({} rows)",
        pass.endpoint().name(),
        start,
        end,
        end - start + 1
    );

    let mut summary = BatchSummary::default();
    for index in start..=end {
        summary.processed += 1;
        let Some(entry) = session.workflow_entry(index).cloned() else {
            continue;
        };

        let form = match plan(pass, &entry, reanalyze) {
            Plan::Send(form) => form,
            Plan::Skip { error } => {
                summary.skipped += 1;
                if let Some(error) = error {
                    write_entry(session, index, |row| {
                        row.insert(pass.error_key().to_string(), json!(error));
                    });
                }
                tracing::debug!("⏭️ Row {} skipped", index);
                continue;
            }
        };

        tracing::info!(
            "📡 [{}/{}] {}",
            index - start + 1,
            end - start + 1,
            company_label(&entry, index)
        );

        match playground::call(client, pass.endpoint(), &form).await {
            Ok(response) => {
                summary.successful += 1;
                let result = stored_result(&response);
                write_entry(session, index, |row| {
                    row.insert(pass.result_key().to_string(), result);
                    row.insert(
                        pass.timestamp_key().to_string(),
                        json!(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
                    );
                    if let Some(key) = pass.numeric_timestamp_key() {
                        row.insert(key.to_string(), json!(Utc::now().timestamp()));
                    }
                    row.remove(pass.error_key());
                });
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!("❌ Row {} failed: {}", index, e);
                write_entry(session, index, |row| {
                    row.insert(pass.error_key().to_string(), json!(e.to_string()));
                });
            }
        }
    }

    tracing::info!(
        "✅ Batch {} finished: {} successful, {} failed, {} skipped",
        pass.endpoint().name(),
        summary.successful,
        summary.failed,
        summary.skipped
    );
    Ok(summary)
}

fn workflow_len(session: &SessionState) -> Result<usize> {
    match session.workflow_data() {
        Some(Value::Array(entries)) => Ok(entries.len()),
        Some(_) => Err(AppError::validation(
            "workflow",
            "Batch processing needs workflow data in the company_people output shape",
        )),
        None => Err(AppError::validation(
            "workflow",
            "No workflow data available. Convert a CSV file first",
        )),
    }
}

fn plan(pass: BatchPass, entry: &Value, reanalyze: bool) -> Plan {
    let lead = entry.get("enriched_lead").filter(|v| !is_blank(v));
    if pass != BatchPass::Enrich && lead.is_none() {
        return Plan::Skip {
            error: Some(NO_ENRICHED_DATA),
        };
    }
    if entry.get(pass.result_key()).is_some() && !reanalyze {
        return Plan::Skip { error: None };
    }

    let company = entry.get("company").and_then(Value::as_object);
    let mut form = Map::new();
    match (pass, lead) {
        (BatchPass::Enrich, _) => {
            if let Some(company) = company {
                form = company.clone();
            }
        }
        (BatchPass::Icp, Some(lead)) => {
            form.insert("domain".to_string(), json!(lead_domain(company, lead)));
            form.insert("enriched_lead".to_string(), lead.clone());
        }
        (BatchPass::Market, Some(lead)) => {
            if let Some(lead) = lead.as_object() {
                form = lead.clone();
                form.retain(|key, _| key != "Sources");
            }
        }
        _ => {}
    }
    Plan::Send(form)
}

/// 網域依序取自公司的 Domain、Website，最後才是 enrichment 結果
fn lead_domain(company: Option<&Map<String, Value>>, lead: &Value) -> String {
    let company_value = |key: &str| company.and_then(|c| c.get(key));
    [
        company_value("Company Domain"),
        company_value("Company Website"),
        lead.get("Domain"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .map(str::trim)
    .find(|s| !s.is_empty())
    .unwrap_or_default()
    .to_string()
}

/// 解析不到結構化資料時保留原始回應
fn stored_result(response: &ApiResponse) -> Value {
    match &response.processed {
        Some(processed) => processed.clone(),
        None => json!({
            "status": "no_structured_data",
            "error": response.processing_error,
            "raw_response": response.data,
        }),
    }
}

fn company_label(entry: &Value, index: usize) -> String {
    entry
        .get("company")
        .and_then(|c| c.get("Company Name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Row {}", index))
}

fn write_entry(
    session: &mut SessionState,
    index: usize,
    update: impl FnOnce(&mut Map<String, Value>),
) {
    if let Some(row) = session.workflow_entry_mut(index) {
        update(row);
    }
}

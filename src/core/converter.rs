//! CSV → 依公司分組的 JSON。
//!
//! 兩層失敗策略：格式錯誤（[`AppError::ParseError`]）與缺少必填欄位
//! （[`AppError::SchemaError`]）會中止整個轉換；單列缺值只會被略過並記錄在
//! `rejected` 中。此模組不做任何 I/O。

use crate::config::CsvConfig;
use crate::domain::model::{
    ColumnCoverage, CompanyGroup, ConversionResult, ConversionSummary, KeyMode, RejectedRow, Row,
};
use crate::utils::error::{AppError, Result};
use std::collections::{HashMap, HashSet};

pub fn convert(data: &[u8], config: &CsvConfig) -> Result<ConversionResult> {
    let (headers, rows) = parse_rows(data)?;
    tracing::debug!(
        "Parsed {} rows with {} columns",
        rows.len(),
        headers.len()
    );

    check_required_columns(&headers, &config.required_columns)?;

    let coverage = column_coverage(&headers, config);
    let mut groups: Vec<CompanyGroup> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();
    let mut rejected = Vec::new();
    let rows_read = rows.len();

    for (i, row) in rows.into_iter().enumerate() {
        let row_index = i + 1;

        if let Some(field) = first_missing_field(&row, &config.required_columns) {
            tracing::debug!("Row {} rejected: '{}' is empty", row_index, field);
            rejected.push(RejectedRow {
                row_index,
                reason: format!("missing required field '{}'", field),
                field: field.to_string(),
            });
            continue;
        }

        // 必填檢查已保證分組欄位存在且非空
        let display_key = row.get(&config.group_by).unwrap_or_default().trim().to_string();
        let lookup_key = group_key(&display_key, config.key_mode);

        match index_by_key.get(&lookup_key) {
            Some(&idx) => groups[idx].rows.push(row),
            None => {
                index_by_key.insert(lookup_key, groups.len());
                groups.push(CompanyGroup {
                    key: display_key,
                    rows: vec![row],
                });
            }
        }
    }

    let rows_rejected = rejected.len();
    let summary = ConversionSummary {
        rows_read,
        rows_grouped: rows_read - rows_rejected,
        rows_rejected,
        companies: groups.len(),
    };

    if rows_rejected > 0 {
        tracing::warn!("⚠️ {} of {} rows skipped", rows_rejected, rows_read);
    }
    tracing::info!(
        "🔄 Grouped {} rows into {} companies",
        summary.rows_grouped,
        summary.companies
    );

    Ok(ConversionResult {
        group_column: config.group_by.clone(),
        shape: config.output_shape,
        groups,
        rejected,
        summary,
        coverage,
    })
}

/// 解析表頭與資料列；空檔、重複欄名、欄數不一致或沒有資料列都視為格式錯誤
fn parse_rows(data: &[u8]) -> Result<(Vec<String>, Vec<Row>)> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::parse(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(AppError::parse("file has no header row"));
    }

    let mut seen = HashSet::new();
    for header in &headers {
        if !seen.insert(header.as_str()) {
            return Err(AppError::parse(format!("duplicate column '{}'", header)));
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::parse(e.to_string()))?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect(),
        );
    }

    if rows.is_empty() {
        return Err(AppError::parse("file contains no data rows"));
    }

    Ok((headers, rows))
}

fn check_required_columns(headers: &[String], required: &[String]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.contains(*col))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::SchemaError { missing })
    }
}

fn first_missing_field<'a>(row: &Row, required: &'a [String]) -> Option<&'a str> {
    required
        .iter()
        .find(|col| row.get(col).map_or(true, |v| v.trim().is_empty()))
        .map(String::as_str)
}

fn group_key(trimmed: &str, mode: KeyMode) -> String {
    match mode {
        KeyMode::Exact => trimmed.to_string(),
        KeyMode::Normalized => trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    }
}

fn column_coverage(headers: &[String], config: &CsvConfig) -> ColumnCoverage {
    let available = |columns: &[String]| -> Vec<String> {
        columns
            .iter()
            .filter(|c| headers.contains(*c))
            .cloned()
            .collect()
    };

    ColumnCoverage {
        company_available: available(&config.company_columns),
        company_total: config.company_columns.len(),
        person_available: available(&config.person_columns),
        person_total: config.person_columns.len(),
    }
}

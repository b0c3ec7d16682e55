use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// 上傳表格中的一列：欄位名稱 → 字串值，保留表頭順序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 轉成 JSON 物件；`omit` 指定的欄位不輸出
    pub fn to_object(&self, omit: Option<&str>) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(name, _)| Some(name.as_str()) != omit)
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect()
    }

    /// 只取 `columns` 中列出的欄位，依 `columns` 的順序
    pub fn project(&self, columns: &[String]) -> Map<String, Value> {
        columns
            .iter()
            .filter_map(|col| {
                self.get(col)
                    .map(|value| (col.clone(), Value::String(value.to_string())))
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 同一公司的所有聯絡人列，依輸入順序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyGroup {
    pub key: String,
    pub rows: Vec<Row>,
}

/// 被略過的資料列；`row_index` 從 1 起算，不含表頭
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub row_index: usize,
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub rows_read: usize,
    pub rows_grouped: usize,
    pub rows_rejected: usize,
    pub companies: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCoverage {
    pub company_available: Vec<String>,
    pub company_total: usize,
    pub person_available: Vec<String>,
    pub person_total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum KeyMode {
    /// 去除前後空白後精確比對
    #[default]
    Exact,
    /// 另外忽略大小寫並壓縮內部空白
    Normalized,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputShape {
    #[default]
    Flat,
    CompanyPeople,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub group_column: String,
    pub shape: OutputShape,
    pub groups: Vec<CompanyGroup>,
    pub rejected: Vec<RejectedRow>,
    pub summary: ConversionSummary,
    pub coverage: ColumnCoverage,
}

impl ConversionResult {
    /// 主輸出：公司名稱 → 聯絡人陣列（或 company/people 陣列）
    pub fn groups_document(&self) -> Value {
        match self.shape {
            OutputShape::Flat => {
                let mut doc = Map::new();
                for group in &self.groups {
                    let contacts = group
                        .rows
                        .iter()
                        .map(|row| Value::Object(row.to_object(Some(&self.group_column))))
                        .collect();
                    doc.insert(group.key.clone(), Value::Array(contacts));
                }
                Value::Object(doc)
            }
            OutputShape::CompanyPeople => Value::Array(
                self.groups
                    .iter()
                    .map(|group| {
                        let company = group
                            .rows
                            .first()
                            .map(|row| row.project(&self.coverage.company_available))
                            .unwrap_or_default();
                        let people = group
                            .rows
                            .iter()
                            .map(|row| Value::Object(row.project(&self.coverage.person_available)))
                            .collect();
                        let mut entry = Map::new();
                        entry.insert("company".to_string(), Value::Object(company));
                        entry.insert("people".to_string(), Value::Array(people));
                        Value::Object(entry)
                    })
                    .collect(),
            ),
        }
    }

    pub fn report_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert(
            "rejected".to_string(),
            serde_json::to_value(&self.rejected).unwrap_or(Value::Array(Vec::new())),
        );
        doc.insert(
            "summary".to_string(),
            serde_json::to_value(self.summary).unwrap_or(Value::Null),
        );
        Value::Object(doc)
    }

    /// 每家公司的筆數，依筆數遞減；同筆數保持首次出現順序
    pub fn distribution(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .groups
            .iter()
            .map(|g| (g.key.clone(), g.rows.len()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    pub fn company_names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.key.as_str()).collect()
    }
}

/// 遠端 API 的成功回應；`data` 保持原樣
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub endpoint: String,
    pub status: u16,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_error: Option<String>,
}

impl ApiResponse {
    /// 第一個非空的訊息文字
    pub fn content(&self) -> Option<&str> {
        self.data
            .get("outputs")?
            .as_array()?
            .iter()
            .filter_map(|output| output.get("outputs").and_then(Value::as_array))
            .flatten()
            .filter_map(|item| item.get("messages").and_then(Value::as_array))
            .flatten()
            .filter_map(|msg| msg.get("message").and_then(Value::as_str))
            .find(|text| !text.is_empty())
    }

    /// 有處理後結果時優先顯示
    pub fn display_value(&self) -> &Value {
        self.processed.as_ref().unwrap_or(&self.data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "CSV to JSON Converter", alias = "convert", alias = "csv")]
    CsvConverter,
    #[serde(rename = "Lead Enrichment", alias = "enrich", alias = "enrichment")]
    LeadEnrichment,
    #[serde(rename = "ICP Profiling", alias = "icp")]
    IcpProfiling,
    #[serde(rename = "Market Intelligence", alias = "market")]
    MarketIntelligence,
    #[serde(rename = "Champion Scoring", alias = "champion")]
    ChampionScoring,
    #[serde(rename = "Engagement Signal", alias = "engagement")]
    EngagementSignal,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::CsvConverter,
        Section::LeadEnrichment,
        Section::IcpProfiling,
        Section::MarketIntelligence,
        Section::ChampionScoring,
        Section::EngagementSignal,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::CsvConverter => "CSV to JSON Converter",
            Section::LeadEnrichment => "Lead Enrichment",
            Section::IcpProfiling => "ICP Profiling",
            Section::MarketIntelligence => "Market Intelligence",
            Section::ChampionScoring => "Champion Scoring",
            Section::EngagementSignal => "Engagement Signal",
        }
    }

    /// 短指令名稱
    pub fn command(&self) -> &'static str {
        match self {
            Section::CsvConverter => "convert",
            Section::LeadEnrichment => "enrich",
            Section::IcpProfiling => "icp",
            Section::MarketIntelligence => "market",
            Section::ChampionScoring => "champion",
            Section::EngagementSignal => "engagement",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim();
        Section::ALL
            .into_iter()
            .find(|section| {
                section.title().eq_ignore_ascii_case(needle)
                    || section.command().eq_ignore_ascii_case(needle)
            })
            .or(match needle.to_ascii_lowercase().as_str() {
                "csv" => Some(Section::CsvConverter),
                "enrichment" => Some(Section::LeadEnrichment),
                _ => None,
            })
            .ok_or_else(|| format!("unknown section: {}", s))
    }
}

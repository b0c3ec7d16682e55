#[cfg(feature = "cli")]
pub mod cli;
pub mod endpoints;

use crate::domain::model::{KeyMode, OutputShape, Section};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_API_BASE_URL: &str = "https://flow.agenthive.tech/api/v1/run";
pub const DEFAULT_API_KEY_ENV: &str = "AGENT_HIVE_API_KEY";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const MAX_TIMEOUT_SECONDS: u64 = 600;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppInfo,
    pub navigation: NavigationConfig,
    pub csv: CsvConfig,
    pub messages: Messages,
    pub api: ApiConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub title: String,
    pub version: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            title: "SDR Agent".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub sections: Vec<Section>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            sections: Section::ALL.to_vec(),
        }
    }
}

/// CSV 欄位契約與輸出形狀
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    pub company_columns: Vec<String>,
    pub person_columns: Vec<String>,
    pub required_columns: Vec<String>,
    pub group_by: String,
    pub key_mode: KeyMode,
    pub output_shape: OutputShape,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            company_columns: strings(&[
                "Company Name",
                "Company Domain",
                "Company Website",
                "Company Employee Count",
                "Company Employee Count Range",
                "Company Founded",
                "Company Industry",
                "Company Type",
                "Company Headquarters",
                "Company Revenue Range",
                "Company Linkedin Url",
                "Company Crunchbase Url",
                "Company Funding Rounds",
                "Company Last Funding Round Amount",
            ]),
            person_columns: strings(&[
                "Name",
                "First name",
                "Last name",
                "Email",
                "Mobile Number",
                "Company Phone",
                "Title",
                "Linkedin",
                "Location",
            ]),
            required_columns: strings(&[
                "Company Name",
                "Company Domain",
                "Name",
                "Email",
                "Linkedin",
            ]),
            group_by: "Company Name".to_string(),
            key_mode: KeyMode::Exact,
            output_shape: OutputShape::Flat,
        }
    }
}

impl CsvConfig {
    /// 最小設定：只指定必填欄位與分組欄位
    pub fn with_required(required: &[&str], group_by: &str) -> Self {
        Self {
            company_columns: vec![group_by.to_string()],
            person_columns: required
                .iter()
                .filter(|c| **c != group_by)
                .map(|c| c.to_string())
                .collect(),
            required_columns: strings(required),
            group_by: group_by.to_string(),
            ..Self::default()
        }
    }
}

/// 介面文字，`{}` 為參數位置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub csv_success: String,
    pub csv_error: String,
    pub csv_upload_prompt: String,
    pub processing_complete: String,
    pub missing_required: String,
    pub format_hint: String,
    pub rows_rejected: String,
    pub workflow_saved: String,
    pub workflow_cleared: String,
    pub no_workflow_data: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            csv_success: "✅ CSV file loaded successfully! ({} rows)".to_string(),
            csv_error: "❌ Error processing file: {}".to_string(),
            csv_upload_prompt: "👆 Please provide a CSV file to get started".to_string(),
            processing_complete: "✅ Processing complete! Total companies processed: {}"
                .to_string(),
            missing_required: "❌ '{}' column is required but not found in the CSV!".to_string(),
            format_hint: "💡 Please make sure your CSV file is properly formatted and contains the required columns.".to_string(),
            rows_rejected: "⚠️ {} rows skipped because of missing required fields".to_string(),
            workflow_saved: "✅ Data saved to workflow! You can now access it from other sections."
                .to_string(),
            workflow_cleared: "Data cleared!".to_string(),
            no_workflow_data: "No data saved yet".to_string(),
        }
    }
}

impl Messages {
    pub fn format(template: &str, arg: impl std::fmt::Display) -> String {
        template.replacen("{}", &arg.to_string(), 1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `x-api-key: <key>`
    #[default]
    ApiKey,
    /// `Authorization: Bearer <key>`
    Bearer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// 設定檔中直接給定（可用 `${VAR}`），否則讀 `api_key_env`
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub auth_scheme: AuthScheme,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            auth_scheme: AuthScheme::ApiKey,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl ApiConfig {
    /// 取得 API 金鑰；缺少時回傳 ConfigError
    pub fn resolve_api_key(&self) -> Result<String> {
        let from_file = self
            .api_key
            .as_ref()
            .filter(|key| !key.trim().is_empty() && !key.contains("${"));
        if let Some(key) = from_file {
            return Ok(key.clone());
        }

        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(AppError::config(format!(
                "API key not found: set {} or api.api_key",
                self.api_key_env
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    pub filename: String,
    pub report_filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./output".to_string(),
            filename: "converted_data.json".to_string(),
            report_filename: "conversion_report.json".to_string(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| AppError::config(format!("TOML parsing error: {}", e)))
    }

    /// 有指定檔案就讀檔，否則使用內建預設值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 替換環境變數 (例如 ${AGENT_HIVE_API_KEY})；找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| AppError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_non_empty_string("api.api_key_env", &self.api.api_key_env)?;
        validation::validate_range(
            "api.timeout_seconds",
            self.api.timeout_seconds,
            1,
            MAX_TIMEOUT_SECONDS,
        )?;

        validation::validate_non_empty_string("csv.group_by", &self.csv.group_by)?;
        if self.csv.required_columns.is_empty() {
            return Err(AppError::InvalidConfigValueError {
                field: "csv.required_columns".to_string(),
                value: String::new(),
                reason: "At least one required column must be configured".to_string(),
            });
        }
        validation::validate_unique_names("csv.required_columns", &self.csv.required_columns)?;
        if !self.csv.required_columns.contains(&self.csv.group_by) {
            return Err(AppError::InvalidConfigValueError {
                field: "csv.group_by".to_string(),
                value: self.csv.group_by.clone(),
                reason: "Grouping column must be one of csv.required_columns".to_string(),
            });
        }

        validation::validate_path("output.directory", &self.output.directory)?;
        validation::validate_non_empty_string("output.filename", &self.output.filename)?;
        validation::validate_non_empty_string(
            "output.report_filename",
            &self.output.report_filename,
        )?;

        if self.navigation.sections.is_empty() {
            return Err(AppError::InvalidConfigValueError {
                field: "navigation.sections".to_string(),
                value: String::new(),
                reason: "At least one section must be enabled".to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

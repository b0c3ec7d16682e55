//! 指令路由：一行指令 → 對應區段的 handler → 呈現用文字。
//!
//! Session 由呼叫端持有，每次 `dispatch` 以 `&mut` 傳入；一個指令執行完畢
//! 才會處理下一個。

use crate::adapters::http::AgentHiveClient;
use crate::adapters::storage::LocalStorage;
use crate::app::render::{render, RenderFormat};
use crate::config::endpoints::Endpoint;
use crate::config::{AppConfig, Messages};
use crate::core::batch::{self, BatchPass};
use crate::core::converter::convert;
use crate::core::session::SessionState;
use crate::core::{playground, Storage};
use crate::domain::model::{ConversionResult, Section};
use crate::utils::error::{AppError, Result};
use std::fmt::Write;
use std::path::PathBuf;
use std::str::FromStr;

const DISTRIBUTION_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Convert { path: Option<PathBuf> },
    /// 輸入可以是 JSON、純文字，或 `@檔案`
    Call { endpoint: Endpoint, input: String },
    /// 對 workflow 的第 `start..=end` 筆逐一呼叫端點
    Batch {
        pass: BatchPass,
        start: usize,
        end: usize,
        reanalyze: bool,
    },
    Status,
    Companies,
    Show { key: String },
    Export { path: Option<PathBuf> },
    Clear,
    Sections,
    Help,
    Quit,
}

impl Command {
    pub fn section(&self) -> Option<Section> {
        match self {
            Command::Convert { .. } => Some(Section::CsvConverter),
            Command::Call { endpoint, .. } => Some(endpoint.section()),
            Command::Batch { pass, .. } => Some(pass.endpoint().section()),
            _ => None,
        }
    }
}

impl FromStr for Command {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));
        let optional_path = || (!rest.is_empty()).then(|| PathBuf::from(rest));

        let command = match word.to_ascii_lowercase().as_str() {
            "convert" | "csv" => Command::Convert {
                path: optional_path(),
            },
            "batch" => parse_batch(rest)?,
            "status" => Command::Status,
            "companies" => Command::Companies,
            "show" if !rest.is_empty() => Command::Show {
                key: rest.to_string(),
            },
            "export" => Command::Export {
                path: optional_path(),
            },
            "clear" => Command::Clear,
            "sections" => Command::Sections,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => match other.parse::<Section>().ok().and_then(Endpoint::from_section) {
                Some(endpoint) => Command::Call {
                    endpoint,
                    input: rest.to_string(),
                },
                None => {
                    return Err(AppError::UnknownCommand {
                        input: line.to_string(),
                    })
                }
            },
        };
        Ok(command)
    }
}

const BATCH_USAGE: &str = "batch <enrich|icp|market> <start> <end> [--reanalyze]";

fn parse_batch(rest: &str) -> Result<Command> {
    let usage = || AppError::validation("batch", format!("Usage: {}", BATCH_USAGE));
    let mut reanalyze = false;
    let mut words = Vec::new();
    for word in rest.split_whitespace() {
        match word {
            "--reanalyze" | "--re-analyze" => reanalyze = true,
            other => words.push(other),
        }
    }
    let [pass, start, end] = words.as_slice() else {
        return Err(usage());
    };
    Ok(Command::Batch {
        pass: pass.parse()?,
        start: start.parse().map_err(|_| usage())?,
        end: end.parse().map_err(|_| usage())?,
        reanalyze,
    })
}

pub struct Router {
    config: AppConfig,
    client: Option<AgentHiveClient>,
    format: RenderFormat,
}

impl Router {
    pub fn new(config: AppConfig) -> Self {
        let client = match AgentHiveClient::from_config(&config.api) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::debug!("API client not configured: {}", e);
                None
            }
        };
        Self {
            config,
            client,
            format: RenderFormat::default(),
        }
    }

    pub fn with_client(mut self, client: AgentHiveClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_format(mut self, format: RenderFormat) -> Self {
        self.format = format;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 解析並執行一行指令
    pub async fn dispatch_line(&self, line: &str, session: &mut SessionState) -> Result<String> {
        let command: Command = line.parse()?;
        self.dispatch(command, session).await
    }

    pub async fn dispatch(&self, command: Command, session: &mut SessionState) -> Result<String> {
        if let Some(section) = command.section() {
            if !self.config.navigation.sections.contains(&section) {
                return Err(AppError::validation(
                    "section",
                    format!("'{}' is not enabled in navigation.sections", section),
                ));
            }
        }

        tracing::debug!("Dispatching {:?}", command);
        match command {
            Command::Convert { path } => self.convert_file(path, session),
            Command::Call { endpoint, input } => self.call_endpoint(endpoint, &input, session).await,
            Command::Batch {
                pass,
                start,
                end,
                reanalyze,
            } => self.batch(pass, start, end, reanalyze, session).await,
            Command::Status => Ok(self.status(session)),
            Command::Companies => Ok(self.companies(session)),
            Command::Show { key } => self.show(&key, session),
            Command::Export { path } => self.export(path, session).await,
            Command::Clear => {
                session.clear();
                Ok(self.config.messages.workflow_cleared.clone())
            }
            Command::Sections => Ok(self.sections()),
            Command::Help => Ok(self.help()),
            Command::Quit => Ok("👋 Goodbye".to_string()),
        }
    }

    /// 把錯誤轉成介面文字；CSV 相關錯誤使用設定檔中的訊息
    pub fn error_text(&self, err: &AppError) -> String {
        let messages = &self.config.messages;
        match err {
            AppError::SchemaError { missing } => {
                let mut out: Vec<String> = missing
                    .iter()
                    .map(|col| Messages::format(&messages.missing_required, col))
                    .collect();
                out.push(messages.format_hint.clone());
                out.join("\n")
            }
            AppError::ParseError { message } => format!(
                "{}\n{}",
                Messages::format(&messages.csv_error, message),
                messages.format_hint
            ),
            other => format!(
                "❌ {}\n💡 {}",
                other.user_friendly_message(),
                other.recovery_suggestion()
            ),
        }
    }

    fn convert_file(&self, path: Option<PathBuf>, session: &mut SessionState) -> Result<String> {
        let Some(path) = path else {
            return Ok(self.config.messages.csv_upload_prompt.clone());
        };

        let data = std::fs::read(&path)?;
        let result = convert(&data, &self.config.csv)?;
        session.store_conversion(&result);
        session.save_workflow(&result, Section::CsvConverter.title());

        Ok(self.conversion_text(&result))
    }

    fn conversion_text(&self, result: &ConversionResult) -> String {
        let messages = &self.config.messages;
        let coverage = &result.coverage;
        let mut out = String::new();

        let _ = writeln!(out, "{}", Messages::format(&messages.csv_success, result.summary.rows_read));
        let _ = writeln!(
            out,
            "🏢 Company columns: {}/{}  👤 Person columns: {}/{}",
            coverage.company_available.len(),
            coverage.company_total,
            coverage.person_available.len(),
            coverage.person_total
        );

        if !result.rejected.is_empty() {
            let _ = writeln!(out, "{}", Messages::format(&messages.rows_rejected, result.rejected.len()));
            for row in &result.rejected {
                let _ = writeln!(out, "  row {}: {}", row.row_index, row.reason);
            }
        }

        let _ = writeln!(out, "{}", Messages::format(&messages.processing_complete, result.summary.companies));
        let distribution = result.distribution();
        for (company, count) in distribution.iter().take(DISTRIBUTION_LIMIT) {
            let _ = writeln!(out, "  {}: {}", company, count);
        }
        if distribution.len() > DISTRIBUTION_LIMIT {
            let _ = writeln!(out, "  ... and {} more", distribution.len() - DISTRIBUTION_LIMIT);
        }

        out.push_str(&messages.workflow_saved);
        out
    }

    async fn call_endpoint(
        &self,
        endpoint: Endpoint,
        input: &str,
        session: &mut SessionState,
    ) -> Result<String> {
        let spec = endpoint.spec();
        if input.trim().is_empty() {
            return Ok(format!(
                "{}: {}\n\nSample input:\n{}",
                spec.title,
                spec.description,
                serde_json::to_string_pretty(&spec.sample())?
            ));
        }

        let raw = match input.trim().strip_prefix('@') {
            Some(path) => std::fs::read_to_string(path.trim())?,
            None => input.to_string(),
        };

        let form = playground::parse_form(spec, &raw)?;
        let response = playground::call(&self.client()?, endpoint, &form).await?;
        session.store_response(&response, endpoint)?;

        let mut out = render(response.display_value(), spec.title, self.format)?;
        if let Some(err) = &response.processing_error {
            let _ = write!(out, "\n⚠️ {} (showing raw response)", err);
        }
        Ok(out)
    }

    fn client(&self) -> Result<AgentHiveClient> {
        match &self.client {
            Some(client) => Ok(client.clone()),
            None => AgentHiveClient::from_config(&self.config.api),
        }
    }

    async fn batch(
        &self,
        pass: BatchPass,
        start: usize,
        end: usize,
        reanalyze: bool,
        session: &mut SessionState,
    ) -> Result<String> {
        if session.workflow_data().is_none() {
            return Ok(self.config.messages.no_workflow_data.clone());
        }

        let client = self.client()?;
        let summary = batch::run_batch(&client, session, pass, start, end, reanalyze).await?;
        Ok(format!(
            "📊 {}: {} rows processed\n✅ {} successful  ❌ {} failed  ⏭️ {} skipped",
            pass.endpoint().spec().title,
            summary.processed,
            summary.successful,
            summary.failed,
            summary.skipped
        ))
    }

    fn status(&self, session: &SessionState) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} v{}", self.config.app.title, self.config.app.version);
        match session.workflow_metadata() {
            Some(meta) => {
                let _ = writeln!(
                    out,
                    "📊 Workflow: {} companies, {} records from {} (saved {})",
                    meta.total_companies,
                    meta.total_records,
                    meta.source,
                    meta.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            None => {
                let _ = writeln!(out, "{}", self.config.messages.no_workflow_data);
            }
        }
        let _ = write!(out, "Session keys: {}", session.keys().join(", "));
        out
    }

    fn companies(&self, session: &SessionState) -> String {
        let companies = session.companies();
        if companies.is_empty() {
            return self.config.messages.no_workflow_data.clone();
        }
        companies
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{}. {}", i + 1, name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 先找公司名稱，再找 session key
    fn show(&self, key: &str, session: &SessionState) -> Result<String> {
        if let Some(company) = session.company(key) {
            return render(&company, key, self.format);
        }
        match session.get_ref(key) {
            Some(value) => render(value, key, self.format),
            None => Err(AppError::validation(key, "No company or session value with this name")),
        }
    }

    async fn export(&self, path: Option<PathBuf>, session: &SessionState) -> Result<String> {
        let Some(json) = session.export_workflow()? else {
            return Ok(self.config.messages.no_workflow_data.clone());
        };

        let written = match path {
            Some(path) => {
                std::fs::write(&path, json.as_bytes())?;
                path
            }
            None => {
                let storage = LocalStorage::new(&self.config.output.directory);
                storage
                    .write_file(&self.config.output.filename, json.as_bytes())
                    .await?;
                storage.full_path(&self.config.output.filename)
            }
        };

        tracing::info!("📁 Workflow exported to {}", written.display());
        Ok(format!("📁 Workflow exported to {}", written.display()))
    }

    fn sections(&self) -> String {
        self.config
            .navigation
            .sections
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {} ({})", i + 1, s.title(), s.command()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn help(&self) -> String {
        let mut out = String::from("Commands:\n");
        for section in &self.config.navigation.sections {
            let usage = match section {
                Section::CsvConverter => "convert <file.csv>".to_string(),
                other => format!("{} <json | text | @file>", other.command()),
            };
            let _ = writeln!(out, "  {:<52} {}", usage, section.title());
        }
        for (usage, about) in [
            (BATCH_USAGE, "Run a section over saved workflow rows"),
            ("status", "Show workflow and session state"),
            ("companies", "List companies in the saved workflow"),
            ("show <company | key>", "Show one company or session value"),
            ("export [file]", "Write the saved workflow as JSON"),
            ("clear", "Clear all session data"),
            ("sections", "List enabled sections"),
            ("help", "Show this help"),
            ("quit", "Leave the shell"),
        ] {
            let _ = writeln!(out, "  {:<52} {}", usage, about);
        }
        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CsvConfig;
    use serde_json::json;
    use tempfile::TempDir;

    fn router() -> Router {
        let mut config = AppConfig::default();
        config.csv = CsvConfig::with_required(&["company", "name"], "company");
        Router::new(config)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "convert leads.csv".parse::<Command>().unwrap(),
            Command::Convert {
                path: Some(PathBuf::from("leads.csv"))
            }
        );
        assert_eq!(
            "ICP {\"domain\": \"a.com\"}".parse::<Command>().unwrap(),
            Command::Call {
                endpoint: Endpoint::IcpProfiling,
                input: "{\"domain\": \"a.com\"}".to_string()
            }
        );
        assert_eq!(
            "engagement".parse::<Command>().unwrap(),
            Command::Call {
                endpoint: Endpoint::EngagementSignal,
                input: String::new()
            }
        );
        assert_eq!("export".parse::<Command>().unwrap(), Command::Export { path: None });
        assert_eq!("  quit ".parse::<Command>().unwrap(), Command::Quit);
        assert!(matches!(
            "dance now".parse::<Command>(),
            Err(AppError::UnknownCommand { .. })
        ));
        assert!("show".parse::<Command>().is_err());
    }

    #[test]
    fn test_parse_batch_command() {
        assert_eq!(
            "batch icp 0 4 --reanalyze".parse::<Command>().unwrap(),
            Command::Batch {
                pass: BatchPass::Icp,
                start: 0,
                end: 4,
                reanalyze: true
            }
        );
        assert_eq!(
            "batch enrich 2 3".parse::<Command>().unwrap().section(),
            Some(Section::LeadEnrichment)
        );
        assert!("batch market 1".parse::<Command>().is_err());
        assert!("batch market one 2".parse::<Command>().is_err());
        assert!("batch champion 0 1".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn test_batch_without_workflow_reports_no_data() {
        let router = router();
        let out = router
            .dispatch_line("batch enrich 0 1", &mut SessionState::new())
            .await
            .unwrap();
        assert_eq!(out, router.config().messages.no_workflow_data);
    }

    #[tokio::test]
    async fn test_convert_saves_workflow() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("leads.csv");
        std::fs::write(&file, "company,name\nAcme,Jo\nAcme,Ann\n,Sam\n").unwrap();

        let router = router();
        let mut session = SessionState::new();
        let out = router
            .dispatch_line(&format!("convert {}", file.display()), &mut session)
            .await
            .unwrap();

        assert!(out.contains("(3 rows)"));
        assert!(out.contains("row 3: missing required field 'company'"));
        assert!(out.contains("Total companies processed: 1"));
        assert_eq!(session.companies(), vec!["Acme"]);

        let shown = router.dispatch_line("show Acme", &mut session).await.unwrap();
        assert!(shown.contains("\"Ann\""));
    }

    #[tokio::test]
    async fn test_convert_without_file_prompts() {
        let router = router();
        let out = router
            .dispatch(Command::Convert { path: None }, &mut SessionState::new())
            .await
            .unwrap();
        assert_eq!(out, router.config().messages.csv_upload_prompt);
    }

    #[tokio::test]
    async fn test_workflow_commands_without_data() {
        let router = router();
        let mut session = SessionState::new();
        let no_data = router.config().messages.no_workflow_data.clone();

        assert_eq!(router.dispatch(Command::Companies, &mut session).await.unwrap(), no_data);
        assert_eq!(
            router.dispatch(Command::Export { path: None }, &mut session).await.unwrap(),
            no_data
        );
        assert!(router.dispatch(Command::Status, &mut session).await.unwrap().contains(&no_data));
    }

    #[tokio::test]
    async fn test_export_and_clear() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("leads.csv");
        std::fs::write(&file, "company,name\nAcme,Jo\n").unwrap();
        let target = dir.path().join("workflow.json");

        let router = router();
        let mut session = SessionState::new();
        router
            .dispatch(Command::Convert { path: Some(file) }, &mut session)
            .await
            .unwrap();
        router
            .dispatch(Command::Export { path: Some(target.clone()) }, &mut session)
            .await
            .unwrap();

        let exported: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(exported, json!({"Acme": [{"name": "Jo"}]}));

        router.dispatch(Command::Clear, &mut session).await.unwrap();
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_section_is_rejected() {
        let mut config = AppConfig::default();
        config.navigation.sections = vec![Section::CsvConverter];
        let router = Router::new(config);

        let err = router
            .dispatch_line("market {\"Company\": \"Acme\"}", &mut SessionState::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError { .. }));
        assert!(!router.sections().contains("Market"));
    }

    #[tokio::test]
    async fn test_endpoint_without_input_shows_sample() {
        let out = router()
            .dispatch_line("champion", &mut SessionState::new())
            .await
            .unwrap();
        assert!(out.starts_with("Champion Scoring API"));
        assert!(out.contains("linkedin_url"));
    }

    #[test]
    fn test_error_text_uses_messages() {
        let router = router();
        let text = router.error_text(&AppError::SchemaError {
            missing: vec!["Email".to_string()],
        });
        assert!(text.contains("'Email' column is required but not found in the CSV!"));
        assert!(text.contains("properly formatted"));

        let text = router.error_text(&AppError::parse("file contains no data rows"));
        assert!(text.starts_with("❌ Error processing file: "));
    }
}

use crate::config::{ApiConfig, AuthScheme};
use crate::utils::error::{AppError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const ERROR_BODY_LIMIT: usize = 500;

/// Agent Hive flow API 的薄包裝：一次 POST，不重試
#[derive(Debug, Clone)]
pub struct AgentHiveClient {
    client: Client,
    base_url: String,
    api_key: String,
    auth_scheme: AuthScheme,
    default_timeout: Duration,
}

impl AgentHiveClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        auth_scheme: AuthScheme,
        default_timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            auth_scheme,
            default_timeout,
        }
    }

    /// 金鑰缺少時回傳 ConfigError
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        let api_key = api.resolve_api_key()?;
        Ok(Self::new(
            api.base_url.clone(),
            api_key,
            api.auth_scheme,
            Duration::from_secs(api.timeout_seconds),
        ))
    }

    pub fn flow_url(&self, flow: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            flow.trim_start_matches('/')
        )
    }

    /// 送出請求並回傳 (狀態碼, 回應 JSON)；非 2xx 或逾時都轉成 ApiError
    pub async fn run_flow(
        &self,
        flow: &str,
        payload: &Value,
        timeout: Option<Duration>,
    ) -> Result<(u16, Value)> {
        let url = self.flow_url(flow);
        let timeout = timeout.unwrap_or(self.default_timeout);

        let mut request = self.client.post(&url).json(payload).timeout(timeout);
        request = match self.auth_scheme {
            AuthScheme::ApiKey => request.header("x-api-key", &self.api_key),
            AuthScheme::Bearer => request.bearer_auth(&self.api_key),
        };

        tracing::debug!("📡 POST {} (timeout {:?})", url, timeout);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::api(
                    None,
                    format!("request timed out after {:?}", timeout),
                )
            } else {
                AppError::api(None, format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        tracing::debug!("📡 {} responded with {}", flow, status);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::api(
                    Some(status.as_u16()),
                    format!("response body timed out after {:?}", timeout),
                )
            } else {
                AppError::api(Some(status.as_u16()), format!("failed to read response: {}", e))
            }
        })?;

        if !status.is_success() {
            let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            tracing::error!("❌ {}: API request failed with status {}", flow, status);
            return Err(AppError::api(
                Some(status.as_u16()),
                if excerpt.is_empty() {
                    format!("API request failed with status {}", status.as_u16())
                } else {
                    format!(
                        "API request failed with status {}: {}",
                        status.as_u16(),
                        excerpt
                    )
                },
            ));
        }

        let data: Value = serde_json::from_str(&body).map_err(|e| {
            AppError::api(
                Some(status.as_u16()),
                format!("response is not valid JSON: {}", e),
            )
        })?;

        Ok((status.as_u16(), data))
    }
}

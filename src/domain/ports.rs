use crate::domain::model::ConversionResult;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 讀取 → 轉換 → 輸出；只有 `transform` 不碰 I/O
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<u8>>;
    async fn transform(&self, data: Vec<u8>) -> Result<ConversionResult>;
    async fn load(&self, result: &ConversionResult) -> Result<String>;
}

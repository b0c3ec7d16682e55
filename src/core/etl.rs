use crate::core::Pipeline;
use crate::domain::model::ConversionResult;
use crate::utils::error::Result;

/// 執行一次完整的 CSV 轉換流程
pub struct ConversionEngine<P: Pipeline> {
    pipeline: P,
}

/// 一次執行的結果：輸出位置與轉換結果本身
#[derive(Debug)]
pub struct ConversionRun {
    pub output_path: String,
    pub result: ConversionResult,
}

impl<P: Pipeline> ConversionEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<ConversionRun> {
        tracing::info!("Starting CSV conversion...");

        // Extract
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("📥 Read {} bytes", raw_data.len());

        // Transform
        let result = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "🔄 {} rows read, {} grouped, {} rejected",
            result.summary.rows_read,
            result.summary.rows_grouped,
            result.summary.rows_rejected
        );

        // Load
        let output_path = self.pipeline.load(&result).await?;
        tracing::info!("📁 Output saved to: {}", output_path);

        Ok(ConversionRun {
            output_path,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CsvConfig;
    use crate::core::converter::convert;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct InMemoryPipeline {
        input: &'static str,
        loaded: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl Pipeline for InMemoryPipeline {
        async fn extract(&self) -> Result<Vec<u8>> {
            Ok(self.input.as_bytes().to_vec())
        }

        async fn transform(&self, data: Vec<u8>) -> Result<ConversionResult> {
            convert(&data, &CsvConfig::with_required(&["company", "name"], "company"))
        }

        async fn load(&self, result: &ConversionResult) -> Result<String> {
            *self.loaded.lock().unwrap() = Some(result.summary.companies);
            Ok("memory://out.json".to_string())
        }
    }

    #[tokio::test]
    async fn test_engine_runs_all_stages() {
        let pipeline = InMemoryPipeline {
            input: "company,name\nAcme,Jo\nBeta,Sam\n",
            loaded: Mutex::new(None),
        };
        let engine = ConversionEngine::new(pipeline);
        let run = engine.run().await.unwrap();

        assert_eq!(run.output_path, "memory://out.json");
        assert_eq!(run.result.summary.companies, 2);
        assert_eq!(*engine.pipeline.loaded.lock().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_engine_stops_on_transform_error() {
        let pipeline = InMemoryPipeline {
            input: "company\nAcme\n",
            loaded: Mutex::new(None),
        };
        let engine = ConversionEngine::new(pipeline);

        assert!(engine.run().await.is_err());
        assert!(engine.pipeline.loaded.lock().unwrap().is_none());
    }
}

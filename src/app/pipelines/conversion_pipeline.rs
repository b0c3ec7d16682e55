use crate::config::{CsvConfig, OutputConfig};
use crate::core::converter::convert;
use crate::core::{ConversionResult, Pipeline, Storage};
use crate::utils::error::Result;

/// 從 `source` 讀取 CSV，轉換後把分組結果與報告寫進輸出 Storage
pub struct ConversionPipeline<R: Storage, S: Storage> {
    pub(crate) source: R,
    pub(crate) input: String,
    pub(crate) storage: S,
    pub(crate) csv: CsvConfig,
    pub(crate) output: OutputConfig,
}

impl<R: Storage, S: Storage> ConversionPipeline<R, S> {
    pub fn new(
        source: R,
        input: impl Into<String>,
        storage: S,
        csv: CsvConfig,
        output: OutputConfig,
    ) -> Self {
        Self {
            source,
            input: input.into(),
            storage,
            csv,
            output,
        }
    }
}

fn pretty_bytes(value: &serde_json::Value) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[async_trait::async_trait]
impl<R: Storage, S: Storage> Pipeline for ConversionPipeline<R, S> {
    async fn extract(&self) -> Result<Vec<u8>> {
        tracing::debug!("Reading CSV from {}", self.input);
        self.source.read_file(&self.input).await
    }

    async fn transform(&self, data: Vec<u8>) -> Result<ConversionResult> {
        convert(&data, &self.csv)
    }

    async fn load(&self, result: &ConversionResult) -> Result<String> {
        let groups = pretty_bytes(&result.groups_document())?;
        let report = pretty_bytes(&result.report_document())?;

        tracing::debug!(
            "Writing {} ({} bytes) and {} ({} bytes)",
            self.output.filename,
            groups.len(),
            self.output.report_filename,
            report.len()
        );
        self.storage.write_file(&self.output.filename, &groups).await?;
        self.storage
            .write_file(&self.output.report_filename, &report)
            .await?;

        Ok(format!(
            "{}/{}",
            self.output.directory.trim_end_matches('/'),
            self.output.filename
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::core::etl::ConversionEngine;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pipeline_writes_both_documents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("leads.csv"), "company,name\nAcme,Jo\n,Ann\n").unwrap();

        let out_dir = dir.path().join("out");
        let output = OutputConfig {
            directory: out_dir.to_string_lossy().to_string(),
            ..OutputConfig::default()
        };
        let pipeline = ConversionPipeline::new(
            LocalStorage::new(dir.path()),
            "leads.csv",
            LocalStorage::new(&out_dir),
            CsvConfig::with_required(&["company", "name"], "company"),
            output,
        );

        let run = ConversionEngine::new(pipeline).run().await.unwrap();
        assert!(run.output_path.ends_with("converted_data.json"));

        let groups: Value =
            serde_json::from_slice(&std::fs::read(out_dir.join("converted_data.json")).unwrap())
                .unwrap();
        assert_eq!(groups, json!({"Acme": [{"name": "Jo"}]}));

        let report: Value = serde_json::from_slice(
            &std::fs::read(out_dir.join("conversion_report.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(report["rejected"][0]["row_index"], json!(2));
        assert_eq!(report["summary"]["rows_rejected"], json!(1));
    }

    /// 只提供 `read_file` 的記憶體 Storage
    struct FixedSource(&'static str);

    impl Storage for FixedSource {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            match path {
                "upload.csv" => Ok(self.0.as_bytes().to_vec()),
                other => Err(crate::utils::error::AppError::validation(other, "unknown file")),
            }
        }

        async fn write_file(&self, _path: &str, _data: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_extract_reads_through_source_storage() {
        let dir = TempDir::new().unwrap();
        let pipeline = ConversionPipeline::new(
            FixedSource("company,name\nAcme,Jo\n"),
            "upload.csv",
            LocalStorage::new(dir.path()),
            CsvConfig::with_required(&["company", "name"], "company"),
            OutputConfig::default(),
        );

        let data = pipeline.extract().await.unwrap();
        assert_eq!(data, b"company,name\nAcme,Jo\n");
        let result = pipeline.transform(data).await.unwrap();
        assert_eq!(result.company_names(), vec!["Acme"]);
    }

    #[tokio::test]
    async fn test_missing_input_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let pipeline = ConversionPipeline::new(
            LocalStorage::new(dir.path()),
            "nope.csv",
            LocalStorage::new(dir.path()),
            CsvConfig::default(),
            OutputConfig::default(),
        );
        assert!(matches!(
            pipeline.extract().await,
            Err(crate::utils::error::AppError::IoError(_))
        ));
    }
}

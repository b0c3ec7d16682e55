use sdr_agent::config::{AuthScheme, DEFAULT_API_KEY_ENV};
use sdr_agent::domain::model::{KeyMode, OutputShape, Section};
use sdr_agent::utils::validation::Validate;
use sdr_agent::AppConfig;
use std::path::Path;

#[test]
fn test_sample_config_loads_and_validates() {
    let config = AppConfig::load(Some(Path::new("configs/sdr-agent.toml"))).unwrap();

    assert_eq!(config.navigation.sections, Section::ALL.to_vec());
    assert_eq!(config.csv.group_by, "Company Name");
    assert_eq!(config.csv.required_columns.len(), 5);
    assert_eq!(config.csv.key_mode, KeyMode::Exact);
    assert_eq!(config.csv.output_shape, OutputShape::Flat);
    assert_eq!(config.api.auth_scheme, AuthScheme::ApiKey);
    assert_eq!(config.api.api_key_env, DEFAULT_API_KEY_ENV);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_config_file_is_io_error() {
    let err = AppConfig::load(Some(Path::new("configs/does-not-exist.toml"))).unwrap_err();
    assert!(matches!(err, sdr_agent::AppError::IoError(_)));
    assert_eq!(err.severity(), sdr_agent::utils::error::ErrorSeverity::Critical);
}

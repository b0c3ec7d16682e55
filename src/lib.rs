pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::{AgentHiveClient, LocalStorage};
pub use app::pipelines::ConversionPipeline;
pub use app::router::{Command, Router};
pub use app::shell::Shell;
pub use config::AppConfig;
pub use core::{etl::ConversionEngine, session::SessionState};
pub use utils::error::{AppError, Result};

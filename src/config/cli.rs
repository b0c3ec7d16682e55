use crate::app::render::RenderFormat;
use crate::config::endpoints::Endpoint;
use crate::config::AppConfig;
use crate::domain::model::{KeyMode, OutputShape};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "sdr-agent")]
#[command(about = "SDR Agent toolkit: group lead CSVs by company and call Agent Hive flows")]
#[command(version)]
pub struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// How API responses are printed
    #[arg(long, value_enum, default_value_t = RenderFormat::Json, global = true)]
    pub format: RenderFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert a CSV file into company-grouped JSON
    Convert(ConvertArgs),
    /// Lead Enrichment flow
    Enrich(CallArgs),
    /// ICP Profiling flow
    Icp(CallArgs),
    /// Market Intelligence flow
    Market(CallArgs),
    /// Champion Scoring flow
    Champion(CallArgs),
    /// Person Engagement Signal flow
    Engagement(CallArgs),
    /// Interactive shell with a shared session
    Shell,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// CSV file to convert
    pub input: PathBuf,

    /// Override output.directory
    #[arg(short, long)]
    pub output_dir: Option<String>,

    #[arg(long, value_enum)]
    pub key_mode: Option<KeyMode>,

    #[arg(long, value_enum)]
    pub shape: Option<OutputShape>,
}

#[derive(Debug, Args)]
pub struct CallArgs {
    /// JSON object, plain text, or @file
    pub input: Option<String>,
}

impl Commands {
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Commands::Enrich(_) => Some(Endpoint::Enrichment),
            Commands::Icp(_) => Some(Endpoint::IcpProfiling),
            Commands::Market(_) => Some(Endpoint::MarketIntelligence),
            Commands::Champion(_) => Some(Endpoint::ChampionScoring),
            Commands::Engagement(_) => Some(Endpoint::EngagementSignal),
            Commands::Convert(_) | Commands::Shell => None,
        }
    }

    pub fn call_input(&self) -> Option<&str> {
        match self {
            Commands::Enrich(args)
            | Commands::Icp(args)
            | Commands::Market(args)
            | Commands::Champion(args)
            | Commands::Engagement(args) => args.input.as_deref(),
            Commands::Convert(_) | Commands::Shell => None,
        }
    }
}

impl Cli {
    /// 命令列參數覆蓋設定檔
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Commands::Convert(args) = &self.command {
            if let Some(dir) = &args.output_dir {
                tracing::info!("🔧 output.directory overridden to: {}", dir);
                config.output.directory = dir.clone();
            }
            if let Some(mode) = args.key_mode {
                config.csv.key_mode = mode;
            }
            if let Some(shape) = args.shape {
                config.csv.output_shape = shape;
            }
        }
    }
}

use clap::Parser;
use sdr_agent::config::cli::{Commands, LogFormat};
use sdr_agent::utils::error::{AppError, ErrorSeverity};
use sdr_agent::utils::{logger, validation::Validate};
use sdr_agent::{
    AppConfig, Cli, Command, ConversionEngine, ConversionPipeline, LocalStorage, Router,
    SessionState, Shell,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("🚀 Starting sdr-agent");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    if let Err(e) = run(&cli).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ sdr-agent failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        let exit_code = exit_code(&e);
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(e: &AppError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 遠端 API 錯誤
        ErrorSeverity::High => 1,     // 處理/驗證錯誤
        ErrorSeverity::Critical => 3, // 設定或系統錯誤
    }
}

async fn run(cli: &Cli) -> sdr_agent::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    // 應用命令列覆蓋設定後再驗證一次
    cli.apply_overrides(&mut config);
    config.validate()?;
    tracing::info!("✅ Configuration loaded and validated successfully");

    match &cli.command {
        Commands::Convert(args) => {
            let source = LocalStorage::new(".");
            let storage = LocalStorage::new(&config.output.directory);
            let pipeline = ConversionPipeline::new(
                source,
                args.input.to_string_lossy(),
                storage,
                config.csv.clone(),
                config.output.clone(),
            );

            let run = ConversionEngine::new(pipeline).run().await?;
            let summary = run.result.summary;

            println!("✅ Conversion completed successfully!");
            println!(
                "📊 {} rows read, {} grouped into {} companies, {} skipped",
                summary.rows_read, summary.rows_grouped, summary.companies, summary.rows_rejected
            );
            for row in &run.result.rejected {
                println!("  ⚠️ row {}: {}", row.row_index, row.reason);
            }
            println!("📁 Output saved to: {}", run.output_path);
            println!(
                "📁 Report saved to: {}/{}",
                config.output.directory.trim_end_matches('/'),
                config.output.report_filename
            );
        }
        Commands::Shell => {
            let router = Router::new(config).with_format(cli.format);
            Shell::new(router).run_stdio().await?;
        }
        command => {
            let Some(endpoint) = command.endpoint() else {
                return Ok(());
            };
            let router = Router::new(config).with_format(cli.format);
            let mut session = SessionState::new();
            let output = router
                .dispatch(
                    Command::Call {
                        endpoint,
                        input: command.call_input().unwrap_or_default().to_string(),
                    },
                    &mut session,
                )
                .await?;
            println!("{}", output);
        }
    }

    Ok(())
}

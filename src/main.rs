use clap::Parser;
use lms_settings::utils::{logger, validation::Validate};
use lms_settings::{CliConfig, LocalOutput, SettingsFile};

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting lms-settings");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let file = match SettingsFile::from_file(&config.settings) {
        Ok(file) => file,
        Err(e) => {
            tracing::error!("Failed to load settings file '{}': {}", config.settings.display(), e);
            eprintln!("❌ Failed to load settings file '{}': {}", config.settings.display(), e);
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = file.validate() {
        tracing::error!("Settings validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    let (mut settings, bootstrap) = file.bootstrap(config.profile)?;
    tracing::info!(
        "Loaded {} settings, {} derived, profile {:?}",
        settings.len(),
        bootstrap.registry().len(),
        config.profile
    );

    bootstrap.finalize(&mut settings)?;

    let output = LocalOutput::new(config.output.clone());
    let written = output.write_json(&settings.to_json())?;
    tracing::info!("Resolved settings written to {}", written);

    Ok(())
}

#[cfg(feature = "cli")]
pub mod cli;
pub mod profiles;
pub mod toml_config;

pub use profiles::Profile;
pub use toml_config::{EmailConfig, MarketingConfig, SettingsFile};

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "lms-settings")]
#[command(about = "Resolve platform settings: derived values, profiles and comprehensive theming")]
pub struct CliConfig {
    #[arg(long, short = 's', help = "Settings TOML file")]
    pub settings: PathBuf,

    #[arg(long, value_enum, default_value = "default")]
    pub profile: Profile,

    #[arg(long, short = 'o', help = "Write resolved settings here instead of stdout")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

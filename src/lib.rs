pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod theming;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalOutput, CliConfig};

pub use config::{Profile, SettingsFile};
pub use core::{Accessor, Bootstrap, DerivationRegistry, DerivationTarget, Setting, Settings};
pub use utils::error::{Result, SettingsError};

pub mod apps;
pub mod bootstrap;
pub mod derived;
pub mod template;

pub use crate::domain::settings::{DeriveFn, Setting, Settings};
pub use crate::utils::error::Result;
pub use apps::AppConfig;
pub use bootstrap::Bootstrap;
pub use derived::{Accessor, DerivationRegistry, DerivationTarget};

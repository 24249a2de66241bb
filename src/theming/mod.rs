//! 全面主題化：主題探索與範本/語系路徑設定

pub mod dirs;
pub mod enable;

pub use dirs::{
    is_theme_dir, project_root_name, theme_base_dirs, theme_base_dirs_from_settings, theme_dirs,
    themes, Theme,
};
pub use enable::{enable_theming, enable_theming_with_settings};

//! 全面主題化的核心邏輯

use crate::domain::settings::{Setting, Settings};
use crate::theming::dirs::{project_root_name, theme_base_dirs, themes};
use crate::utils::error::{Result, SettingsError};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// 將每個主題的基底目錄加到 `mako_template_dirs` 最前面 (每個基底目錄只加一次)，
/// 並回傳附加主題語系路徑後的 `locale_paths`
pub fn enable_theming_with_settings(
    mako_template_dirs: &mut Vec<PathBuf>,
    theme_base_dirs: &[PathBuf],
    project: &str,
    mut locale_paths: Vec<PathBuf>,
    theme_locale_paths: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    for theme in themes(theme_base_dirs, project)? {
        if !mako_template_dirs.contains(&theme.themes_base_dir) {
            tracing::debug!("Adding {} to the Mako template path", theme);
            mako_template_dirs.insert(0, theme.themes_base_dir.clone());
        }
    }

    locale_paths.extend(theme_locale_paths.iter().cloned());
    Ok(locale_paths)
}

/// 對 `MAKO_TEMPLATES[main]` 與 `LOCALE_PATHS` 套用 [`enable_theming_with_settings`]，需要 `PROJECT_ROOT`
pub fn enable_theming(settings: &mut Settings) -> Result<()> {
    let root = settings.require_str("PROJECT_ROOT")?;
    let project = project_root_name(Path::new(root)).ok_or_else(|| {
        SettingsError::InvalidConfigValueError {
            field: "PROJECT_ROOT".to_string(),
            value: root.to_string(),
            reason: "Path has no final component".to_string(),
        }
    })?;

    let mut mako_dirs = match settings.entry("MAKO_TEMPLATES", "main") {
        Some(Setting::Value(Value::Array(items))) => items
            .iter()
            .filter_map(Value::as_str)
            .map(PathBuf::from)
            .collect(),
        Some(_) => {
            return Err(SettingsError::malformed(
                "MAKO_TEMPLATES[main]",
                "expected a list of directories",
            ))
        }
        None => Vec::new(),
    };

    let locale_paths = enable_theming_with_settings(
        &mut mako_dirs,
        &theme_base_dirs(settings),
        &project,
        settings.paths("LOCALE_PATHS"),
        &settings.paths("COMPREHENSIVE_THEME_LOCALE_PATHS"),
    )?;

    settings.set_entry("MAKO_TEMPLATES", "main", paths_to_json(&mako_dirs))?;
    settings.set("LOCALE_PATHS", paths_to_json(&locale_paths));
    tracing::info!(
        "Comprehensive theming enabled for '{}' ({} template dirs, {} locale paths)",
        project,
        mako_dirs.len(),
        locale_paths.len()
    );
    Ok(())
}

fn paths_to_json(paths: &[PathBuf]) -> Value {
    Value::Array(
        paths
            .iter()
            .map(|p| Value::String(p.to_string_lossy().into_owned()))
            .collect(),
    )
}

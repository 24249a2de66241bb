//! 在檔案系統上探索主題
//!
//! 主題基底目錄內每個主題各佔一個目錄；含有 `lms` 或 `cms` 子目錄的目錄才算主題。

use crate::domain::settings::Settings;
use crate::utils::error::Result;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

const THEME_SUB_DIRECTORIES: [&str; 2] = ["lms", "cms"];

pub fn theme_base_dirs_from_settings<P: AsRef<Path>>(theme_dirs: &[P]) -> Vec<PathBuf> {
    theme_dirs
        .iter()
        .map(|dir| dir.as_ref().to_path_buf())
        .collect()
}

/// `COMPREHENSIVE_THEME_DIRS` 列出的基底目錄，未設定時為空
pub fn theme_base_dirs(settings: &Settings) -> Vec<PathBuf> {
    theme_base_dirs_from_settings(&settings.paths("COMPREHENSIVE_THEME_DIRS"))
}

pub fn is_theme_dir(dir: &Path) -> bool {
    dir.is_dir()
        && THEME_SUB_DIRECTORIES
            .iter()
            .any(|sub| dir.join(sub).is_dir())
}

/// `themes_dir` 內主題目錄的名稱 (已排序)
pub fn theme_dirs(themes_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(themes_dir)? {
        let entry = entry?;
        if !is_theme_dir(&entry.path()) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::warn!("Skipping theme directory with non UTF-8 name {:?}", raw),
        }
    }
    names.sort();
    Ok(names)
}

/// `base_dirs` 下所有主題，對應專案 `project` (`lms` 或 `cms`)
pub fn themes(base_dirs: &[PathBuf], project: &str) -> Result<Vec<Theme>> {
    let mut found = Vec::new();
    for base_dir in base_dirs {
        for name in theme_dirs(base_dir)? {
            found.push(Theme::new(&name, &name, base_dir, project));
        }
    }
    tracing::debug!("Found {} themes in {} base dirs", found.len(), base_dirs.len());
    Ok(found)
}

/// 專案根目錄的最後一段，例如 `/edx/app/edx-platform/lms/` 為 `lms`
pub fn project_root_name(root: &Path) -> Option<String> {
    root.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub theme_dir_name: String,
    pub themes_base_dir: PathBuf,
    pub project: String,
}

impl Theme {
    pub fn new(
        name: &str,
        theme_dir_name: &str,
        themes_base_dir: impl Into<PathBuf>,
        project: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            theme_dir_name: theme_dir_name.to_string(),
            themes_base_dir: themes_base_dir.into(),
            project: project.to_string(),
        }
    }

    /// 此主題在該專案下存放範本與靜態資源的目錄
    pub fn path(&self) -> PathBuf {
        self.themes_base_dir
            .join(&self.theme_dir_name)
            .join(&self.project)
    }

    /// 相對於主題基底目錄的範本目錄
    pub fn template_path(&self) -> PathBuf {
        Path::new(&self.theme_dir_name)
            .join(&self.project)
            .join("templates")
    }

    pub fn template_dirs(&self) -> Vec<PathBuf> {
        vec![self.path().join("templates")]
    }
}

impl PartialEq for Theme {
    fn eq(&self, other: &Self) -> bool {
        self.theme_dir_name == other.theme_dir_name && self.path() == other.path()
    }
}

impl Eq for Theme {}

impl Hash for Theme {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.theme_dir_name.hash(state);
        self.path().hash(state);
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Theme: {} at '{}'>", self.name, self.path().display())
    }
}

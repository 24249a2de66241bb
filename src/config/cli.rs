use crate::utils::error::Result;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// 解析後設定的輸出位置：指定檔案，未指定時輸出到 stdout
#[derive(Debug, Clone)]
pub struct LocalOutput {
    path: Option<PathBuf>,
}

impl LocalOutput {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn write_json(&self, value: &serde_json::Value) -> Result<String> {
        let rendered = serde_json::to_string_pretty(value)?;

        match &self.path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                fs::write(path, rendered.as_bytes())?;
                Ok(path.display().to_string())
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes())?;
                stdout.write_all(b"\n")?;
                Ok("<stdout>".to_string())
            }
        }
    }
}

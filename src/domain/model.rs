use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sailthru 呼叫失敗時的錯誤內容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SailthruApiError {
    pub code: i64,
    pub message: String,
}

impl SailthruApiError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SailthruResponse {
    pub json: Value,
    pub error: Option<SailthruApiError>,
}

impl SailthruResponse {
    pub fn ok(json: Value) -> Self {
        Self { json, error: None }
    }

    pub fn failed(code: i64, message: impl Into<String>) -> Self {
        Self {
            json: Value::Null,
            error: Some(SailthruApiError::new(code, message)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 註冊狀態變更訊號
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollStatusChange {
    pub email: String,
    pub course_id: String,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationEmail {
    pub subject: String,
    pub message: String,
    pub from_address: String,
    pub dest_addr: String,
}

use crate::domain::model::{ActivationEmail, SailthruResponse};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Sailthru REST API
///
/// `Err` 表示請求沒有得到 API 回應 (網路、解碼)；API 層級的失敗放在
/// [`SailthruResponse::error`] 中回傳。
#[async_trait]
pub trait SailthruApi: Send + Sync {
    async fn api_get(&self, action: &str, data: Value) -> Result<SailthruResponse>;
    async fn api_post(&self, action: &str, data: Value) -> Result<SailthruResponse>;
    async fn purchase(
        &self,
        email: &str,
        items: Vec<Value>,
        options: serde_json::Map<String, Value>,
    ) -> Result<SailthruResponse>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailFailure {
    /// 傳送管道沒有可用的憑證，可重試
    NoAuthHandler,
    Other(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(&self, email: &ActivationEmail) -> std::result::Result<(), MailFailure>;
}

pub trait FeatureSwitches: Send + Sync {
    fn is_enabled(&self, name: &str) -> bool;
}

//! 讓 Sailthru 與課程註冊狀態保持同步
//!
//! 註冊時將課程從使用者的 `unenrolled` 清單移除，並記錄該課程模式的零元購買；
//! 任一步驟遇到可重試的 Sailthru 錯誤時，依行銷重試策略重跑整個任務。

use crate::adapters::cache::ContentCache;
use crate::app::tasks::retry::run_with_retry;
use crate::config::MarketingConfig;
use crate::domain::model::{EnrollStatusChange, SailthruApiError};
use crate::domain::ports::{FeatureSwitches, SailthruApi};
use crate::domain::settings::Settings;
use crate::utils::error::{Result, SettingsError};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const SAILTHRU_SWITCH_NAMESPACE: &str = "sailthru";
pub const SAILTHRU_AUDIT_PURCHASE_ENABLED: &str = "audit_purchase_enabled";

/// 可重試的 Sailthru 錯誤碼：9 (內部錯誤) 與 43 (請求過多)
pub fn can_retry_sailthru_request(error: &SailthruApiError) -> bool {
    matches!(error.code, 9 | 43)
}

/// 課程資訊頁網址
pub fn build_course_url(lms_root_url: &str, course_key: &str) -> String {
    format!("{}/courses/{}/info", lms_root_url, course_key)
}

pub fn build_purchase_item(
    course_id: &str,
    course_url: &str,
    cost_in_cents: i64,
    mode: &str,
    course_data: &Value,
) -> Value {
    let mut item = Map::new();
    item.insert("id".to_string(), json!(format!("{}-{}", course_id, mode)));
    item.insert("url".to_string(), json!(course_url));
    item.insert("price".to_string(), json!(cost_in_cents));
    item.insert("qty".to_string(), json!(1));

    // Sailthru 沒有課程資料時自行產生標題
    let title = course_data
        .get("title")
        .cloned()
        .unwrap_or_else(|| json!(format!("Course {} mode: {}", course_id, mode)));
    item.insert("title".to_string(), title);

    if let Some(tags) = course_data.get("tags") {
        item.insert("tags".to_string(), tags.clone());
    }

    Value::Object(item)
}

fn is_empty_response(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

pub struct EnrollmentSync<C: SailthruApi> {
    client: C,
    config: MarketingConfig,
    lms_root_url: String,
    cache: ContentCache,
}

impl<C: SailthruApi> EnrollmentSync<C> {
    pub fn new(client: C, config: MarketingConfig, lms_root_url: impl Into<String>) -> Self {
        Self {
            client,
            config,
            lms_root_url: lms_root_url.into(),
            cache: ContentCache::new(),
        }
    }

    /// 從已完成的設定讀取 `LMS_ROOT_URL`
    pub fn from_settings(client: C, config: MarketingConfig, settings: &Settings) -> Result<Self> {
        let root = settings.require_str("LMS_ROOT_URL")?;
        Ok(Self::new(client, config, root))
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn course_url(&self, course_key: &str) -> String {
        build_course_url(&self.lms_root_url, course_key)
    }

    /// 維護使用者已退選的課程清單，只有在值得重試的失敗時回傳 `false`
    pub async fn update_unenrolled_list(&self, email: &str, course_url: &str, unenroll: bool) -> bool {
        let response = match self
            .client
            .api_get("user", json!({"id": email, "fields": {"vars": 1}}))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    "Exception attempting to update user record for {} in Sailthru - {}",
                    email,
                    e
                );
                return false;
            }
        };
        if let Some(error) = &response.error {
            tracing::error!(
                "Error attempting to read user record from Sailthru: {}",
                error.message
            );
            return !can_retry_sailthru_request(error);
        }

        let mut unenroll_list: Vec<Value> = response
            .json
            .get("vars")
            .and_then(|vars| vars.get("unenrolled"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let course = Value::String(course_url.to_string());
        let position = unenroll_list.iter().position(|url| *url == course);
        let changed = match (unenroll, position) {
            (true, None) => {
                unenroll_list.push(course);
                true
            }
            (false, Some(index)) => {
                unenroll_list.remove(index);
                true
            }
            _ => false,
        };

        if !changed {
            return true;
        }

        let payload = json!({"id": email, "key": "email", "vars": {"unenrolled": unenroll_list}});
        match self.client.api_post("user", payload).await {
            Ok(response) => match &response.error {
                Some(error) => {
                    tracing::error!(
                        "Error attempting to update user record in Sailthru: {}",
                        error.message
                    );
                    !can_retry_sailthru_request(error)
                }
                None => true,
            },
            Err(e) => {
                tracing::error!(
                    "Exception attempting to update user record for {} in Sailthru - {}",
                    email,
                    e
                );
                false
            }
        }
    }

    /// 從 Sailthru 取得課程資訊，快取 `sailthru_content_cache_age` 秒
    /// 任何失敗都回傳空物件
    pub async fn course_content(&self, course_id: &str, course_url: &str) -> Value {
        let cache_key = format!("{}:{}", course_id, course_url);
        if let Some(cached) = self.cache.get(&cache_key).await {
            if !is_empty_response(&cached) {
                return cached;
            }
        }

        match self.client.api_get("content", json!({"id": course_url})).await {
            Ok(response) if response.is_ok() => {
                self.cache
                    .set(&cache_key, response.json.clone(), self.config.content_cache_age())
                    .await;
                response.json
            }
            Ok(_) => {
                tracing::error!("Could not get course data from Sailthru on enroll/unenroll event.");
                Value::Object(Map::new())
            }
            Err(e) => {
                tracing::debug!("Sailthru content lookup failed: {}", e);
                Value::Object(Map::new())
            }
        }
    }

    /// 只有在值得重試的失敗時回傳 `false`
    pub async fn record_purchase(&self, email: &str, item: Value, options: Map<String, Value>) -> bool {
        match self.client.purchase(email, vec![item], options).await {
            Ok(response) => match &response.error {
                Some(error) => {
                    tracing::error!(
                        "Error attempting to record purchase in Sailthru: {}",
                        error.message
                    );
                    !can_retry_sailthru_request(error)
                }
                None => true,
            },
            Err(e) => {
                tracing::error!(
                    "Exception attempting to record purchase for {} in Sailthru - {}",
                    email,
                    e
                );
                false
            }
        }
    }

    /// 單次註冊更新，可重試的失敗以 [`SettingsError::RetryRequested`] 回報
    pub async fn update_course_enrollment(&self, email: &str, course_key: &str, mode: &str) -> Result<()> {
        let course_url = self.course_url(course_key);

        if !self.update_unenrolled_list(email, &course_url, false).await {
            return Err(SettingsError::RetryRequested {
                reason: format!("unenrolled list update for {} failed", email),
            });
        }

        let course_data = self.course_content(course_key, &course_url).await;
        let item = build_purchase_item(course_key, &course_url, 0, mode, &course_data);

        let mut options = Map::new();
        if let Some(template) = &self.config.sailthru_enroll_template {
            if !template.is_empty() {
                options.insert("send_template".to_string(), json!(template));
            }
        }

        if !self.record_purchase(email, item, options).await {
            return Err(SettingsError::RetryRequested {
                reason: format!("purchase record for {} failed", email),
            });
        }

        tracing::info!("Sailthru enrollment updated for {} in {} ({})", email, course_key, mode);
        Ok(())
    }

    /// 依行銷重試策略執行 [`Self::update_course_enrollment`]
    pub async fn run_update_course_enrollment(&self, email: &str, course_key: &str, mode: &str) -> Result<()> {
        run_with_retry(
            "update_course_enrollment",
            self.config.retry_policy(),
            move |_| self.update_course_enrollment(email, course_key, mode),
        )
        .await
    }

    /// 註冊訊號是否需要更新 Sailthru：審核購買開關已開啟且模式不是 `verified`
    pub fn should_update_sailthru(
        &self,
        switches: &dyn FeatureSwitches,
        change: &EnrollStatusChange,
    ) -> bool {
        let switch = format!("{}.{}", SAILTHRU_SWITCH_NAMESPACE, SAILTHRU_AUDIT_PURCHASE_ENABLED);
        switches.is_enabled(&switch) && change.mode != "verified"
    }
}

impl<C: SailthruApi + 'static> EnrollmentSync<C> {
    /// 註冊訊號接收器
    ///
    /// 符合條件時在背景派送重試中的註冊更新並立即回傳其 handle；
    /// 不需更新時回傳 `None`。
    pub fn update_sailthru(
        self: &Arc<Self>,
        switches: &dyn FeatureSwitches,
        change: &EnrollStatusChange,
    ) -> Option<JoinHandle<Result<()>>> {
        if !self.should_update_sailthru(switches, change) {
            tracing::debug!(
                "Skipping Sailthru update for {} ({} mode)",
                change.course_id,
                change.mode
            );
            return None;
        }

        let sync = Arc::clone(self);
        let change = change.clone();
        Some(tokio::spawn(async move {
            sync.run_update_course_enrollment(&change.email, &change.course_id, &change.mode)
                .await
        }))
    }
}

use crate::utils::error::{Result, SettingsError};
use std::future::Future;
use std::time::Duration;

/// 任務要求重試後的間隔與次數上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub countdown: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(countdown: Duration, max_retries: u32) -> Self {
        Self {
            countdown,
            max_retries,
        }
    }

    pub fn immediate(max_retries: u32) -> Self {
        Self::new(Duration::ZERO, max_retries)
    }
}

/// 重複執行 `task` 直到結果不是 [`SettingsError::RetryRequested`]
///
/// 任務會收到目前已重試的次數；重試 `max_retries` 次後以
/// [`SettingsError::MaxRetriesExceeded`] 結束。
pub async fn run_with_retry<T, F, Fut>(name: &str, policy: RetryPolicy, mut task: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match task(retries).await {
            Err(e) if e.is_retry() => {
                if retries >= policy.max_retries {
                    return Err(SettingsError::MaxRetriesExceeded {
                        task: name.to_string(),
                        attempts: retries + 1,
                    });
                }
                tracing::debug!(
                    "Task '{}' retrying in {:?} ({}): retry {} of {}",
                    name,
                    policy.countdown,
                    e,
                    retries + 1,
                    policy.max_retries
                );
                tokio::time::sleep(policy.countdown).await;
                retries += 1;
            }
            other => return other,
        }
    }
}

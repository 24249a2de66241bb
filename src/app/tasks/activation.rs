use crate::app::tasks::retry::{run_with_retry, RetryPolicy};
use crate::domain::model::ActivationEmail;
use crate::domain::ports::{MailFailure, Mailer};
use crate::utils::error::{Result, SettingsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    Sent,
    /// 重試次數用盡前傳送管道始終無法使用
    GaveUp,
}

/// 寄送啟用信，傳送管道沒有憑證時重試
pub async fn send_activation_email<M>(
    mailer: &M,
    policy: RetryPolicy,
    email: &ActivationEmail,
) -> Result<ActivationOutcome>
where
    M: Mailer + ?Sized,
{
    let max_attempts = policy.max_retries;

    let result = run_with_retry("send_activation_email", policy, move |attempt| async move {
        match mailer.send_mail(email).await {
            Ok(()) => {
                tracing::info!("Activation Email has been sent to User {}", email.dest_addr);
                Ok(())
            }
            Err(MailFailure::NoAuthHandler) => {
                tracing::info!(
                    "Retrying sending email to user {}, attempt # {} of {}",
                    email.dest_addr,
                    attempt,
                    max_attempts
                );
                Err(SettingsError::RetryRequested {
                    reason: "no mail auth handler".to_string(),
                })
            }
            Err(MailFailure::Other(message)) => {
                tracing::error!(
                    "Unable to send activation email to user from \"{}\" to \"{}\": {}",
                    email.from_address,
                    email.dest_addr,
                    message
                );
                Err(SettingsError::MailError { message })
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(ActivationOutcome::Sent),
        Err(SettingsError::MaxRetriesExceeded { .. }) => {
            tracing::error!(
                "Unable to send activation email to user from \"{}\" to \"{}\"",
                email.from_address,
                email.dest_addr
            );
            Ok(ActivationOutcome::GaveUp)
        }
        Err(e) => Err(e),
    }
}

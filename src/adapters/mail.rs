use crate::domain::model::ActivationEmail;
use crate::domain::ports::{MailFailure, Mailer};
use async_trait::async_trait;

/// 將外寄信件寫入日誌，不實際寄送
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_mail(&self, email: &ActivationEmail) -> Result<(), MailFailure> {
        tracing::info!(
            from = %email.from_address,
            to = %email.dest_addr,
            subject = %email.subject,
            "{}",
            email.message
        );
        Ok(())
    }
}

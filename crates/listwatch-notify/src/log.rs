//! Notifier that only writes alerts to the log. Used when no chat token is set.

use async_trait::async_trait;

use crate::alert::Alert;
use crate::error::NotifyError;
use crate::Notifier;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        if alert.records.is_empty() {
            return Err(NotifyError::EmptyAlert);
        }
        tracing::info!(
            channel = %alert.channel_id,
            url = %alert.url,
            records = alert.records.len(),
            overflow = alert.overflow,
            "{}\n{}",
            alert.title(),
            alert.body()
        );
        Ok(())
    }
}

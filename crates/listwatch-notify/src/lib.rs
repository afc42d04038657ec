pub mod alert;
pub mod chat;
pub mod error;
pub mod log;
mod rate_limit;

use async_trait::async_trait;

pub use alert::{Alert, MAX_ALERT_RECORDS};
pub use chat::ChatNotifier;
pub use error::NotifyError;
pub use log::LogNotifier;

/// Outbound delivery of change alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one alert.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery failed after any retries.
    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError>;
}

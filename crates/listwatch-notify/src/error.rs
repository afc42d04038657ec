use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by chat API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from chat API: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("refusing to send an alert with no records")]
    EmptyAlert,
}

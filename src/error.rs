use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// A block, head or pool query could not be retrieved. The unit of work is
    /// skipped and the surrounding operation carries on.
    #[error("chain data unavailable: {0}")]
    FetchUnavailable(String),
    /// An alert could not be delivered. Logged and dropped, never retried.
    #[error("notification failed: {0}")]
    NotificationFailed(String),
    #[error("missing required configuration: {0}")]
    ConfigurationMissing(&'static str),
    #[error("invalid configuration for {key}: {reason}")]
    InvalidConfiguration { key: &'static str, reason: String },
}

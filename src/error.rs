//! Error types shared by every stage of the curation job.
//!
//! Per-item failures (a site that will not load, an article that will not
//! parse) are reported through these variants but caught by the pipeline;
//! only [`CuratorError::Config`] and [`CuratorError::Store`] are expected to
//! reach `main`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CuratorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),
}

impl CuratorError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Timeouts, connection failures and non-2xx responses are retried;
    /// malformed URLs and parse failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, CuratorError::Http(_) | CuratorError::HttpStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, CuratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_are_transient() {
        let err = CuratorError::HttpStatus {
            url: "https://example.com".to_string(),
            status: 503,
        };
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "HTTP 503 from https://example.com");
    }

    #[test]
    fn test_parse_and_config_errors_are_terminal() {
        assert!(!CuratorError::Parse("bad html".into()).is_transient());
        assert!(!CuratorError::Config("missing token".into()).is_transient());
        let url_err = url::Url::parse("not a url").unwrap_err();
        assert!(!CuratorError::from(url_err).is_transient());
    }
}

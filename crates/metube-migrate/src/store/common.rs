//! HTTP helpers shared by remote stores.

use reqwest::Client;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default HTTP timeout for store requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Creates an HTTP client with timeouts.
#[must_use]
pub fn create_http_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Rejects anything that is not an http(s) URL.
pub fn validate_url(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "Invalid store URL '{}'. Allowed schemes: http, https",
            url
        )));
    }
    if url.len() < 10 {
        return Err(Error::Config(format!("Invalid store URL format: {}", url)));
    }
    Ok(())
}

/// Maps an HTTP error status to an error.
pub fn handle_http_error(status_code: u16, body: &str, store_name: &str) -> Error {
    match status_code {
        429 => Error::RateLimit(60),
        401 | 403 => Error::Authentication(format!("{} auth failed: {}", store_name, body)),
        _ => Error::Store(format!("{} error {}: {}", store_name, status_code, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("http://localhost:8080").is_ok());
        assert!(validate_url("https://data.mongodb-api.com/app/x").is_ok());
        assert!(validate_url("mongodb://localhost:27017").is_err());
        assert!(validate_url("http://a").is_err());
    }

    #[test]
    fn test_handle_http_error() {
        assert!(matches!(handle_http_error(429, "", "Data API"), Error::RateLimit(60)));
        assert!(matches!(
            handle_http_error(401, "no", "Data API"),
            Error::Authentication(_)
        ));
        let err = handle_http_error(503, "down", "Data API");
        assert_eq!(err.to_string(), "Store error: Data API error 503: down");
    }
}

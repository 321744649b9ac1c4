//! Retrieval of calendar feed text.

use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::error::{NowcalError, NowcalResult};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the raw text behind a feed URL.
pub trait FeedFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = NowcalResult<String>> + Send;
}

/// Feed fetcher over HTTP(S), also accepting `webcal://` subscription links.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> NowcalResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("nowcal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NowcalError::Config(format!("Could not build HTTP client: {}", e)))?;
        Ok(HttpFetcher { http })
    }
}

impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> NowcalResult<String> {
        let target = fetchable_url(url)?;

        let resp = self
            .http
            .get(target)
            .send()
            .await
            .map_err(|e| NowcalError::transport(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NowcalError::transport(url, format!("HTTP {}", status)));
        }

        resp.text().await.map_err(|e| NowcalError::transport(url, e))
    }
}

/// Validate a feed URL and rewrite `webcal(s)://` to `https://`.
pub fn fetchable_url(raw: &str) -> NowcalResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| NowcalError::InvalidUrl(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        "webcal" | "webcals" => {
            let rest = &url.as_str()[url.scheme().len()..];
            Url::parse(&format!("https{}", rest))
                .map_err(|e| NowcalError::InvalidUrl(format!("{}: {}", raw, e)))
        }
        other => Err(NowcalError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            raw, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_url_is_kept() {
        let url = fetchable_url("https://example.com/cal.ics").unwrap();
        assert_eq!(url.as_str(), "https://example.com/cal.ics");
    }

    #[test]
    fn test_webcal_becomes_https() {
        let url = fetchable_url("webcal://p01-calendars.icloud.com/published/2/abc").unwrap();
        assert_eq!(url.as_str(), "https://p01-calendars.icloud.com/published/2/abc");

        let url = fetchable_url("webcals://example.com/feed?key=1").unwrap();
        assert_eq!(url.as_str(), "https://example.com/feed?key=1");
    }

    #[test]
    fn test_other_schemes_are_rejected() {
        assert!(matches!(
            fetchable_url("ftp://example.com/cal.ics"),
            Err(NowcalError::InvalidUrl(_))
        ));
        assert!(matches!(
            fetchable_url("not a url"),
            Err(NowcalError::InvalidUrl(_))
        ));
    }
}

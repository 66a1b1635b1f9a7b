use tracing::debug;

use crate::{TransportError, TransportResult};

/// HTTP round trip performed on behalf of a scripting client. No retry,
/// backoff or timeout policy lives at this layer.
pub trait Fetch: Send + Sync {
    fn fetch(&self, method: &str, url: &str) -> TransportResult<String>;
}

impl<F> Fetch for F
where
    F: Fn(&str, &str) -> TransportResult<String> + Send + Sync,
{
    fn fetch(&self, method: &str, url: &str) -> TransportResult<String> {
        (self)(method, url)
    }
}

/// Blocking `reqwest` fetcher. Only `GET` is supported; anything else is
/// rejected before a request is made.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, method: &str, url: &str) -> TransportResult<String> {
        if !method.eq_ignore_ascii_case("GET") {
            return Err(TransportError::UnsupportedMethod(method.to_string()));
        }
        debug!(target: "frame_bus::fetch", %url, "fetching");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| TransportError::Http(err.to_string()))?;
        response
            .text()
            .map_err(|err| TransportError::Http(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_get_methods_are_rejected() {
        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch("POST", "http://127.0.0.1:9/").unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedMethod(method) if method == "POST"));
    }

    #[test]
    fn closures_act_as_fetchers() {
        let fetcher = |method: &str, url: &str| -> TransportResult<String> {
            Ok(format!("{method} {url}"))
        };
        assert_eq!(
            fetcher.fetch("GET", "https://example.invalid/status").unwrap(),
            "GET https://example.invalid/status"
        );
    }

    #[test]
    fn http_errors_are_surfaced_unchanged() {
        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch("get", "not a url").unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
    }
}

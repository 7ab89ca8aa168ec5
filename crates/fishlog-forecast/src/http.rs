//! Shared HTTP plumbing for the service clients.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Connection settings shared by every client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// User agent sent with each request.
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: concat!("fishlog/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Build a client for `service` using the shared settings.
pub(crate) fn build_client(service: &'static str, settings: &HttpSettings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(settings.user_agent.clone())
        .build()
        .map_err(|source| Error::Request { service, source })
}

/// GET `url` with `query` and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    service: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<T> {
    debug!(service, url, "GET");
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| Error::Request { service, source })?;

    read_json(service, response).await
}

/// Check the status of `response` and decode its JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status {
            service,
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| Error::Request { service, source })?;
    trace!(service, bytes = body.len(), "response received");

    serde_json::from_slice(&body).map_err(|e| Error::decode(service, e.to_string()))
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
pub(crate) mod testing {
    //! A loopback responder that serves one canned HTTP response.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Whether `seen` holds a complete request (headers plus body).
    fn request_complete(seen: &[u8]) -> bool {
        let Some(end) = seen.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&seen[..end]).to_ascii_lowercase();
        let body = &seen[end + 4..];
        if head.contains("transfer-encoding: chunked") {
            return body.ends_with(b"0\r\n\r\n");
        }
        let length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        body.len() >= length
    }

    /// Serve `body` with `status` once and return the base URL.
    pub async fn serve_once(status: u16, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0_u8; 8192];
            let mut seen = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
                if request_complete(&seen) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.tide736.net/", "/get_tide.php"),
            "https://api.tide736.net/get_tide.php"
        );
        assert_eq!(join_url("http://x", "v1/forecast"), "http://x/v1/forecast");
    }

    #[test]
    fn test_default_settings() {
        let settings = HttpSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert!(settings.user_agent.starts_with("fishlog/"));
    }

    #[tokio::test]
    async fn test_get_json_decodes_body() {
        let base = testing::serve_once(200, r#"{"value": 42}"#).await;
        let client = build_client("test", &HttpSettings::default()).unwrap();

        let value: serde_json::Value = get_json(&client, "test", &base, &[]).await.unwrap();
        assert_eq!(value["value"], 42);
    }

    #[tokio::test]
    async fn test_get_json_reports_status() {
        let base = testing::serve_once(503, "{}").await;
        let client = build_client("test", &HttpSettings::default()).unwrap();

        let err = get_json::<serde_json::Value>(&client, "test", &base, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_get_json_reports_bad_json() {
        let base = testing::serve_once(200, "not json").await;
        let client = build_client("test", &HttpSettings::default()).unwrap();

        let err = get_json::<serde_json::Value>(&client, "test", &base, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}

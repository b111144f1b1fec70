//! HTTP client for the metric tag lookup API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TagSelectConfig;
use crate::error::TagSelectError;
use crate::fetcher::{TagPage, TagPageFetcher, TagQuery};
use crate::metric::MetricDescriptor;

/// Request body for `POST /metrics/tags`
#[derive(Debug, Serialize)]
struct TagsRequest<'a> {
    metrics: &'a [MetricDescriptor],
    page: u32,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    data: Vec<TagPage>,
}

/// Fetches tag pages from a remote tag lookup service
pub struct HttpTagFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTagFetcher {
    pub fn new(config: &TagSelectConfig) -> Result<Self, TagSelectError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TagSelectError::Config(e.to_string()))?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/metrics/tags", self.base_url)
    }
}

#[async_trait]
impl TagPageFetcher for HttpTagFetcher {
    async fn fetch_tag_pages(&self, query: &TagQuery) -> Result<Vec<TagPage>, TagSelectError> {
        let url = self.endpoint();
        let body = TagsRequest {
            metrics: &query.descriptors,
            page: query.page,
            limit: query.limit,
        };
        tracing::debug!(%url, page = query.page, limit = query.limit, "requesting metric tags");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TagSelectError::Fetch(format!("failed to reach {}: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TagSelectError::Fetch(format!(
                "{} returned {}: {}",
                url,
                status,
                resp.text().await.unwrap_or_default()
            )));
        }

        let parsed = resp
            .json::<TagsResponse>()
            .await
            .map_err(|e| TagSelectError::Decode(e.to_string()))?;
        Ok(parsed.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::normalize_metric_name;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn cpu_query() -> TagQuery {
        TagQuery {
            descriptors: vec![normalize_metric_name("cpu - Gauge")],
            page: 0,
            limit: 20,
        }
    }

    /// Answer a single HTTP request with `status` and `body`, returning the base URL
    async fn respond_once(status: &'static str, content_type: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}")
    }

    /// Headers received and the declared body fully read
    fn request_complete(request: &[u8]) -> bool {
        let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    fn fetcher_for(base_url: String) -> HttpTagFetcher {
        // Local responder only; keep environment proxies out of the way.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .no_proxy()
            .build()
            .unwrap();
        HttpTagFetcher { base_url, client }
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = TagSelectConfig {
            api_url: "http://localhost:8000/api/".to_string(),
            ..TagSelectConfig::default()
        };
        let fetcher = HttpTagFetcher::new(&config).unwrap();
        assert_eq!(fetcher.endpoint(), "http://localhost:8000/api/metrics/tags");
    }

    #[test]
    fn test_request_body_shape() {
        let descriptors = vec![normalize_metric_name("cpu - Gauge")];
        let body = TagsRequest {
            metrics: &descriptors,
            page: 2,
            limit: 20,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "metrics": [{"name": "cpu", "dataType": "Gauge"}],
                "page": 2,
                "limit": 20,
            })
        );
    }

    #[test]
    fn test_response_decoding() {
        let raw = r#"{"data": [{"name": "cpu - Gauge", "tags": [{"host": "a"}]}]}"#;
        let parsed: TagsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].tags[0].len(), 1);

        let empty: TagsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.data.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_fetch_error() {
        let config = TagSelectConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 1,
            ..TagSelectConfig::default()
        };
        let fetcher = HttpTagFetcher::new(&config).unwrap();
        let query = TagQuery {
            descriptors: vec![normalize_metric_name("cpu - Gauge")],
            page: 0,
            limit: 20,
        };
        let err = fetcher.fetch_tag_pages(&query).await.unwrap_err();
        assert!(matches!(err, TagSelectError::Fetch(_)), "unexpected error: {err}");
        assert!(err.to_string().contains("127.0.0.1:9"));
    }

    #[tokio::test]
    async fn test_server_error_is_fetch_error_with_status_and_body() {
        let url = respond_once("500 Internal Server Error", "text/plain", "clickhouse unavailable").await;
        let err = fetcher_for(url).fetch_tag_pages(&cpu_query()).await.unwrap_err();
        assert!(matches!(err, TagSelectError::Fetch(_)), "unexpected error: {err}");
        let msg = err.to_string();
        assert!(msg.contains("500"), "missing status: {msg}");
        assert!(msg.contains("clickhouse unavailable"), "missing body: {msg}");
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let url = respond_once("200 OK", "application/json", "<html>not json</html>").await;
        let err = fetcher_for(url).fetch_tag_pages(&cpu_query()).await.unwrap_err();
        assert!(matches!(err, TagSelectError::Decode(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_successful_response_yields_pages() {
        let url = respond_once(
            "200 OK",
            "application/json",
            r#"{"data": [{"name": "cpu - Gauge", "tags": [{"host": "a"}, {"host": "b"}]}]}"#,
        )
        .await;
        let pages = fetcher_for(url).fetch_tag_pages(&cpu_query()).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].name, "cpu - Gauge");
        assert_eq!(pages[0].tags.len(), 2);
    }
}

use crate::core::sensor::Probe;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Passes when a GET to `url` succeeds and the body contains `marker`.
pub struct HttpProbe {
    url: String,
    marker: String,
    request_timeout: Duration,
}

impl HttpProbe {
    pub fn new(url: &str, marker: &str) -> Self {
        HttpProbe {
            url: url.to_string(),
            marker: marker.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn describe(&self) -> String {
        format!("GET {}", self.url)
    }

    async fn check(&self) -> Result<bool> {
        let client = reqwest::Client::builder()
            .user_agent("fxflow/0.1")
            .timeout(self.request_timeout)
            .build()?;
        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, self.url))?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "Availability check got non-success status");
            return Ok(false);
        }

        let body = response.text().await?;
        Ok(body.contains(&self.marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn probe_against(status: u16, body: &str) -> bool {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gist"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;

        HttpProbe::new(&format!("{}/gist", server.uri()), "rates")
            .check()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_marker_present() {
        assert!(probe_against(200, r#"{"rates": {}}"#).await);
    }

    #[tokio::test]
    async fn test_marker_absent() {
        assert!(!probe_against(200, "nothing here").await);
    }

    #[tokio::test]
    async fn test_error_status_is_not_ready() {
        assert!(!probe_against(404, "rates").await);
    }

    #[tokio::test]
    async fn test_stalled_response_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("rates")
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let probe = HttpProbe::new(&server.uri(), "rates").with_timeout(Duration::from_millis(100));
        assert!(probe.check().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_errors() {
        let probe = HttpProbe::new("http://127.0.0.1:9/unreachable", "rates");
        assert!(probe.check().await.is_err());
    }
}

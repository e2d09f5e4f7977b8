use crate::core::error::PipelineError;
use crate::core::rates::{RateSnapshot, RateSource};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetches per-base snapshots from `{base_url}{endpoint}`, one static endpoint per base currency.
pub struct ForexApiSource {
    base_url: String,
    endpoints: BTreeMap<String, String>,
    request_timeout: Duration,
}

impl ForexApiSource {
    pub fn new(base_url: &str, endpoints: BTreeMap<String, String>) -> Self {
        ForexApiSource {
            base_url: base_url.to_string(),
            endpoints,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    fn url_for(&self, base: &str) -> Option<String> {
        self.endpoints
            .get(base)
            .map(|endpoint| format!("{}{}", self.base_url, endpoint))
    }
}

#[async_trait]
impl RateSource for ForexApiSource {
    #[instrument(name = "ForexRatesFetch", skip(self), fields(base = %base))]
    async fn fetch(&self, base: &str) -> Result<RateSnapshot, PipelineError> {
        let url = self
            .url_for(base)
            .ok_or_else(|| PipelineError::source_unavailable(base, "no endpoint configured"))?;
        debug!("Requesting rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("fxflow/0.1")
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| PipelineError::source_unavailable(base, e))?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| PipelineError::source_unavailable(base, format!("request error: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::source_unavailable(
                base,
                format!("HTTP error: {}", response.status()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| PipelineError::source_unavailable(base, e))?;
        let snapshot: RateSnapshot = serde_json::from_str(&text).map_err(|e| {
            PipelineError::source_unavailable(base, format!("failed to parse response: {e}"))
        })?;

        debug!(as_of = %snapshot.as_of, rates = snapshot.rates.len(), "Received snapshot");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(resource: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/raw/{resource}")))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn source(server: &MockServer) -> ForexApiSource {
        ForexApiSource::new(
            &format!("{}/raw/", server.uri()),
            BTreeMap::from([("EUR".to_string(), "eur.json".to_string())]),
        )
    }

    #[tokio::test]
    async fn test_successful_fetch() {
        let body = r#"{"base":"EUR","date":"2024-01-01","rates":{"USD":1.1,"GBP":0.85,"JPY":160}}"#;
        let server = create_mock_server("eur.json", 200, body).await;

        let snapshot = source(&server).fetch("EUR").await.unwrap();
        assert_eq!(snapshot.as_of, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(snapshot.rates["USD"].as_f64(), Some(1.1));
        assert_eq!(snapshot.rates["JPY"].as_u64(), Some(160));
    }

    #[tokio::test]
    async fn test_unknown_base_is_unavailable() {
        let server = create_mock_server("eur.json", 200, "{}").await;
        let err = source(&server).fetch("CHF").await.unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { ref base, .. } if base == "CHF"));
    }

    #[tokio::test]
    async fn test_http_error_is_unavailable() {
        let server = create_mock_server("eur.json", 503, "").await;
        let err = source(&server).fetch("EUR").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_stalled_response_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let err = source(&server)
            .with_timeout(Duration::from_millis(100))
            .fetch("EUR")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { ref base, .. } if base == "EUR"));
    }

    #[tokio::test]
    async fn test_unparseable_body_is_unavailable() {
        let server = create_mock_server("eur.json", 200, "<html>not json</html>").await;
        let err = source(&server).fetch("EUR").await.unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    }
}

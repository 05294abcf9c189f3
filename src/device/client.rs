use anyhow::{anyhow, Context, Result};
use reqwest::{header::CONTENT_TYPE, Client};

use crate::models::{DevicePayload, DeviceSample};

/// Body and content type exactly as the board sent them.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// HTTP client for the sensor board.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: Client,
    base_url: String,
}

impl DeviceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /read`, untouched. Non-2xx answers are errors.
    pub async fn read_raw(&self) -> Result<RawResponse> {
        let response = self
            .http
            .get(format!("{}/read", self.base_url))
            .send()
            .await
            .with_context(|| format!("device at {} unreachable", self.base_url))?
            .error_for_status()
            .context("device rejected /read")?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .context("failed to read device response body")?
            .to_vec();

        Ok(RawResponse { content_type, body })
    }

    pub async fn read(&self) -> Result<DevicePayload> {
        let raw = self.read_raw().await?;
        let text = String::from_utf8(raw.body).context("device body is not UTF-8")?;
        DevicePayload::parse(&text)
    }

    /// Like `read`, but only accepts the JSON firmware.
    pub async fn read_sample(&self) -> Result<DeviceSample> {
        match self.read().await? {
            DevicePayload::Sample(sample) => Ok(sample),
            DevicePayload::Text { raw, .. } => Err(anyhow!(
                "device answered with plain text ({raw:?}); JSON firmware required"
            )),
        }
    }

    /// `GET /set_threshold?value=N`; returns whatever the board replied.
    pub async fn set_threshold(&self, value: i64) -> Result<String> {
        self.http
            .get(format!("{}/set_threshold", self.base_url))
            .query(&[("value", value)])
            .send()
            .await
            .with_context(|| format!("device at {} unreachable", self.base_url))?
            .error_for_status()
            .context("device rejected /set_threshold")?
            .text()
            .await
            .context("failed to read device response body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_http;
    use axum::{extract::Query, routing::get, Router};
    use std::collections::HashMap;

    #[tokio::test]
    async fn reads_json_sample() {
        let device = Router::new().route(
            "/read",
            get(|| async {
                axum::Json(serde_json::json!({
                    "angleY": 4.5, "angleZ": -1.0, "flexValue": 700, "flexAngle": 12.3
                }))
            }),
        );
        let base = spawn_http(device).await;

        let sample = DeviceClient::new(base).read_sample().await.unwrap();
        assert_eq!(sample.flex_value, Some(700));
        assert_eq!(sample.flex_angle, 12.3);
    }

    #[tokio::test]
    async fn raw_read_keeps_content_type() {
        let device = Router::new().route("/read", get(|| async { "Flex: 12" }));
        let base = spawn_http(device).await;

        let raw = DeviceClient::new(format!("{base}/")).read_raw().await.unwrap();
        assert_eq!(raw.body, b"Flex: 12");
        assert!(raw
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/plain")));
    }

    #[tokio::test]
    async fn plain_text_is_not_a_sample() {
        let device = Router::new().route("/read", get(|| async { "Flex: 12" }));
        let base = spawn_http(device).await;

        let client = DeviceClient::new(base);
        assert!(matches!(
            client.read().await.unwrap(),
            DevicePayload::Text { value: 12, .. }
        ));
        assert!(client.read_sample().await.is_err());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let device = Router::new().route(
            "/read",
            get(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
        let base = spawn_http(device).await;

        assert!(DeviceClient::new(base).read_raw().await.is_err());
    }

    #[tokio::test]
    async fn set_threshold_sends_value() {
        let device = Router::new().route(
            "/set_threshold",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                format!("threshold={}", params.get("value").cloned().unwrap_or_default())
            }),
        );
        let base = spawn_http(device).await;

        let reply = DeviceClient::new(base).set_threshold(30).await.unwrap();
        assert_eq!(reply, "threshold=30");
    }
}

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::task::JoinHandle;

use crate::models::Reading;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "forwarder";

use crate::{log_debug, log_error};

/// Posts readings to the backend's `POST /log`.
#[derive(Debug, Clone)]
pub struct BackendForwarder {
    http: Client,
    log_url: String,
}

impl BackendForwarder {
    pub fn new(backend_url: &str) -> Self {
        Self::with_client(Client::new(), backend_url)
    }

    pub fn with_client(http: Client, backend_url: &str) -> Self {
        Self {
            http,
            log_url: format!("{}/log", backend_url.trim_end_matches('/')),
        }
    }

    pub async fn send(&self, reading: &Reading) -> Result<()> {
        self.http
            .post(&self.log_url)
            .json(reading)
            .send()
            .await
            .with_context(|| format!("backend at {} unreachable", self.log_url))?
            .error_for_status()
            .context("backend rejected reading")?;
        Ok(())
    }

    /// Fire-and-forget: failures are logged, never awaited by the caller.
    pub fn forward(&self, reading: Reading) -> JoinHandle<()> {
        let forwarder = self.clone();
        tokio::spawn(async move {
            match forwarder.send(&reading).await {
                Ok(()) => log_debug!("forwarded reading {:?}", reading),
                Err(err) => log_error!("backend logging error: {err:?}"),
            }
        })
    }
}

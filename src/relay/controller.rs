use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::ble::Subscription;
use crate::device::DeviceClient;

use super::loop_worker::{notification_loop, polling_loop, RelayTargets};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "relay";

use crate::log_info;

/// Owns at most one running acquisition task.
pub struct RelayController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl RelayController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn start_polling(
        &mut self,
        device: DeviceClient,
        targets: RelayTargets,
        period: Duration,
        read_timeout: Duration,
    ) -> Result<()> {
        let cancel_token = self.arm()?;
        let handle = tokio::spawn(polling_loop(
            device,
            targets,
            period,
            read_timeout,
            cancel_token.clone(),
        ));
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub fn start_notifications(
        &mut self,
        subscription: Subscription,
        targets: RelayTargets,
    ) -> Result<()> {
        let cancel_token = self.arm()?;
        let handle = tokio::spawn(notification_loop(
            subscription,
            targets,
            cancel_token.clone(),
        ));
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancel the running task and wait until it has fully exited.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("relay task failed to join")?;
            log_info!("relay stopped");
        }
        Ok(())
    }

    fn arm(&mut self) -> Result<CancellationToken> {
        if self.handle.is_some() {
            bail!("relay already active");
        }
        Ok(CancellationToken::new())
    }
}

impl Default for RelayController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RelayController {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}

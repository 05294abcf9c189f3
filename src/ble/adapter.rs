//! Native BLE link to the sensor board (`ble` feature).

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::time::{sleep, Instant};

use crate::settings::BleSettings;

use super::codec::{Channel, SERVICE_UUID};
use super::subscription::{Notification, Subscription};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "ble";

use crate::{log_info, log_warn};

const SCAN_POLL: Duration = Duration::from_millis(500);

/// A connected board. Disconnect explicitly when done.
pub struct BleLink {
    peripheral: Peripheral,
}

impl BleLink {
    /// Scan for the configured device name, connect and discover services.
    pub async fn connect(settings: &BleSettings) -> Result<Self> {
        let manager = Manager::new().await.context("BLE manager unavailable")?;
        let adapter = manager
            .adapters()
            .await
            .context("failed to list BLE adapters")?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no BLE adapter found"))?;

        let peripheral = find_by_name(
            &adapter,
            &settings.device_name,
            Duration::from_secs(settings.scan_timeout_secs),
        )
        .await?;

        peripheral
            .connect()
            .await
            .with_context(|| format!("failed to connect to {}", settings.device_name))?;
        peripheral
            .discover_services()
            .await
            .context("service discovery failed")?;
        log_info!("connected to {}", settings.device_name);

        Ok(Self { peripheral })
    }

    /// Enable notifications on the three sensor characteristics.
    pub async fn subscribe(&self) -> Result<Subscription> {
        let mut subscribed = 0;
        for characteristic in self.peripheral.characteristics() {
            if characteristic.service_uuid != SERVICE_UUID {
                continue;
            }
            if Channel::from_uuid(characteristic.uuid).is_none() {
                continue;
            }
            self.peripheral
                .subscribe(&characteristic)
                .await
                .with_context(|| format!("failed to subscribe to {}", characteristic.uuid))?;
            subscribed += 1;
        }
        if subscribed == 0 {
            bail!("device exposes none of the sensor characteristics");
        }
        if subscribed < Channel::ALL.len() {
            log_warn!("only {subscribed} of {} characteristics found", Channel::ALL.len());
        }

        let notifications = self
            .peripheral
            .notifications()
            .await
            .context("failed to open notification stream")?
            .filter_map(|event| async move {
                Channel::from_uuid(event.uuid).map(|channel| Notification {
                    channel,
                    payload: event.value,
                })
            });

        Ok(Subscription::spawn(notifications))
    }

    pub async fn disconnect(self) -> Result<()> {
        self.peripheral
            .disconnect()
            .await
            .context("failed to disconnect BLE peripheral")
    }
}

async fn find_by_name(adapter: &Adapter, name: &str, timeout: Duration) -> Result<Peripheral> {
    adapter
        .start_scan(ScanFilter::default())
        .await
        .context("failed to start BLE scan")?;
    log_info!("scanning for {name}");

    let deadline = Instant::now() + timeout;
    let found = loop {
        if let Some(peripheral) = match_name(adapter, name).await? {
            break Some(peripheral);
        }
        if Instant::now() >= deadline {
            break None;
        }
        sleep(SCAN_POLL).await;
    };

    if let Err(err) = adapter.stop_scan().await {
        log_warn!("failed to stop BLE scan: {err}");
    }
    found.ok_or_else(|| anyhow!("{name} not found within {}s", timeout.as_secs()))
}

async fn match_name(adapter: &Adapter, name: &str) -> Result<Option<Peripheral>> {
    for peripheral in adapter.peripherals().await.context("failed to list peripherals")? {
        let properties = peripheral.properties().await?;
        if properties.and_then(|p| p.local_name).as_deref() == Some(name) {
            return Ok(Some(peripheral));
        }
    }
    Ok(None)
}

use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::ble::{ReadingAssembler, Subscription};
use crate::device::DeviceClient;
use crate::models::{Assessment, Reading};

use super::forwarder::BackendForwarder;
use super::session::MonitorSession;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "relay";

use crate::{log_info, log_warn};

pub const READ_FAILED_ALERT: &str = "Could not fetch data from device.";

/// What the relay tells whoever is drawing the screen.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Sample {
        reading: Reading,
        flex_value: Option<i64>,
        assessment: Option<Assessment>,
    },
    /// Transient, user-facing problem. Acquisition carries on.
    Alert(String),
}

/// Where a fresh reading goes: session state, backend, UI.
#[derive(Clone)]
pub struct RelayTargets {
    pub session: MonitorSession,
    pub forwarder: Option<BackendForwarder>,
    pub events: mpsc::UnboundedSender<RelayEvent>,
}

impl RelayTargets {
    async fn publish(&self, reading: Reading, flex_value: Option<i64>) {
        let assessment = self.session.record(reading, flex_value).await;
        if let Some(forwarder) = &self.forwarder {
            forwarder.forward(reading);
        }
        let _ = self.events.send(RelayEvent::Sample {
            reading,
            flex_value,
            assessment,
        });
    }

    fn alert(&self, message: impl Into<String>) {
        let _ = self.events.send(RelayEvent::Alert(message.into()));
    }
}

/// Poll the device on a fixed cadence until cancelled.
pub async fn polling_loop(
    device: DeviceClient,
    targets: RelayTargets,
    period: Duration,
    read_timeout: Duration,
    cancel_token: CancellationToken,
) {
    // `interval` rejects a zero period.
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    log_info!(
        "polling {} every {}ms (session {})",
        device.base_url(),
        period.as_millis(),
        targets.session.id()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel_token.cancelled() => break,
        }

        let read = tokio::time::timeout(read_timeout, device.read_sample());
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            result = read => match result {
                Ok(Ok(sample)) => targets.publish(Reading::from(&sample), sample.flex_value).await,
                Ok(Err(err)) => {
                    log_warn!("device read failed: {err:?}");
                    targets.alert(READ_FAILED_ALERT);
                }
                Err(_) => {
                    log_warn!("device read timeout (> {}s)", read_timeout.as_secs());
                    targets.alert(READ_FAILED_ALERT);
                }
            },
        }
    }

    log_info!("polling loop shutting down");
}

/// Turn BLE field updates into readings until cancelled or the feed ends.
pub async fn notification_loop(
    mut subscription: Subscription,
    targets: RelayTargets,
    cancel_token: CancellationToken,
) {
    let mut assembler = ReadingAssembler::new();
    log_info!("listening for notifications (session {})", targets.session.id());

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            update = subscription.next() => {
                let Some(update) = update else {
                    targets.alert("BLE notifications stopped.");
                    break;
                };
                if let Some(reading) = assembler.apply(update) {
                    targets.publish(reading, None).await;
                }
            }
        }
    }

    if let Err(err) = subscription.unsubscribe().await {
        log_warn!("failed to unsubscribe: {err:?}");
    }
    log_info!("notification loop shutting down");
}

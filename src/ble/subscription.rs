use anyhow::{Context, Result};
use futures::{Stream, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::models::Reading;

use super::codec::{decode_payload, Channel};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "ble";

use crate::{log_info, log_warn};

const UPDATE_BUFFER: usize = 64;

/// One raw characteristic notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub channel: Channel,
    pub payload: Vec<u8>,
}

/// A decoded value for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldUpdate {
    pub channel: Channel,
    pub value: f64,
}

/// Merges per-channel updates into whole readings.
#[derive(Debug, Clone, Default)]
pub struct ReadingAssembler {
    angle_y: Option<f64>,
    angle_z: Option<f64>,
    flex_angle: Option<f64>,
}

impl ReadingAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `update`; returns the merged reading once every channel has reported.
    pub fn apply(&mut self, update: FieldUpdate) -> Option<Reading> {
        match update.channel {
            Channel::AngleY => self.angle_y = Some(update.value),
            Channel::AngleZ => self.angle_z = Some(update.value),
            Channel::FlexAngle => self.flex_angle = Some(update.value),
        }
        self.current()
    }

    pub fn current(&self) -> Option<Reading> {
        Some(Reading::new(self.angle_y?, self.angle_z?, self.flex_angle?))
    }
}

/// Live feed of decoded notifications. Dropping it stops the feed too.
pub struct Subscription {
    updates: mpsc::Receiver<FieldUpdate>,
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Pump `notifications` into a decoded update channel on a background task.
    pub fn spawn<S>(notifications: S) -> Self
    where
        S: Stream<Item = Notification> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(pump(notifications, tx, cancel_token.clone()));

        Self {
            updates: rx,
            cancel_token,
            handle: Some(handle),
        }
    }

    /// Next decoded update, or `None` once the source ended or was unsubscribed.
    pub async fn next(&mut self) -> Option<FieldUpdate> {
        self.updates.recv().await
    }

    /// Stop delivery and wait for the pump task to finish.
    pub async fn unsubscribe(mut self) -> Result<()> {
        self.cancel_token.cancel();
        self.updates.close();
        match self.handle.take() {
            Some(handle) => handle.await.context("notification pump failed to join"),
            None => Ok(()),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn pump<S>(notifications: S, tx: mpsc::Sender<FieldUpdate>, cancel_token: CancellationToken)
where
    S: Stream<Item = Notification> + Send + 'static,
{
    let mut notifications = Box::pin(notifications);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("notification feed unsubscribed");
                break;
            }
            next = notifications.next() => {
                let Some(notification) = next else {
                    log_info!("notification source ended");
                    break;
                };
                let value = match decode_payload(&notification.payload) {
                    Ok(value) => value,
                    Err(err) => {
                        log_warn!("dropping {:?} notification: {err}", notification.channel);
                        continue;
                    }
                };
                let update = FieldUpdate { channel: notification.channel, value };
                if tx.send(update).await.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as fmpsc;

    fn note(channel: Channel, text: &str) -> Notification {
        Notification {
            channel,
            payload: text.as_bytes().to_vec(),
        }
    }

    #[test]
    fn assembler_waits_for_all_channels() {
        let mut assembler = ReadingAssembler::new();
        assert!(assembler
            .apply(FieldUpdate { channel: Channel::AngleY, value: 1.0 })
            .is_none());
        assert!(assembler
            .apply(FieldUpdate { channel: Channel::FlexAngle, value: 20.0 })
            .is_none());

        let reading = assembler
            .apply(FieldUpdate { channel: Channel::AngleZ, value: -2.0 })
            .unwrap();
        assert_eq!(reading, Reading::new(1.0, -2.0, 20.0));

        let updated = assembler
            .apply(FieldUpdate { channel: Channel::FlexAngle, value: 26.0 })
            .unwrap();
        assert_eq!(updated, Reading::new(1.0, -2.0, 26.0));
    }

    #[tokio::test]
    async fn decodes_and_skips_bad_payloads() {
        let source = futures::stream::iter(vec![
            note(Channel::AngleY, "10.5"),
            note(Channel::AngleZ, "garbage"),
            note(Channel::FlexAngle, "33"),
        ]);
        let mut subscription = Subscription::spawn(source);

        assert_eq!(
            subscription.next().await,
            Some(FieldUpdate { channel: Channel::AngleY, value: 10.5 })
        );
        assert_eq!(
            subscription.next().await,
            Some(FieldUpdate { channel: Channel::FlexAngle, value: 33.0 })
        );
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn base64_bridge_payloads_decode_too() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        let source = futures::stream::iter(vec![Notification {
            channel: Channel::AngleZ,
            payload: STANDARD.encode("-7.25").into_bytes(),
        }]);
        let mut subscription = Subscription::spawn(source);

        assert_eq!(
            subscription.next().await,
            Some(FieldUpdate { channel: Channel::AngleZ, value: -7.25 })
        );
    }

    #[tokio::test]
    async fn unsubscribe_stops_an_open_source() {
        let (tx, rx) = fmpsc::unbounded();
        let mut subscription = Subscription::spawn(rx);

        tx.unbounded_send(note(Channel::AngleY, "1")).unwrap();
        assert!(subscription.next().await.is_some());

        subscription.unsubscribe().await.unwrap();
        // Nobody is listening any more; the pump dropped the receiver side.
        assert!(tx.unbounded_send(note(Channel::AngleY, "2")).is_err());
    }
}

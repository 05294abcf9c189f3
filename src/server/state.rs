use std::{
    path::PathBuf,
    sync::atomic::{AtomicI64, Ordering},
};

use tokio::sync::Mutex;

use crate::aggregator::{CsvRecordLog, RecordSink, SampleAggregator};
use crate::device::DeviceClient;
use crate::models::{LogRecord, Reading};
use crate::settings::ServerSettings;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "server";

use crate::{log_error, log_info};

pub const UNSET_BASELINE: i64 = -1;

/// Process-lifetime backend state, built once at startup and handed to every handler.
pub struct ServerState {
    pub device: DeviceClient,
    baseline: AtomicI64,
    pub aggregator: Mutex<SampleAggregator>,
    aggregate_log: CsvRecordLog,
    pub aggregate_log_path: PathBuf,
    pub label_log_path: PathBuf,
}

impl ServerState {
    pub fn new(settings: &ServerSettings) -> Self {
        Self {
            device: DeviceClient::new(&settings.device_url),
            baseline: AtomicI64::new(UNSET_BASELINE),
            aggregator: Mutex::new(SampleAggregator::new(settings.flush_interval())),
            aggregate_log: CsvRecordLog::new(&settings.aggregate_log_path),
            aggregate_log_path: settings.aggregate_log_path.clone(),
            label_log_path: settings.label_log_path.clone(),
        }
    }

    pub fn baseline(&self) -> i64 {
        self.baseline.load(Ordering::SeqCst)
    }

    pub fn set_baseline(&self, value: i64) {
        self.baseline.store(value, Ordering::SeqCst);
    }

    /// Buffer one reading. A window closed by it is written before returning.
    pub async fn ingest(&self, reading: Reading) -> Option<LogRecord> {
        let closed = self.aggregator.lock().await.push(reading);
        self.persist(closed?).await
    }

    /// Close whatever is buffered and write it; used on shutdown.
    pub async fn flush_pending(&self) -> Option<LogRecord> {
        let closed = self.aggregator.lock().await.close();
        self.persist(closed?).await
    }

    /// Append on the blocking pool so the lock and the async workers stay free.
    /// A failed write is logged; the window is gone either way.
    async fn persist(&self, record: LogRecord) -> Option<LogRecord> {
        let mut sink = self.aggregate_log.clone();
        let row = record.clone();
        match tokio::task::spawn_blocking(move || sink.append(&row)).await {
            Ok(Ok(())) => log_info!(
                "window closed: flex mean {:.1} (min {:.1}, max {:.1})",
                record.mean_flex_angle,
                record.min_flex_angle,
                record.max_flex_angle
            ),
            Ok(Err(err)) => log_error!("failed to write window summary: {err:?}"),
            Err(err) => log_error!("window write task failed: {err}"),
        }
        Some(record)
    }
}

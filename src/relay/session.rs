use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::classifier::Classifier;
use crate::models::{Assessment, Baseline, Reading};

/// Everything the monitor knows right now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub latest: Option<Reading>,
    /// Raw ADC count, when the firmware reports it.
    pub flex_value: Option<i64>,
    pub baseline: Option<Baseline>,
    pub assessment: Option<Assessment>,
    pub updated_at: Option<DateTime<Utc>>,
}

struct SessionState {
    latest: Option<Reading>,
    flex_value: Option<i64>,
    baseline: Option<Baseline>,
    assessment: Option<Assessment>,
    updated_at: Option<DateTime<Utc>>,
}

/// Client-side state for one monitoring run, shared by the relay and the UI.
#[derive(Clone)]
pub struct MonitorSession {
    id: Arc<str>,
    started_at: DateTime<Utc>,
    classifier: Classifier,
    state: Arc<Mutex<SessionState>>,
}

impl MonitorSession {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            id: Uuid::new_v4().to_string().into(),
            started_at: Utc::now(),
            classifier,
            state: Arc::new(Mutex::new(SessionState {
                latest: None,
                flex_value: None,
                baseline: None,
                assessment: None,
                updated_at: None,
            })),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Store a new reading and re-classify it against the current baseline.
    pub async fn record(&self, reading: Reading, flex_value: Option<i64>) -> Option<Assessment> {
        let mut state = self.state.lock().await;
        let assessment = self.classifier.assess(&reading, state.baseline.as_ref());
        state.latest = Some(reading);
        if flex_value.is_some() {
            state.flex_value = flex_value;
        }
        state.assessment = assessment;
        state.updated_at = Some(Utc::now());
        assessment
    }

    /// Snapshot the latest reading as the new baseline.
    pub async fn capture_baseline(&self) -> Result<Baseline> {
        let mut state = self.state.lock().await;
        let latest = state.latest.ok_or_else(|| anyhow!("No sensor data yet."))?;
        let baseline = Baseline::from(latest);
        state.baseline = Some(baseline);
        state.assessment = self.classifier.assess(&latest, Some(&baseline));
        Ok(baseline)
    }

    pub async fn clear_baseline(&self) {
        let mut state = self.state.lock().await;
        state.baseline = None;
        let latest = state.latest;
        state.assessment = latest.and_then(|latest| self.classifier.assess(&latest, None));
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            session_id: self.id.to_string(),
            started_at: self.started_at,
            latest: state.latest,
            flex_value: state.flex_value,
            baseline: state.baseline,
            assessment: state.assessment,
            updated_at: state.updated_at,
        }
    }
}

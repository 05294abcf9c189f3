//! Rows written to the append-only CSV logs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const AGGREGATE_CSV_HEADER: &str =
    "timestamp,mean_angleY,mean_angleZ,mean_flexAngle,min_flexAngle,max_flexAngle";

pub const LABEL_CSV_HEADER: &str = "timestamp,value,label";

/// Summary of one aggregation window. Values are already rounded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub mean_angle_y: f64,
    pub mean_angle_z: f64,
    pub mean_flex_angle: f64,
    pub min_flex_angle: f64,
    pub max_flex_angle: f64,
}

impl LogRecord {
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{:.2},{:.2},{:.1},{:.1},{:.1}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.mean_angle_y,
            self.mean_angle_z,
            self.mean_flex_angle,
            self.min_flex_angle,
            self.max_flex_angle,
        )
    }
}

/// True when `field` can sit in a row unquoted without changing its shape.
pub fn is_plain_field(field: &str) -> bool {
    !field.contains([',', '\r', '\n', '"'])
}

/// One labelled value from `GET /log`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRecord {
    pub timestamp: DateTime<Utc>,
    pub value: String,
    pub label: String,
}

impl LabelRecord {
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{}",
            self.timestamp.timestamp_millis(),
            self.value,
            self.label
        )
    }
}

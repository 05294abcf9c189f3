//! Sensor reading models shared by the backend and the monitor.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// One sample from the posture sensor: two tilt axes and the bend angle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub angle_y: f64,
    pub angle_z: f64,
    pub flex_angle: f64,
}

impl Reading {
    pub fn new(angle_y: f64, angle_z: f64, flex_angle: f64) -> Self {
        Self {
            angle_y,
            angle_z,
            flex_angle,
        }
    }
}

/// Reference snapshot captured on user action; lives for one monitor session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub flex_angle: f64,
    pub angle_y: f64,
    pub angle_z: f64,
}

impl From<Reading> for Baseline {
    fn from(reading: Reading) -> Self {
        Self {
            flex_angle: reading.flex_angle,
            angle_y: reading.angle_y,
            angle_z: reading.angle_z,
        }
    }
}

/// JSON body served by the device's `/read` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSample {
    pub angle_y: f64,
    pub angle_z: f64,
    /// Raw bend-sensor ADC count; older firmware does not send it.
    #[serde(default)]
    pub flex_value: Option<i64>,
    pub flex_angle: f64,
}

impl From<&DeviceSample> for Reading {
    fn from(sample: &DeviceSample) -> Self {
        Reading::new(sample.angle_y, sample.angle_z, sample.flex_angle)
    }
}

/// Whatever the device firmware answered on `/read`.
#[derive(Debug, Clone, PartialEq)]
pub enum DevicePayload {
    Sample(DeviceSample),
    /// First-generation firmware: a sentence with one embedded integer.
    Text { raw: String, value: i64 },
}

impl DevicePayload {
    pub fn parse(body: &str) -> Result<Self> {
        let trimmed = body.trim();
        if trimmed.starts_with('{') {
            let sample: DeviceSample = serde_json::from_str(trimmed)
                .map_err(|err| anyhow!("device JSON did not match the sample shape: {err}"))?;
            return Ok(DevicePayload::Sample(sample));
        }

        let value = extract_integer(trimmed)
            .ok_or_else(|| anyhow!("device body carries no reading: {trimmed:?}"))?;
        Ok(DevicePayload::Text {
            raw: trimmed.to_string(),
            value,
        })
    }

    pub fn reading(&self) -> Option<Reading> {
        match self {
            DevicePayload::Sample(sample) => Some(Reading::from(sample)),
            DevicePayload::Text { .. } => None,
        }
    }
}

/// First signed integer embedded anywhere in `text`.
pub fn extract_integer(text: &str) -> Option<i64> {
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx].is_ascii_digit() {
            let negative = idx > 0 && bytes[idx - 1] == b'-';
            let start = idx;
            while idx < bytes.len() && bytes[idx].is_ascii_digit() {
                idx += 1;
            }
            let digits: i64 = text[start..idx].parse().ok()?;
            return Some(if negative { -digits } else { digits });
        }
        idx += 1;
    }
    None
}

/// Leading-integer parse: optional sign then digits, rest ignored.
pub fn parse_leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let end = rest
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    rest[..end].parse::<i64>().ok().map(|value| sign * value)
}

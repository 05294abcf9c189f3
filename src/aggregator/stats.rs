use chrono::{DateTime, Utc};

use crate::models::{LogRecord, Reading};

/// Decimal places kept for tilt means.
pub const ANGLE_PRECISION: i32 = 2;
/// Decimal places kept for flex mean/min/max.
pub const FLEX_PRECISION: i32 = 1;

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Summarize a window into one record, or `None` when there is nothing to say.
pub fn summarize(readings: &[Reading], timestamp: DateTime<Utc>) -> Option<LogRecord> {
    if readings.is_empty() {
        return None;
    }

    let angle_y: Vec<f64> = readings.iter().map(|r| r.angle_y).collect();
    let angle_z: Vec<f64> = readings.iter().map(|r| r.angle_z).collect();
    let flex: Vec<f64> = readings.iter().map(|r| r.flex_angle).collect();

    let min_flex = flex.iter().copied().fold(f64::INFINITY, f64::min);
    let max_flex = flex.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(LogRecord {
        timestamp,
        mean_angle_y: round_to(mean(&angle_y), ANGLE_PRECISION),
        mean_angle_z: round_to(mean(&angle_z), ANGLE_PRECISION),
        mean_flex_angle: round_to(mean(&flex), FLEX_PRECISION),
        min_flex_angle: round_to(min_flex, FLEX_PRECISION),
        max_flex_angle: round_to(max_flex, FLEX_PRECISION),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn empty_window_has_no_summary() {
        assert!(summarize(&[], Utc::now()).is_none());
    }

    #[test]
    fn summary_rounds_each_field_to_its_precision() {
        let readings = [
            Reading::new(1.111, 2.0, 10.04),
            Reading::new(1.112, 2.02, 10.16),
            Reading::new(1.114, 2.04, 9.97),
        ];
        let record = summarize(&readings, Utc::now()).unwrap();

        assert_eq!(record.mean_angle_y, 1.11);
        assert_eq!(record.mean_angle_z, 2.02);
        assert_eq!(record.mean_flex_angle, 10.1);
        assert_eq!(record.min_flex_angle, 10.0);
        assert_eq!(record.max_flex_angle, 10.2);
    }

    #[test]
    fn single_reading_is_its_own_summary() {
        let record = summarize(&[Reading::new(-4.5, 3.25, 17.0)], Utc::now()).unwrap();
        assert_eq!(record.mean_angle_y, -4.5);
        assert_eq!(record.mean_angle_z, 3.25);
        assert_eq!(record.min_flex_angle, 17.0);
        assert_eq!(record.max_flex_angle, 17.0);
    }
}

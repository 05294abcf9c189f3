//! Threshold classification of a reading into per-channel posture labels.

pub mod config;

pub use config::{ThresholdPolicy, Thresholds};

use crate::models::{Assessment, Baseline, PostureLabel, Reading};

/// Classify `current` against `baseline` using the baseline-delta policy.
pub fn classify(current: &Reading, baseline: &Baseline) -> Assessment {
    let t = Thresholds::BASELINE_DELTA;
    Assessment {
        flex: flex_label((current.flex_angle - baseline.flex_angle).abs(), &t),
        gyro_y: gyro_label((current.angle_y - baseline.angle_y).abs(), t.gyro_y_max),
        gyro_z: gyro_label((current.angle_z - baseline.angle_z).abs(), t.gyro_z_max),
    }
}

/// Classify raw magnitudes without a baseline.
pub fn classify_absolute(current: &Reading) -> Assessment {
    let t = Thresholds::ABSOLUTE;
    Assessment {
        flex: flex_label(current.flex_angle, &t),
        gyro_y: gyro_label(current.angle_y.abs(), t.gyro_y_max),
        gyro_z: gyro_label(current.angle_z.abs(), t.gyro_z_max),
    }
}

fn flex_label(value: f64, t: &Thresholds) -> PostureLabel {
    if value <= t.flex_good_max {
        PostureLabel::Good
    } else if value <= t.flex_slouch_max {
        PostureLabel::Slouching
    } else {
        PostureLabel::Bad
    }
}

fn gyro_label(value: f64, max: f64) -> PostureLabel {
    if value <= max {
        PostureLabel::Good
    } else {
        PostureLabel::Bad
    }
}

/// A classifier bound to exactly one policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    policy: ThresholdPolicy,
}

impl Classifier {
    pub fn new(policy: ThresholdPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    /// `None` when the delta policy has no baseline to compare against.
    pub fn assess(&self, current: &Reading, baseline: Option<&Baseline>) -> Option<Assessment> {
        match self.policy {
            ThresholdPolicy::BaselineDelta => baseline.map(|b| classify(current, b)),
            ThresholdPolicy::Absolute => Some(classify_absolute(current)),
        }
    }
}

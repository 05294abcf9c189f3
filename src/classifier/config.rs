use serde::{Deserialize, Serialize};

/// Which quantity the thresholds are compared against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdPolicy {
    /// Distance from the captured baseline. Needs a baseline.
    #[default]
    BaselineDelta,
    /// Raw reading magnitude. Baseline is ignored.
    Absolute,
}

/// Fixed cut-offs for one policy. A value equal to a cut-off gets the better label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Flex at or below this is good.
    pub flex_good_max: f64,
    /// Flex above `flex_good_max` and at or below this is slouching.
    pub flex_slouch_max: f64,
    pub gyro_y_max: f64,
    pub gyro_z_max: f64,
}

impl Thresholds {
    pub const BASELINE_DELTA: Thresholds = Thresholds {
        flex_good_max: 15.0,
        flex_slouch_max: 25.0,
        gyro_y_max: 90.0,
        gyro_z_max: 90.0,
    };

    pub const ABSOLUTE: Thresholds = Thresholds {
        flex_good_max: 15.0,
        flex_slouch_max: 35.0,
        gyro_y_max: 35.0,
        gyro_z_max: 45.0,
    };
}

impl ThresholdPolicy {
    pub fn thresholds(&self) -> Thresholds {
        match self {
            ThresholdPolicy::BaselineDelta => Thresholds::BASELINE_DELTA,
            ThresholdPolicy::Absolute => Thresholds::ABSOLUTE,
        }
    }
}

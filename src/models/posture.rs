use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PostureLabel {
    Good,
    Slouching,
    Bad,
}

impl PostureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostureLabel::Good => "good posture",
            PostureLabel::Slouching => "slouching",
            PostureLabel::Bad => "bad posture",
        }
    }
}

impl fmt::Display for PostureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-channel labels for one reading. Gyro axes never report `Slouching`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub flex: PostureLabel,
    pub gyro_y: PostureLabel,
    pub gyro_z: PostureLabel,
}

//! Pure render functions from readings and labels to terminal views.

use std::fmt;

use crate::models::{Assessment, PostureLabel, Reading};
use crate::relay::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Orange,
    Red,
    Gray,
}

impl Color {
    pub fn name(&self) -> &'static str {
        match self {
            Color::Green => "green",
            Color::Orange => "orange",
            Color::Red => "red",
            Color::Gray => "gray",
        }
    }

    fn ansi(&self) -> &'static str {
        match self {
            Color::Green => "\x1b[32m",
            Color::Orange => "\x1b[33m",
            Color::Red => "\x1b[31m",
            Color::Gray => "\x1b[90m",
        }
    }
}

pub fn color_for(label: Option<PostureLabel>) -> Color {
    match label {
        Some(PostureLabel::Good) => Color::Green,
        Some(PostureLabel::Slouching) => Color::Orange,
        Some(PostureLabel::Bad) => Color::Red,
        None => Color::Gray,
    }
}

/// One stick figure: a head on a torso, tilted by `rotation_deg`.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureView {
    pub title: &'static str,
    pub value_text: String,
    pub rotation_deg: f64,
    pub color: Color,
    pub label: Option<PostureLabel>,
}

impl FigureView {
    pub fn status_text(&self) -> &'static str {
        match self.label {
            Some(PostureLabel::Good) => "Good posture!",
            Some(PostureLabel::Slouching) => "Slouching",
            Some(PostureLabel::Bad) => "Bad posture!",
            None => "",
        }
    }

    /// Torso glyph closest to the figure's tilt.
    fn torso_glyph(&self) -> char {
        let tilt = self.rotation_deg.rem_euclid(180.0);
        if tilt < 22.5 || tilt >= 157.5 {
            '|'
        } else if tilt < 67.5 {
            '/'
        } else if tilt < 112.5 {
            '-'
        } else {
            '\\'
        }
    }
}

impl fmt::Display for FigureView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const RESET: &str = "\x1b[0m";
        let color = self.color.ansi();
        writeln!(f, "{} ({})", self.title, self.value_text)?;
        writeln!(f, "  {color}O{RESET}   rotate {:+.1}°", self.rotation_deg)?;
        write!(
            f,
            "  {color}{}{RESET}   {color}{}{RESET}",
            self.torso_glyph(),
            self.status_text()
        )
    }
}

/// Flex, forward-backward and sideways figures, in that order.
///
/// Sideways tilt is drawn mirrored so that leaning right tips the figure right.
pub fn render_figures(reading: &Reading, assessment: Option<&Assessment>) -> [FigureView; 3] {
    [
        FigureView {
            title: "Flex Sensor",
            value_text: format!("Flex Angle: {:.1}°", reading.flex_angle),
            rotation_deg: reading.flex_angle,
            color: color_for(assessment.map(|a| a.flex)),
            label: assessment.map(|a| a.flex),
        },
        FigureView {
            title: "Gyro Y (Forward-Backward Tilt)",
            value_text: format!("Angle Y: {:.1}°", reading.angle_y),
            rotation_deg: reading.angle_y,
            color: color_for(assessment.map(|a| a.gyro_y)),
            label: assessment.map(|a| a.gyro_y),
        },
        FigureView {
            title: "Gyro Z (Sideways Tilt)",
            value_text: format!("Angle Z: {:.1}°", reading.angle_z),
            rotation_deg: -reading.angle_z,
            color: color_for(assessment.map(|a| a.gyro_z)),
            label: assessment.map(|a| a.gyro_z),
        },
    ]
}

/// Numeric readout lines for the live panel.
pub fn render_readout(reading: &Reading, flex_value: Option<i64>) -> Vec<String> {
    let mut lines = vec![
        format!("Angle Y: {:.2}°", reading.angle_y),
        format!("Angle Z: {:.2}°", reading.angle_z),
    ];
    if let Some(raw) = flex_value {
        lines.push(format!("Flex Value: {raw}"));
    }
    lines.push(format!("Flex Angle: {:.1}°", reading.flex_angle));
    lines
}

/// Whole screen for one snapshot.
pub fn render_dashboard(snapshot: &SessionSnapshot) -> String {
    let Some(reading) = snapshot.latest else {
        return "Loading data...".to_string();
    };

    let mut out = render_readout(&reading, snapshot.flex_value).join("\n");
    match &snapshot.baseline {
        Some(baseline) => out.push_str(&format!(
            "\nBaseline: flex {:.1}°, Y {:.2}°, Z {:.2}°",
            baseline.flex_angle, baseline.angle_y, baseline.angle_z
        )),
        None => out.push_str("\nNo baseline set (type `b` + Enter to capture one)"),
    }
    for figure in render_figures(&reading, snapshot.assessment.as_ref()) {
        out.push_str("\n\n");
        out.push_str(&figure.to_string());
    }
    out
}

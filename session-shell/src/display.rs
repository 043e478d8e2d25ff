//! Text and styling projected from telemetry for the readout panels.

use chrono::{DateTime, FixedOffset};
use signal_core::{Channel, ChannelGroup};
use telemetry_feed::{FatigueLevel, MlResults, TelemetryFrame};

/// Shown wherever a value has not arrived yet.
pub const PLACEHOLDER: &str = "-";

/// CSS class for a fatigue level; `None` for unknown and unrecognized values.
pub fn severity_class(level: &FatigueLevel) -> Option<&'static str> {
    match level {
        FatigueLevel::Low => Some("fatigue-low"),
        FatigueLevel::Medium => Some("fatigue-medium"),
        FatigueLevel::High => Some("fatigue-high"),
        FatigueLevel::Unknown | FatigueLevel::Other(_) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatigueBadge {
    pub text: String,
    pub class: Option<&'static str>,
}

impl FatigueBadge {
    pub fn from_level(level: &FatigueLevel) -> Self {
        Self {
            text: level.as_str().to_string(),
            class: severity_class(level),
        }
    }
}

impl Default for FatigueBadge {
    fn default() -> Self {
        Self::from_level(&FatigueLevel::Unknown)
    }
}

/// Format a last-repetition timestamp as `HH:MM:SS` at the given UTC offset.
/// Zero or absent timestamps give the placeholder, never an epoch date.
pub fn format_rep_time(epoch_secs: Option<f64>, utc_offset_minutes: i32) -> String {
    let Some(secs) = epoch_secs.filter(|t| t.is_finite() && *t > 0.0) else {
        return PLACEHOLDER.to_string();
    };
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    let Some(utc) = DateTime::from_timestamp(whole, nanos) else {
        return PLACEHOLDER.to_string();
    };
    match FixedOffset::east_opt(utc_offset_minutes * 60) {
        Some(offset) => utc.with_timezone(&offset).format("%H:%M:%S").to_string(),
        None => utc.format("%H:%M:%S").to_string(),
    }
}

/// Display fields of the ML results panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MlDisplay {
    pub exercise: String,
    pub rep_count: String,
    pub bicep: FatigueBadge,
    pub shoulder: FatigueBadge,
    pub last_rep: String,
}

impl Default for MlDisplay {
    fn default() -> Self {
        Self {
            exercise: "unknown".to_string(),
            rep_count: "0".to_string(),
            bicep: FatigueBadge::default(),
            shoulder: FatigueBadge::default(),
            last_rep: PLACEHOLDER.to_string(),
        }
    }
}

impl MlDisplay {
    pub fn project(ml: &MlResults, utc_offset_minutes: i32) -> Self {
        Self {
            exercise: ml.exercise.clone(),
            rep_count: ml.rep_count.to_string(),
            bicep: FatigueBadge::from_level(&ml.bicep_fatigue),
            shoulder: FatigueBadge::from_level(&ml.shoulder_fatigue),
            last_rep: format_rep_time(ml.last_rep_time, utc_offset_minutes),
        }
    }
}

/// Plain-text values of the live readout rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readouts {
    values: Vec<(Channel, String)>,
    pub emg_time: String,
}

impl Default for Readouts {
    fn default() -> Self {
        Self {
            values: Channel::ALL
                .into_iter()
                .map(|c| (c, PLACEHOLDER.to_string()))
                .collect(),
            emg_time: PLACEHOLDER.to_string(),
        }
    }
}

impl Readouts {
    /// IMU axes get two decimals; EMG values are shown as received.
    pub fn from_frame(frame: &TelemetryFrame) -> Self {
        let values = frame
            .samples()
            .map(|(c, v)| {
                let text = match c.group() {
                    ChannelGroup::Emg => format_raw(v),
                    _ => format!("{v:.2}"),
                };
                (c, text)
            })
            .collect();
        Self {
            values,
            emg_time: frame
                .emg_time
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        }
    }

    pub fn get(&self, channel: Channel) -> &str {
        self.values
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, v)| v.as_str())
            .unwrap_or(PLACEHOLDER)
    }
}

fn format_raw(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

use serde::{Deserialize, Serialize};
use signal_core::{Channel, WindowError, WindowSet};
use thiserror::Error;

pub mod ble;
pub mod wire;

pub use wire::{
    ApiReply, ConnectionStatus, DataSnapshot, EmptyBody, FileList, RawEmg, RawImu, RawMlResults,
    RepModeRequest, StartSessionRequest,
};

#[derive(Debug, Error, PartialEq)]
pub enum FeedError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("non-finite sample in {0}")]
    NonFinite(&'static str),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Fatigue classification reported by the ML pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FatigueLevel {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
    /// Anything else the backend sends; displayed verbatim.
    Other(String),
}

impl FatigueLevel {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "low" => FatigueLevel::Low,
            "medium" => FatigueLevel::Medium,
            "high" => FatigueLevel::High,
            "unknown" | "" => FatigueLevel::Unknown,
            other => FatigueLevel::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FatigueLevel::Low => "low",
            FatigueLevel::Medium => "medium",
            FatigueLevel::High => "high",
            FatigueLevel::Unknown => "unknown",
            FatigueLevel::Other(s) => s,
        }
    }
}

/// Validated ML block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlResults {
    pub exercise: String,
    pub rep_count: u32,
    pub bicep_fatigue: FatigueLevel,
    pub shoulder_fatigue: FatigueLevel,
    /// Seconds since the Unix epoch; `None` when absent or zero.
    pub last_rep_time: Option<f64>,
}

impl Default for MlResults {
    fn default() -> Self {
        Self {
            exercise: "unknown".to_string(),
            rep_count: 0,
            bicep_fatigue: FatigueLevel::Unknown,
            shoulder_fatigue: FatigueLevel::Unknown,
            last_rep_time: None,
        }
    }
}

impl From<&RawMlResults> for MlResults {
    fn from(raw: &RawMlResults) -> Self {
        let exercise = raw
            .exercise
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string();
        Self {
            exercise,
            rep_count: raw.rep_count.unwrap_or(0),
            bicep_fatigue: FatigueLevel::parse(raw.bicep_fatigue.as_deref().unwrap_or("")),
            shoulder_fatigue: FatigueLevel::parse(raw.shoulder_fatigue.as_deref().unwrap_or("")),
            last_rep_time: raw.last_rep_time.filter(|t| t.is_finite() && *t > 0.0),
        }
    }
}

/// One poll tick that passed validation: every channel carries a finite sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryFrame {
    samples: [f64; 9],
    pub emg_time: Option<String>,
    pub ml: Option<MlResults>,
}

impl TelemetryFrame {
    pub fn sample(&self, channel: Channel) -> f64 {
        self.samples[channel as usize]
    }

    pub fn samples(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL.into_iter().map(move |c| (c, self.sample(c)))
    }
}

fn field_path(channel: Channel) -> &'static str {
    match channel {
        Channel::AccelX => "imu.accel_x",
        Channel::AccelY => "imu.accel_y",
        Channel::AccelZ => "imu.accel_z",
        Channel::GyroX => "imu.gyro_x",
        Channel::GyroY => "imu.gyro_y",
        Channel::GyroZ => "imu.gyro_z",
        Channel::EmgBicep => "emg.bicep",
        Channel::EmgShoulder => "emg.shoulder",
        Channel::EmgTricep => "emg.tricep",
    }
}

fn raw_sample(snapshot: &DataSnapshot, channel: Channel) -> Result<Option<f64>, FeedError> {
    let value = match channel {
        Channel::AccelX | Channel::AccelY | Channel::AccelZ | Channel::GyroX | Channel::GyroY
        | Channel::GyroZ => {
            let imu = snapshot.imu.as_ref().ok_or(FeedError::MissingField("imu"))?;
            match channel {
                Channel::AccelX => imu.accel_x,
                Channel::AccelY => imu.accel_y,
                Channel::AccelZ => imu.accel_z,
                Channel::GyroX => imu.gyro_x,
                Channel::GyroY => imu.gyro_y,
                _ => imu.gyro_z,
            }
        }
        Channel::EmgBicep | Channel::EmgShoulder | Channel::EmgTricep => {
            let emg = snapshot.emg.as_ref().ok_or(FeedError::MissingField("emg"))?;
            match channel {
                Channel::EmgBicep => emg.bicep,
                Channel::EmgShoulder => emg.shoulder,
                _ => emg.tricep,
            }
        }
    };
    Ok(value)
}

fn display_time(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Check that the snapshot carries every channel; a tick that fails is skipped whole.
pub fn validate(snapshot: &DataSnapshot) -> Result<TelemetryFrame, FeedError> {
    let mut samples = [0.0; 9];
    for channel in Channel::ALL {
        let path = field_path(channel);
        let value = raw_sample(snapshot, channel)?.ok_or(FeedError::MissingField(path))?;
        if !value.is_finite() {
            return Err(FeedError::NonFinite(path));
        }
        samples[channel as usize] = value;
    }
    let emg_time = snapshot
        .emg
        .as_ref()
        .and_then(|e| e.time.as_ref())
        .filter(|v| !v.is_null())
        .map(display_time);
    let ml = snapshot.ml_results.as_ref().map(MlResults::from);
    Ok(TelemetryFrame {
        samples,
        emg_time,
        ml,
    })
}

/// Decode and validate a `/api/data` body.
pub fn parse_snapshot(json: &str) -> Result<TelemetryFrame, FeedError> {
    let snapshot: DataSnapshot =
        serde_json::from_str(json).map_err(|e| FeedError::Decode(e.to_string()))?;
    validate(&snapshot)
}

/// Consumer interface for validated frames.
pub trait TelemetrySink {
    fn on_frame(&mut self, frame: &TelemetryFrame);
}

/// Sliding windows for every channel, fed by validated frames.
#[derive(Debug, Clone, Default)]
pub struct WindowStore {
    windows: WindowSet,
}

impl WindowStore {
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        Ok(Self {
            windows: WindowSet::new(capacity)?,
        })
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    /// Validate `snapshot` and, only if it is complete, push it into every window.
    pub fn ingest(&mut self, snapshot: &DataSnapshot) -> Result<TelemetryFrame, FeedError> {
        let frame = validate(snapshot)?;
        self.on_frame(&frame);
        Ok(frame)
    }
}

impl TelemetrySink for WindowStore {
    fn on_frame(&mut self, frame: &TelemetryFrame) {
        for (channel, sample) in frame.samples() {
            self.windows.push(channel, sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::{decode_f32_le, BleError, BleLink, BleReadings, ImuCharacteristic};

    const FULL: &str = r#"{
        "imu": {"accel_x": 1.5, "accel_y": -2.25, "accel_z": 9.81,
                "gyro_x": 10.0, "gyro_y": -20.0, "gyro_z": 30.0},
        "emg": {"time": 1200, "bicep": 512, "shoulder": 300, "tricep": 75},
        "ml_results": {"exercise": "bicep_curl", "rep_count": 4,
                       "bicep_fatigue": "medium", "shoulder_fatigue": "tired",
                       "last_rep_time": 0}
    }"#;

    #[test]
    fn full_snapshot_validates() {
        let frame = parse_snapshot(FULL).unwrap();
        assert_eq!(frame.sample(Channel::AccelZ), 9.81);
        assert_eq!(frame.sample(Channel::EmgBicep), 512.0);
        assert_eq!(frame.emg_time.as_deref(), Some("1200"));
        let ml = frame.ml.unwrap();
        assert_eq!(ml.exercise, "bicep_curl");
        assert_eq!(ml.rep_count, 4);
        assert_eq!(ml.bicep_fatigue, FatigueLevel::Medium);
        assert_eq!(ml.shoulder_fatigue, FatigueLevel::Other("tired".into()));
        assert_eq!(ml.last_rep_time, None);
    }

    #[test]
    fn missing_channel_is_rejected() {
        let mut snap: DataSnapshot = serde_json::from_str(FULL).unwrap();
        snap.emg.as_mut().unwrap().shoulder = None;
        assert_eq!(validate(&snap), Err(FeedError::MissingField("emg.shoulder")));

        snap.imu = None;
        assert_eq!(validate(&snap), Err(FeedError::MissingField("imu")));
    }

    #[test]
    fn rejected_snapshot_leaves_windows_untouched() {
        let mut store = WindowStore::new(5).unwrap();
        let good: DataSnapshot = serde_json::from_str(FULL).unwrap();
        store.ingest(&good).unwrap();
        let before = store.windows().clone();

        let mut bad = good.clone();
        bad.imu.as_mut().unwrap().gyro_z = None;
        assert!(store.ingest(&bad).is_err());
        assert_eq!(store.windows(), &before);
    }

    #[test]
    fn off_type_ml_fields_do_not_drop_the_tick() {
        let json = FULL
            .replace(r#""rep_count": 4"#, r#""rep_count": 4.0"#)
            .replace(r#""bicep_fatigue": "medium""#, r#""bicep_fatigue": 3"#)
            .replace(r#""last_rep_time": 0"#, r#""last_rep_time": "soon""#);
        let snap: DataSnapshot = serde_json::from_str(&json).unwrap();
        let mut store = WindowStore::new(5).unwrap();
        let frame = store.ingest(&snap).unwrap();
        assert_eq!(store.windows().window(Channel::EmgTricep).latest(), 75.0);
        let ml = frame.ml.unwrap();
        assert_eq!(ml.rep_count, 4);
        assert_eq!(ml.bicep_fatigue, FatigueLevel::Unknown);
        assert_eq!(ml.last_rep_time, None);
    }

    #[test]
    fn malformed_ml_block_reads_as_absent() {
        let json = r#"{"imu": {"accel_x": 0, "accel_y": 0, "accel_z": 0,
                               "gyro_x": 0, "gyro_y": 0, "gyro_z": 0},
                       "emg": {"bicep": 1, "shoulder": 2, "tricep": 3},
                       "ml_results": "warming up"}"#;
        assert!(parse_snapshot(json).unwrap().ml.is_none());

        let fractional = FULL.replace(r#""rep_count": 4"#, r#""rep_count": 4.5"#);
        assert_eq!(parse_snapshot(&fractional).unwrap().ml.unwrap().rep_count, 0);
    }

    #[test]
    fn file_list_tolerates_missing_field() {
        let list: FileList = serde_json::from_str(r#"{"files": ["b_imu.csv", "a_emg.csv"]}"#).unwrap();
        assert_eq!(list.files, vec!["b_imu.csv", "a_emg.csv"]);
        let empty: FileList = serde_json::from_str("{}").unwrap();
        assert!(empty.files.is_empty());
    }

    #[test]
    fn non_finite_sample_is_rejected() {
        let mut snap: DataSnapshot = serde_json::from_str(FULL).unwrap();
        snap.imu.as_mut().unwrap().accel_x = Some(f64::INFINITY);
        assert_eq!(validate(&snap), Err(FeedError::NonFinite("imu.accel_x")));
    }

    #[test]
    fn ingest_appends_newest_last_for_every_channel() {
        let mut store = WindowStore::new(3).unwrap();
        let snap: DataSnapshot = serde_json::from_str(FULL).unwrap();
        for _ in 0..10 {
            store.ingest(&snap).unwrap();
        }
        for channel in Channel::ALL {
            let w = store.windows().window(channel);
            assert_eq!(w.len(), 3);
            assert_eq!(w.latest(), snap_value(&snap, channel));
        }
    }

    fn snap_value(snap: &DataSnapshot, channel: Channel) -> f64 {
        raw_sample(snap, channel).unwrap().unwrap()
    }

    #[test]
    fn missing_ml_block_is_not_an_error() {
        let json = r#"{"imu": {"accel_x": 0, "accel_y": 0, "accel_z": 0,
                               "gyro_x": 0, "gyro_y": 0, "gyro_z": 0},
                       "emg": {"bicep": 1, "shoulder": 2, "tricep": 3}}"#;
        let frame = parse_snapshot(json).unwrap();
        assert!(frame.ml.is_none());
        assert!(frame.emg_time.is_none());
    }

    #[test]
    fn garbage_body_is_decode_error() {
        assert!(matches!(parse_snapshot("not json"), Err(FeedError::Decode(_))));
    }

    #[test]
    fn ml_defaults_fill_gaps() {
        let ml = MlResults::from(&RawMlResults::default());
        assert_eq!(ml, MlResults::default());
    }

    #[test]
    fn connection_status_failure_needs_both_down_and_message() {
        let mut status = ConnectionStatus {
            connection_message: "Failed to connect IMU".into(),
            ..Default::default()
        };
        assert!(status.is_failure());
        status.emg_connected = true;
        assert!(!status.is_failure());
        status.imu_connected = true;
        assert!(status.both_connected());
    }

    #[test]
    fn ble_payload_decodes_little_endian() {
        assert_eq!(decode_f32_le(&[0, 0, 128, 63]), Ok(1.0));
        assert_eq!(decode_f32_le(&[0, 0, 128]), Err(BleError::ShortPayload(3)));
        let mut readings = BleReadings::default();
        assert_eq!(readings.display(ImuCharacteristic::GyroY), "-");
        readings
            .apply(ImuCharacteristic::GyroY, &(-2.5f32).to_le_bytes())
            .unwrap();
        assert_eq!(readings.display(ImuCharacteristic::GyroY), "-2.50");
    }

    #[test]
    fn ble_characteristics_map_to_imu_channels() {
        assert_eq!(ImuCharacteristic::GyroX.uuid(), "19b10014-e8f2-537e-4f6c-d104768a1214");
        assert_eq!(ImuCharacteristic::GyroX.channel(), Channel::GyroX);
    }

    #[test]
    fn ble_link_messages() {
        assert!(BleLink::default().can_connect());
        assert!(!BleLink::Connecting.can_connect());
        assert_eq!(
            BleLink::Failed("User cancelled the requestDevice() chooser.".into()).message(),
            "Connection failed: User cancelled the requestDevice() chooser."
        );
        assert_eq!(BleLink::Connected.message(), "Connected to IMU device");
    }
}

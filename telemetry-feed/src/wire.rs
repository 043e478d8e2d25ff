//! Request and response bodies of the dashboard REST surface.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `status` value the backend uses for accepted requests.
pub const STATUS_SUCCESS: &str = "success";

/// Generic `{status, message}` reply returned by every mutating endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiReply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Body of `POST /api/start_session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub session_name: String,
    pub emg_port: String,
    pub emg_baudrate: u32,
}

/// Body of `POST /api/set_rep_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepModeRequest {
    pub automatic: bool,
}

/// Empty JSON object sent to `stop_session` and `manual_rep`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyBody {}

/// Reply of `GET /api/connection_status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    #[serde(default)]
    pub connection_message: String,
    #[serde(default)]
    pub imu_connected: bool,
    #[serde(default)]
    pub emg_connected: bool,
    #[serde(default)]
    pub session_active: bool,
}

impl ConnectionStatus {
    pub fn both_connected(&self) -> bool {
        self.imu_connected && self.emg_connected
    }

    /// Neither device came up and the backend says the attempt failed.
    pub fn is_failure(&self) -> bool {
        !self.imu_connected && !self.emg_connected && self.connection_message.contains("Failed")
    }
}

/// Raw IMU block of `/api/data`; every field may be missing on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawImu {
    pub accel_x: Option<f64>,
    pub accel_y: Option<f64>,
    pub accel_z: Option<f64>,
    pub gyro_x: Option<f64>,
    pub gyro_y: Option<f64>,
    pub gyro_z: Option<f64>,
}

/// Raw EMG block of `/api/data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEmg {
    /// Device clock; shown verbatim, not charted.
    pub time: Option<serde_json::Value>,
    pub bicep: Option<f64>,
    pub shoulder: Option<f64>,
    pub tricep: Option<f64>,
}

/// Raw ML block of `/api/data`.
///
/// Decoding never fails: a field of the wrong type reads as absent, so a
/// malformed ML block cannot cost the channel samples of the same tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMlResults {
    #[serde(default, deserialize_with = "lenient")]
    pub exercise: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub rep_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub bicep_fatigue: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub shoulder_fatigue: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_rep_time: Option<f64>,
}

/// Reply of `GET /api/data` before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSnapshot {
    pub imu: Option<RawImu>,
    pub emg: Option<RawEmg>,
    #[serde(default, deserialize_with = "lenient")]
    pub ml_results: Option<RawMlResults>,
}

/// Reply of `GET /files/api/files`: recorded CSV names, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<String>,
}

fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Counts may arrive as integral floats (`4.0`) from the ML pipeline.
fn lenient_count<'de, D>(de: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

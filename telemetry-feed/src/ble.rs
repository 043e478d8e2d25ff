//! GATT layout of the BLE IMU peripheral and payload decoding.

use signal_core::Channel;
use thiserror::Error;

/// Devices offered in the chooser must advertise a name with this prefix.
pub const DEVICE_NAME_PREFIX: &str = "Arduino";

/// Primary service exposing the six IMU characteristics.
pub const SERVICE_UUID: &str = "19b10010-e8f2-537e-4f6c-d104768a1214";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BleError {
    #[error("characteristic payload too short: {0} bytes")]
    ShortPayload(usize),
}

/// Notifying characteristic carrying one IMU axis as a little-endian f32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImuCharacteristic {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl ImuCharacteristic {
    pub const ALL: [ImuCharacteristic; 6] = [
        ImuCharacteristic::AccelX,
        ImuCharacteristic::AccelY,
        ImuCharacteristic::AccelZ,
        ImuCharacteristic::GyroX,
        ImuCharacteristic::GyroY,
        ImuCharacteristic::GyroZ,
    ];

    pub fn uuid(&self) -> &'static str {
        match self {
            ImuCharacteristic::AccelX => "19b10011-e8f2-537e-4f6c-d104768a1214",
            ImuCharacteristic::AccelY => "19b10012-e8f2-537e-4f6c-d104768a1214",
            ImuCharacteristic::AccelZ => "19b10013-e8f2-537e-4f6c-d104768a1214",
            ImuCharacteristic::GyroX => "19b10014-e8f2-537e-4f6c-d104768a1214",
            ImuCharacteristic::GyroY => "19b10015-e8f2-537e-4f6c-d104768a1214",
            ImuCharacteristic::GyroZ => "19b10016-e8f2-537e-4f6c-d104768a1214",
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            ImuCharacteristic::AccelX => Channel::AccelX,
            ImuCharacteristic::AccelY => Channel::AccelY,
            ImuCharacteristic::AccelZ => Channel::AccelZ,
            ImuCharacteristic::GyroX => Channel::GyroX,
            ImuCharacteristic::GyroY => Channel::GyroY,
            ImuCharacteristic::GyroZ => Channel::GyroZ,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Read the leading little-endian f32 of a notification payload.
pub fn decode_f32_le(payload: &[u8]) -> Result<f32, BleError> {
    match payload {
        [a, b, c, d, ..] => Ok(f32::from_le_bytes([*a, *b, *c, *d])),
        _ => Err(BleError::ShortPayload(payload.len())),
    }
}

/// Progress of the Web Bluetooth connection, as shown in the BLE panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BleLink {
    #[default]
    Idle,
    Scanning,
    Connecting,
    Connected,
    Failed(String),
    Disconnected,
}

impl BleLink {
    pub fn message(&self) -> String {
        match self {
            BleLink::Idle => "Not connected".to_string(),
            BleLink::Scanning => "Scanning for devices...".to_string(),
            BleLink::Connecting => "Device selected, connecting...".to_string(),
            BleLink::Connected => "Connected to IMU device".to_string(),
            BleLink::Failed(detail) => format!("Connection failed: {detail}"),
            BleLink::Disconnected => "Device disconnected".to_string(),
        }
    }

    /// The connect button is only offered when no attempt is in progress or live.
    pub fn can_connect(&self) -> bool {
        matches!(self, BleLink::Idle | BleLink::Failed(_) | BleLink::Disconnected)
    }
}

/// Latest value seen on each characteristic.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BleReadings {
    values: [Option<f32>; 6],
}

impl BleReadings {
    pub fn apply(&mut self, characteristic: ImuCharacteristic, payload: &[u8]) -> Result<f32, BleError> {
        let value = decode_f32_le(payload)?;
        self.values[characteristic.index()] = Some(value);
        Ok(value)
    }

    pub fn get(&self, characteristic: ImuCharacteristic) -> Option<f32> {
        self.values[characteristic.index()]
    }

    /// Two-decimal text, or `-` before the first notification.
    pub fn display(&self, characteristic: ImuCharacteristic) -> String {
        self.get(characteristic)
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".to_string())
    }
}

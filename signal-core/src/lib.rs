use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default number of samples kept per channel.
pub const DEFAULT_WINDOW_CAPACITY: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window capacity must be non-zero")]
    ZeroCapacity,
}

/// Chart grouping: one plot per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelGroup {
    Accel,
    Gyro,
    Emg,
}

impl ChannelGroup {
    pub const ALL: [ChannelGroup; 3] = [ChannelGroup::Accel, ChannelGroup::Gyro, ChannelGroup::Emg];

    pub fn title(&self) -> &'static str {
        match self {
            ChannelGroup::Accel => "Accelerometer",
            ChannelGroup::Gyro => "Gyroscope",
            ChannelGroup::Emg => "EMG Signals",
        }
    }

    /// Fixed y-axis range used by the charts.
    pub fn axis_range(&self) -> AxisRange {
        match self {
            ChannelGroup::Accel => AxisRange::new(-20.0, 20.0),
            ChannelGroup::Gyro => AxisRange::new(-250.0, 250.0),
            ChannelGroup::Emg => AxisRange::new(0.0, 1000.0),
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ChannelGroup::Accel => "m/s²",
            ChannelGroup::Gyro => "°/s",
            ChannelGroup::Emg => "",
        }
    }

    pub fn channels(&self) -> [Channel; 3] {
        match self {
            ChannelGroup::Accel => [Channel::AccelX, Channel::AccelY, Channel::AccelZ],
            ChannelGroup::Gyro => [Channel::GyroX, Channel::GyroY, Channel::GyroZ],
            ChannelGroup::Emg => [Channel::EmgBicep, Channel::EmgShoulder, Channel::EmgTricep],
        }
    }

    /// DOM id used for the group's canvas.
    pub fn canvas_id(&self) -> &'static str {
        match self {
            ChannelGroup::Accel => "imu-accel-plot",
            ChannelGroup::Gyro => "imu-gyro-plot",
            ChannelGroup::Emg => "emg-live-plot",
        }
    }
}

/// One signal channel of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
    EmgBicep,
    EmgShoulder,
    EmgTricep,
}

impl Channel {
    pub const ALL: [Channel; 9] = [
        Channel::AccelX,
        Channel::AccelY,
        Channel::AccelZ,
        Channel::GyroX,
        Channel::GyroY,
        Channel::GyroZ,
        Channel::EmgBicep,
        Channel::EmgShoulder,
        Channel::EmgTricep,
    ];

    pub fn group(&self) -> ChannelGroup {
        match self {
            Channel::AccelX | Channel::AccelY | Channel::AccelZ => ChannelGroup::Accel,
            Channel::GyroX | Channel::GyroY | Channel::GyroZ => ChannelGroup::Gyro,
            Channel::EmgBicep | Channel::EmgShoulder | Channel::EmgTricep => ChannelGroup::Emg,
        }
    }

    /// Field name on the wire (`imu.accel_x`, `emg.bicep`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            Channel::AccelX => "accel_x",
            Channel::AccelY => "accel_y",
            Channel::AccelZ => "accel_z",
            Channel::GyroX => "gyro_x",
            Channel::GyroY => "gyro_y",
            Channel::GyroZ => "gyro_z",
            Channel::EmgBicep => "bicep",
            Channel::EmgShoulder => "shoulder",
            Channel::EmgTricep => "tricep",
        }
    }

    /// Legend label inside its chart.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::AccelX | Channel::GyroX => "X",
            Channel::AccelY | Channel::GyroY => "Y",
            Channel::AccelZ | Channel::GyroZ => "Z",
            Channel::EmgBicep => "Bicep",
            Channel::EmgShoulder => "Shoulder",
            Channel::EmgTricep => "Tricep",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Channel::AccelX | Channel::GyroX => "rgba(220, 53, 69, 0.8)",
            Channel::AccelY | Channel::GyroY => "rgba(40, 167, 69, 0.8)",
            Channel::AccelZ | Channel::GyroZ => "rgba(0, 123, 255, 0.8)",
            Channel::EmgBicep => "rgba(255, 87, 51, 0.9)",
            Channel::EmgShoulder => "rgba(46, 204, 113, 0.9)",
            Channel::EmgTricep => "rgba(52, 152, 219, 0.9)",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.key() == s)
            .ok_or_else(|| format!("unknown channel: {s}"))
    }
}

/// Closed value range of a chart axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Map `v` into `[0, 1]`, clamped; values outside the range pin to the edge.
    pub fn normalize(&self, v: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 || !v.is_finite() {
            return 0.0;
        }
        ((v - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Fixed-capacity trailing window of samples, most recent last.
///
/// The length always equals the capacity: the window starts zero-filled and
/// `push_evict_oldest` is the only way to change its contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlidingWindow {
    samples: VecDeque<f64>,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::ZeroCapacity);
        }
        Ok(Self::zeroed(capacity))
    }

    fn zeroed(capacity: usize) -> Self {
        Self {
            samples: std::iter::repeat(0.0).take(capacity).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop the oldest sample and append `sample` at the back.
    pub fn push_evict_oldest(&mut self, sample: f64) {
        self.samples.pop_front();
        self.samples.push_back(sample);
    }

    pub fn latest(&self) -> f64 {
        self.samples.back().copied().unwrap_or(0.0)
    }

    pub fn oldest(&self) -> f64 {
        self.samples.front().copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }
}

/// One sliding window per channel, all with the same capacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSet {
    capacity: usize,
    windows: Vec<SlidingWindow>,
}

impl WindowSet {
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        let windows = Channel::ALL
            .iter()
            .map(|_| SlidingWindow::new(capacity))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { capacity, windows })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn window(&self, channel: Channel) -> &SlidingWindow {
        &self.windows[channel.index()]
    }

    pub fn push(&mut self, channel: Channel, sample: f64) {
        self.windows[channel.index()].push_evict_oldest(sample);
    }

    /// Windows of a chart group, in legend order.
    pub fn group(&self, group: ChannelGroup) -> [(Channel, &SlidingWindow); 3] {
        group.channels().map(|c| (c, self.window(c)))
    }
}

impl Default for WindowSet {
    fn default() -> Self {
        let windows = Channel::ALL
            .iter()
            .map(|_| SlidingWindow::zeroed(DEFAULT_WINDOW_CAPACITY))
            .collect();
        Self {
            capacity: DEFAULT_WINDOW_CAPACITY,
            windows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_starts_zero_filled() {
        let w = SlidingWindow::new(5).unwrap();
        assert_eq!(w.to_vec(), vec![0.0; 5]);
        assert_eq!(w.len(), 5);
    }

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(SlidingWindow::new(0), Err(WindowError::ZeroCapacity));
        assert!(WindowSet::new(0).is_err());
    }

    #[test]
    fn length_never_changes() {
        let mut w = SlidingWindow::new(DEFAULT_WINDOW_CAPACITY).unwrap();
        for i in 0..(DEFAULT_WINDOW_CAPACITY * 3 + 7) {
            w.push_evict_oldest(i as f64);
            assert_eq!(w.len(), DEFAULT_WINDOW_CAPACITY);
        }
    }

    #[test]
    fn push_evicts_front_and_appends_back() {
        let mut w = SlidingWindow::new(3).unwrap();
        w.push_evict_oldest(1.0);
        w.push_evict_oldest(2.0);
        w.push_evict_oldest(3.0);
        assert_eq!(w.to_vec(), vec![1.0, 2.0, 3.0]);
        w.push_evict_oldest(4.0);
        assert_eq!(w.to_vec(), vec![2.0, 3.0, 4.0]);
        assert_eq!(w.latest(), 4.0);
        assert_eq!(w.oldest(), 2.0);
    }

    #[test]
    fn window_set_updates_only_target_channel() {
        let mut set = WindowSet::new(4).unwrap();
        set.push(Channel::GyroY, 12.5);
        assert_eq!(set.window(Channel::GyroY).latest(), 12.5);
        for c in Channel::ALL.iter().filter(|c| **c != Channel::GyroY) {
            assert_eq!(set.window(*c).to_vec(), vec![0.0; 4]);
        }
    }

    #[test]
    fn groups_cover_every_channel_once() {
        let mut seen: Vec<Channel> = ChannelGroup::ALL
            .iter()
            .flat_map(|g| g.channels())
            .collect();
        seen.sort();
        assert_eq!(seen, Channel::ALL.to_vec());
        for g in ChannelGroup::ALL {
            for c in g.channels() {
                assert_eq!(c.group(), g);
            }
        }
    }

    #[test]
    fn channel_keys_parse_back() {
        for c in Channel::ALL {
            assert_eq!(c.key().parse::<Channel>().unwrap(), c);
        }
        assert!("elbow".parse::<Channel>().is_err());
    }

    #[test]
    fn axis_normalize_clamps() {
        let r = ChannelGroup::Accel.axis_range();
        assert_eq!(r.normalize(0.0), 0.5);
        assert_eq!(r.normalize(-40.0), 0.0);
        assert_eq!(r.normalize(40.0), 1.0);
        assert_eq!(r.normalize(f64::NAN), 0.0);
    }
}

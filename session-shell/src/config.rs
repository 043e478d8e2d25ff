use serde::{Deserialize, Serialize};
use signal_core::DEFAULT_WINDOW_CAPACITY;

/// Globals a host page may set before the wasm module boots.
pub const GLOBAL_API_BASE: &str = "BIOSIGNAL_API_BASE";
pub const GLOBAL_WINDOW_CAPACITY: &str = "BIOSIGNAL_WINDOW_CAPACITY";
pub const GLOBAL_TELEMETRY_MS: &str = "BIOSIGNAL_TELEMETRY_MS";
pub const GLOBAL_STATUS_MS: &str = "BIOSIGNAL_STATUS_MS";
/// Log level for the browser console logger.
pub const GLOBAL_LOG_LEVEL: &str = "BIOSIGNAL_LOG";

/// Largest window capacity a page global may request; windows are allocated up front.
pub const MAX_WINDOW_CAPACITY: usize = 10_000;

/// Runtime knobs of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Origin of the REST API; empty means same origin as the page.
    pub api_base: String,
    pub window_capacity: usize,
    pub telemetry_period_ms: u32,
    pub status_period_ms: u32,
    pub highlight_ms: u32,
    pub default_baudrate: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            telemetry_period_ms: 100,
            status_period_ms: 1000,
            highlight_ms: 1000,
            default_baudrate: 115_200,
        }
    }
}

impl DashboardConfig {
    /// Apply overrides from a key lookup (browser globals in practice).
    /// Unparseable, zero or oversized values keep the default.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base) = lookup(GLOBAL_API_BASE) {
            self.api_base = base.trim().trim_end_matches('/').to_string();
        }
        if let Some(cap) = parse_positive::<usize>(lookup(GLOBAL_WINDOW_CAPACITY))
            .filter(|c| *c <= MAX_WINDOW_CAPACITY)
        {
            self.window_capacity = cap;
        }
        if let Some(ms) = parse_positive::<u32>(lookup(GLOBAL_TELEMETRY_MS)) {
            self.telemetry_period_ms = ms;
        }
        if let Some(ms) = parse_positive::<u32>(lookup(GLOBAL_STATUS_MS)) {
            self.status_period_ms = ms;
        }
        self
    }

    /// Absolute URL for an API path such as `/api/data`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    /// URL of the recorded-file download endpoint.
    pub fn download_url(&self, file: &str) -> String {
        format!(
            "{}?file={}",
            self.url("/files/api/download"),
            urlencoding::encode(file)
        )
    }
}

fn parse_positive<T>(raw: Option<String>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    raw.and_then(|s| s.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_reference_timings() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.window_capacity, 50);
        assert_eq!(cfg.telemetry_period_ms, 100);
        assert_eq!(cfg.status_period_ms, 1000);
        assert_eq!(cfg.highlight_ms, 1000);
        assert_eq!(cfg.url("/api/data"), "/api/data");
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let globals: HashMap<&str, &str> = HashMap::from([
            (GLOBAL_API_BASE, "http://127.0.0.1:5000/"),
            (GLOBAL_WINDOW_CAPACITY, "0"),
            (GLOBAL_TELEMETRY_MS, "250"),
            (GLOBAL_STATUS_MS, "soon"),
        ]);
        let cfg = DashboardConfig::default()
            .with_overrides(|k| globals.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.api_base, "http://127.0.0.1:5000");
        assert_eq!(cfg.window_capacity, 50);
        assert_eq!(cfg.telemetry_period_ms, 250);
        assert_eq!(cfg.status_period_ms, 1000);
        assert_eq!(
            cfg.url("/api/connection_status"),
            "http://127.0.0.1:5000/api/connection_status"
        );
    }

    #[test]
    fn window_capacity_override_is_bounded() {
        let cfg = |raw: &str| {
            let raw = raw.to_string();
            DashboardConfig::default()
                .with_overrides(|k| (k == GLOBAL_WINDOW_CAPACITY).then(|| raw.clone()))
                .window_capacity
        };
        assert_eq!(cfg("200"), 200);
        assert_eq!(cfg("10000"), MAX_WINDOW_CAPACITY);
        assert_eq!(cfg("10001"), 50);
        assert_eq!(cfg("18446744073709551615"), 50);
    }

    #[test]
    fn download_url_encodes_file_name() {
        let cfg = DashboardConfig::default();
        assert_eq!(
            cfg.download_url("trial 1/imu.csv"),
            "/files/api/download?file=trial%201%2Fimu.csv"
        );
    }
}

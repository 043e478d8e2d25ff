//! Session state machine driven by user actions and backend replies.
//!
//! Every handler takes the context by `&mut` and returns the side effects the
//! caller must run (network requests, poll loop start/stop). The context never
//! performs I/O itself, which keeps every transition testable off the browser.

use crate::api::ApiError;
use crate::display::{MlDisplay, Readouts};
use serde::{Deserialize, Serialize};
use telemetry_feed::{ApiReply, ConnectionStatus, MlResults, StartSessionRequest, TelemetryFrame};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("Please enter a session name")]
    MissingSessionName,
    #[error("Please enter an EMG port")]
    MissingPort,
    #[error("Please enter a valid baud rate")]
    InvalidBaudrate,
}

/// Raw contents of the setup form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupForm {
    pub session_name: String,
    pub emg_port: String,
    pub emg_baudrate: String,
}

impl SetupForm {
    pub fn validate(&self) -> Result<StartSessionRequest, SetupError> {
        let session_name = self.session_name.trim();
        if session_name.is_empty() {
            return Err(SetupError::MissingSessionName);
        }
        let emg_port = self.emg_port.trim();
        if emg_port.is_empty() {
            return Err(SetupError::MissingPort);
        }
        let emg_baudrate = self
            .emg_baudrate
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|b| *b > 0)
            .ok_or(SetupError::InvalidBaudrate)?;
        Ok(StartSessionRequest {
            session_name: session_name.to_string(),
            emg_port: emg_port.to_string(),
            emg_baudrate,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Connecting,
    Active,
    ConnectFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepMode {
    #[default]
    Automatic,
    Manual,
}

impl RepMode {
    pub fn from_automatic(automatic: bool) -> Self {
        if automatic {
            RepMode::Automatic
        } else {
            RepMode::Manual
        }
    }

    pub fn is_automatic(&self) -> bool {
        matches!(self, RepMode::Automatic)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RepMode::Automatic => "Automatic",
            RepMode::Manual => "Manual",
        }
    }
}

/// Per-device connection badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indicator {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl Indicator {
    pub fn from_flag(connected: bool) -> Self {
        if connected {
            Indicator::Connected
        } else {
            Indicator::Disconnected
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Indicator::Disconnected => "Disconnected",
            Indicator::Connecting => "Connecting...",
            Indicator::Connected => "Connected",
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Indicator::Disconnected => "indicator-status disconnected",
            Indicator::Connecting => "indicator-status connecting",
            Indicator::Connected => "indicator-status connected",
        }
    }
}

/// Enabled/visible state of the session controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub manual_rep_enabled: bool,
    pub setup_form_visible: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            start_enabled: true,
            stop_enabled: false,
            manual_rep_enabled: false,
            setup_form_visible: true,
        }
    }
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SendStart(StartSessionRequest),
    SendStop,
    /// Unload-time stop: issued and never awaited.
    SendStopDetached,
    SendRepMode { automatic: bool },
    SendManualRep,
    StartStatusPoll,
    StopStatusPoll,
    StartTelemetryPoll,
    StopTelemetryPoll,
}

/// Identifies one rep-count highlight so a late timer cannot clear a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightTicket(u64);

/// Everything the dashboard knows about the current session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCtx {
    phase: Phase,
    rep_mode: RepMode,
    last_rep_count: u32,
    pending: Option<StartSessionRequest>,
    active: Option<StartSessionRequest>,
    imu: Indicator,
    emg: Indicator,
    status: String,
    controls: Controls,
    ml: MlDisplay,
    readouts: Readouts,
    highlight: Option<HighlightTicket>,
    highlight_seq: u64,
}

impl Default for SessionCtx {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            rep_mode: RepMode::Automatic,
            last_rep_count: 0,
            pending: None,
            active: None,
            imu: Indicator::Disconnected,
            emg: Indicator::Disconnected,
            status: "Ready".to_string(),
            controls: Controls::default(),
            ml: MlDisplay::default(),
            readouts: Readouts::default(),
            highlight: None,
            highlight_seq: 0,
        }
    }
}

impl SessionCtx {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rep_mode(&self) -> RepMode {
        self.rep_mode
    }

    pub fn last_rep_count(&self) -> u32 {
        self.last_rep_count
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Session shown in the active-session panel once the backend accepted it.
    pub fn active_session(&self) -> Option<&StartSessionRequest> {
        self.active.as_ref()
    }

    pub fn imu_indicator(&self) -> Indicator {
        self.imu
    }

    pub fn emg_indicator(&self) -> Indicator {
        self.emg
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Status line as rendered under the form.
    pub fn status_line(&self) -> String {
        format!("Status: {}", self.status)
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn manual_controls_visible(&self) -> bool {
        self.rep_mode == RepMode::Manual
    }

    pub fn ml(&self) -> &MlDisplay {
        &self.ml
    }

    pub fn readouts(&self) -> &Readouts {
        &self.readouts
    }

    pub fn highlighted(&self) -> bool {
        self.highlight.is_some()
    }

    /// Free-form status text, e.g. from the BLE panel or a download.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    pub fn request_start(&mut self, form: &SetupForm) -> Result<Vec<Command>, SetupError> {
        if !matches!(self.phase, Phase::Idle | Phase::ConnectFailed) || !self.controls.start_enabled {
            return Ok(Vec::new());
        }
        let request = match form.validate() {
            Ok(r) => r,
            Err(e) => {
                self.status = e.to_string();
                return Err(e);
            }
        };
        self.phase = Phase::Connecting;
        self.controls.start_enabled = false;
        self.status = "Starting session...".to_string();
        self.pending = Some(request.clone());
        Ok(vec![Command::SendStart(request)])
    }

    pub fn on_start_reply(&mut self, reply: Result<ApiReply, ApiError>) -> Vec<Command> {
        if self.phase != Phase::Connecting || self.pending.is_none() {
            return Vec::new();
        }
        match reply {
            Ok(reply) if reply.is_success() => {
                self.status = reply.message;
                self.active = self.pending.take();
                self.controls.setup_form_visible = false;
                self.imu = Indicator::Connecting;
                self.emg = Indicator::Connecting;
                vec![Command::StartStatusPoll]
            }
            Ok(reply) => {
                self.abort_start(ApiError::Rejected(reply.message).status_text());
                Vec::new()
            }
            Err(e) => {
                self.abort_start(e.status_text());
                Vec::new()
            }
        }
    }

    fn abort_start(&mut self, status: String) {
        log::warn!("session start failed: {status}");
        self.phase = Phase::Idle;
        self.pending = None;
        self.status = status;
        self.controls.start_enabled = true;
    }

    pub fn on_connection_status(&mut self, status: &ConnectionStatus) -> Vec<Command> {
        if self.phase != Phase::Connecting || self.active.is_none() {
            return Vec::new();
        }
        self.status = status.connection_message.clone();
        self.imu = Indicator::from_flag(status.imu_connected);
        self.emg = Indicator::from_flag(status.emg_connected);

        if status.both_connected() && status.session_active {
            log::info!("devices connected, session active");
            self.phase = Phase::Active;
            self.controls.start_enabled = false;
            self.controls.stop_enabled = true;
            self.controls.manual_rep_enabled = self.rep_mode == RepMode::Manual;
            return vec![
                Command::StopStatusPoll,
                Command::SendRepMode {
                    automatic: self.rep_mode.is_automatic(),
                },
                Command::StartTelemetryPoll,
            ];
        }
        if status.is_failure() {
            log::warn!("device connection failed: {}", status.connection_message);
            self.phase = Phase::ConnectFailed;
            self.active = None;
            self.controls.start_enabled = true;
            self.controls.setup_form_visible = true;
            return vec![Command::StopStatusPoll];
        }
        Vec::new()
    }

    pub fn request_stop(&mut self) -> Vec<Command> {
        if self.phase != Phase::Active || !self.controls.stop_enabled {
            return Vec::new();
        }
        self.status = "Stopping session...".to_string();
        vec![Command::SendStop]
    }

    /// Any reply ends the session; a transport failure leaves it running so the user can retry.
    pub fn on_stop_reply(&mut self, reply: Result<ApiReply, ApiError>) -> Vec<Command> {
        if self.phase != Phase::Active {
            return Vec::new();
        }
        match reply {
            Ok(reply) => {
                log::info!("session stopped: {}", reply.message);
                self.phase = Phase::Idle;
                self.status = reply.message;
                self.active = None;
                self.controls = Controls::default();
                self.imu = Indicator::Disconnected;
                self.emg = Indicator::Disconnected;
                vec![Command::StopTelemetryPoll, Command::StopStatusPoll]
            }
            Err(e) => {
                log::warn!("session stop failed: {e}");
                self.status = e.status_text();
                Vec::new()
            }
        }
    }

    pub fn set_rep_mode(&mut self, mode: RepMode) -> Vec<Command> {
        if mode == self.rep_mode {
            return Vec::new();
        }
        self.rep_mode = mode;
        if self.phase != Phase::Active {
            return Vec::new();
        }
        self.controls.manual_rep_enabled = mode == RepMode::Manual;
        vec![Command::SendRepMode {
            automatic: mode.is_automatic(),
        }]
    }

    pub fn request_manual_rep(&self) -> Vec<Command> {
        if self.phase == Phase::Active && self.rep_mode == RepMode::Manual {
            vec![Command::SendManualRep]
        } else {
            Vec::new()
        }
    }

    /// Project a validated telemetry tick into the readouts and ML panel.
    /// Returns a ticket when the rep count went up and the highlight should run.
    pub fn apply_frame(
        &mut self,
        frame: &TelemetryFrame,
        utc_offset_minutes: i32,
    ) -> Option<HighlightTicket> {
        self.readouts = Readouts::from_frame(frame);
        frame
            .ml
            .as_ref()
            .and_then(|ml| self.apply_ml(ml, utc_offset_minutes))
    }

    pub fn apply_ml(&mut self, ml: &MlResults, utc_offset_minutes: i32) -> Option<HighlightTicket> {
        self.ml = MlDisplay::project(ml, utc_offset_minutes);
        let increased = ml.rep_count > self.last_rep_count;
        self.last_rep_count = ml.rep_count;
        if !increased {
            return None;
        }
        self.highlight_seq += 1;
        let ticket = HighlightTicket(self.highlight_seq);
        self.highlight = Some(ticket);
        Some(ticket)
    }

    pub fn clear_highlight(&mut self, ticket: HighlightTicket) {
        if self.highlight == Some(ticket) {
            self.highlight = None;
        }
    }

    /// Page is going away: stop both loops and tell the backend, without waiting.
    pub fn on_unload(&self) -> Vec<Command> {
        let mut cmds = vec![Command::StopTelemetryPoll, Command::StopStatusPoll];
        if self.phase == Phase::Active {
            cmds.push(Command::SendStopDetached);
        }
        cmds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_feed::parse_snapshot;

    fn form() -> SetupForm {
        SetupForm {
            session_name: "trial1".into(),
            emg_port: "COM3".into(),
            emg_baudrate: "115200".into(),
        }
    }

    fn ok(message: &str) -> Result<ApiReply, ApiError> {
        Ok(ApiReply {
            status: "success".into(),
            message: message.into(),
        })
    }

    fn connected() -> ConnectionStatus {
        ConnectionStatus {
            connection_message: "Both devices connected".into(),
            imu_connected: true,
            emg_connected: true,
            session_active: true,
        }
    }

    fn active_ctx() -> SessionCtx {
        let mut ctx = SessionCtx::default();
        ctx.request_start(&form()).unwrap();
        ctx.on_start_reply(ok("Session started"));
        ctx.on_connection_status(&connected());
        ctx
    }

    fn ml(rep_count: u32) -> MlResults {
        MlResults {
            rep_count,
            ..MlResults::default()
        }
    }

    #[test]
    fn validation_failure_sends_nothing() {
        let mut ctx = SessionCtx::default();
        let mut f = form();
        f.session_name = "  ".into();
        assert_eq!(ctx.request_start(&f), Err(SetupError::MissingSessionName));
        assert_eq!(ctx.status(), "Please enter a session name");
        assert_eq!(ctx.phase(), Phase::Idle);
        assert!(ctx.controls().start_enabled);

        let mut f = form();
        f.emg_port.clear();
        assert_eq!(ctx.request_start(&f), Err(SetupError::MissingPort));
        let mut f = form();
        f.emg_baudrate = "fast".into();
        assert_eq!(ctx.request_start(&f), Err(SetupError::InvalidBaudrate));
    }

    #[test]
    fn start_to_active_scenario() {
        let mut ctx = SessionCtx::default();
        let cmds = ctx.request_start(&form()).unwrap();
        assert_eq!(
            cmds,
            vec![Command::SendStart(StartSessionRequest {
                session_name: "trial1".into(),
                emg_port: "COM3".into(),
                emg_baudrate: 115_200,
            })]
        );
        assert_eq!(ctx.phase(), Phase::Connecting);
        assert!(!ctx.controls().start_enabled);

        assert_eq!(ctx.on_start_reply(ok("Session started")), vec![Command::StartStatusPoll]);
        assert!(!ctx.controls().setup_form_visible);
        assert_eq!(ctx.imu_indicator(), Indicator::Connecting);
        assert_eq!(ctx.active_session().map(|s| s.emg_port.as_str()), Some("COM3"));

        let cmds = ctx.on_connection_status(&connected());
        assert_eq!(
            cmds,
            vec![
                Command::StopStatusPoll,
                Command::SendRepMode { automatic: true },
                Command::StartTelemetryPoll,
            ]
        );
        assert!(ctx.is_active());
        assert!(ctx.controls().stop_enabled);
        assert!(!ctx.controls().start_enabled);
        assert!(!ctx.controls().manual_rep_enabled);
    }

    #[test]
    fn partial_connection_keeps_polling() {
        let mut ctx = SessionCtx::default();
        ctx.request_start(&form()).unwrap();
        ctx.on_start_reply(ok("Session started"));
        let status = ConnectionStatus {
            connection_message: "Waiting for IMU".into(),
            imu_connected: false,
            emg_connected: true,
            session_active: false,
        };
        assert!(ctx.on_connection_status(&status).is_empty());
        assert_eq!(ctx.phase(), Phase::Connecting);
        assert_eq!(ctx.imu_indicator(), Indicator::Disconnected);
        assert_eq!(ctx.emg_indicator(), Indicator::Connected);
        assert_eq!(ctx.status(), "Waiting for IMU");
    }

    #[test]
    fn both_down_without_failure_message_keeps_connecting() {
        let mut ctx = SessionCtx::default();
        ctx.request_start(&form()).unwrap();
        ctx.on_start_reply(ok("Session started"));
        let status = ConnectionStatus {
            connection_message: "Connecting devices".into(),
            ..Default::default()
        };
        let cmds = ctx.on_connection_status(&status);
        assert!(!cmds.contains(&Command::StopStatusPoll));
        assert!(cmds.is_empty());
        assert_eq!(ctx.phase(), Phase::Connecting);
        assert!(!ctx.controls().start_enabled);
        assert!(!ctx.controls().setup_form_visible);
        assert_eq!(ctx.status(), "Connecting devices");
    }

    #[test]
    fn connect_failure_reenables_start() {
        let mut ctx = SessionCtx::default();
        ctx.request_start(&form()).unwrap();
        ctx.on_start_reply(ok("Session started"));
        let status = ConnectionStatus {
            connection_message: "Failed to connect devices".into(),
            ..Default::default()
        };
        assert_eq!(ctx.on_connection_status(&status), vec![Command::StopStatusPoll]);
        assert_eq!(ctx.phase(), Phase::ConnectFailed);
        assert!(ctx.controls().start_enabled);
        assert!(ctx.controls().setup_form_visible);
        // A retry from the failed state is allowed.
        assert!(ctx.request_start(&form()).is_ok());
        assert_eq!(ctx.phase(), Phase::Connecting);
    }

    #[test]
    fn rejected_or_failed_start_returns_to_idle() {
        let mut ctx = SessionCtx::default();
        ctx.request_start(&form()).unwrap();
        let cmds = ctx.on_start_reply(Ok(ApiReply {
            status: "error".into(),
            message: "Port busy".into(),
        }));
        assert!(cmds.is_empty());
        assert_eq!(ctx.status(), "Error: Port busy");
        assert_eq!(ctx.phase(), Phase::Idle);
        assert!(ctx.controls().start_enabled);

        ctx.request_start(&form()).unwrap();
        ctx.on_start_reply(Err(ApiError::Http("unreachable".into())));
        assert_eq!(ctx.status(), "Connection error");
        assert!(ctx.controls().start_enabled);

        ctx.request_start(&form()).unwrap();
        ctx.on_start_reply(Err(ApiError::Rejected("Session already running".into())));
        assert_eq!(ctx.status(), "Error: Session already running");
        assert_eq!(ctx.phase(), Phase::Idle);
    }

    #[test]
    fn manual_toggle_while_active_sends_one_request() {
        let mut ctx = active_ctx();
        let cmds = ctx.set_rep_mode(RepMode::Manual);
        assert_eq!(cmds, vec![Command::SendRepMode { automatic: false }]);
        assert!(ctx.controls().manual_rep_enabled);
        assert!(ctx.manual_controls_visible());
        assert!(ctx.set_rep_mode(RepMode::Manual).is_empty());
        assert_eq!(ctx.request_manual_rep(), vec![Command::SendManualRep]);

        assert_eq!(
            ctx.set_rep_mode(RepMode::Automatic),
            vec![Command::SendRepMode { automatic: true }]
        );
        assert!(!ctx.controls().manual_rep_enabled);
        assert!(ctx.request_manual_rep().is_empty());
    }

    #[test]
    fn toggle_while_idle_is_local_only() {
        let mut ctx = SessionCtx::default();
        assert!(ctx.set_rep_mode(RepMode::Manual).is_empty());
        assert!(ctx.manual_controls_visible());
        assert!(!ctx.controls().manual_rep_enabled);
        assert!(ctx.request_manual_rep().is_empty());
    }

    #[test]
    fn manual_mode_is_pushed_when_session_becomes_active() {
        let mut ctx = SessionCtx::default();
        ctx.set_rep_mode(RepMode::Manual);
        ctx.request_start(&form()).unwrap();
        ctx.on_start_reply(ok("Session started"));
        let cmds = ctx.on_connection_status(&connected());
        assert!(cmds.contains(&Command::SendRepMode { automatic: false }));
        assert!(ctx.controls().manual_rep_enabled);
    }

    #[test]
    fn stop_while_active_resets_everything() {
        let mut ctx = active_ctx();
        assert_eq!(ctx.request_stop(), vec![Command::SendStop]);
        assert_eq!(ctx.status(), "Stopping session...");
        let cmds = ctx.on_stop_reply(ok("Session stopped"));
        assert_eq!(cmds, vec![Command::StopTelemetryPoll, Command::StopStatusPoll]);
        assert_eq!(ctx.phase(), Phase::Idle);
        assert!(ctx.controls().setup_form_visible);
        assert!(ctx.controls().start_enabled);
        assert!(!ctx.controls().stop_enabled);
        assert_eq!(ctx.imu_indicator(), Indicator::Disconnected);
        assert_eq!(ctx.emg_indicator(), Indicator::Disconnected);
        assert_eq!(ctx.status_line(), "Status: Session stopped");
    }

    #[test]
    fn stop_transport_error_keeps_session() {
        let mut ctx = active_ctx();
        ctx.request_stop();
        assert!(ctx.on_stop_reply(Err(ApiError::Status(502))).is_empty());
        assert!(ctx.is_active());
        assert_eq!(ctx.status(), "Connection error");
    }

    #[test]
    fn stop_when_idle_does_nothing() {
        let mut ctx = SessionCtx::default();
        assert!(ctx.request_stop().is_empty());
    }

    #[test]
    fn rep_increase_highlights_once_and_clears() {
        let mut ctx = active_ctx();
        assert!(ctx.apply_ml(&ml(0), 0).is_none());
        let ticket = ctx.apply_ml(&ml(1), 0).expect("increase fires");
        assert!(ctx.highlighted());
        assert!(ctx.apply_ml(&ml(1), 0).is_none());
        assert!(ctx.highlighted());
        ctx.clear_highlight(ticket);
        assert!(!ctx.highlighted());
        assert_eq!(ctx.ml().rep_count, "1");
    }

    #[test]
    fn stale_highlight_timer_does_not_clear_newer_one() {
        let mut ctx = SessionCtx::default();
        let first = ctx.apply_ml(&ml(1), 0).unwrap();
        let second = ctx.apply_ml(&ml(2), 0).unwrap();
        ctx.clear_highlight(first);
        assert!(ctx.highlighted());
        ctx.clear_highlight(second);
        assert!(!ctx.highlighted());
    }

    #[test]
    fn apply_frame_updates_readouts_and_ml() {
        let mut ctx = SessionCtx::default();
        let frame = parse_snapshot(
            r#"{"imu": {"accel_x": 1, "accel_y": 2, "accel_z": 3,
                        "gyro_x": 4, "gyro_y": 5, "gyro_z": 6},
                "emg": {"time": 10, "bicep": 7, "shoulder": 8, "tricep": 9},
                "ml_results": {"exercise": "shoulder_press", "rep_count": 3,
                               "bicep_fatigue": "high", "shoulder_fatigue": "low",
                               "last_rep_time": 0}}"#,
        )
        .unwrap();
        assert!(ctx.apply_frame(&frame, 0).is_some());
        assert_eq!(ctx.readouts().get(signal_core::Channel::AccelZ), "3.00");
        assert_eq!(ctx.ml().exercise, "shoulder_press");
        assert_eq!(ctx.ml().bicep.class, Some("fatigue-high"));
        assert_eq!(ctx.ml().last_rep, "-");
        assert_eq!(ctx.last_rep_count(), 3);
    }

    #[test]
    fn unload_sends_detached_stop_only_when_active() {
        let idle = SessionCtx::default();
        assert!(!idle.on_unload().contains(&Command::SendStopDetached));
        let active = active_ctx();
        let cmds = active.on_unload();
        assert!(cmds.contains(&Command::StopTelemetryPoll));
        assert!(cmds.contains(&Command::SendStopDetached));
    }
}

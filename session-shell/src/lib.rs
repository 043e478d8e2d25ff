//! Session shell: the dashboard state machine, its configuration and the REST
//! client that feeds it.
//!
//! Everything except [`ApiClient`] is plain Rust and runs in native tests; the
//! client is only compiled for `wasm32`.

pub mod api;
pub mod config;
pub mod display;
pub mod poll;
pub mod session;

#[cfg(target_arch = "wasm32")]
pub use api::ApiClient;
pub use api::ApiError;
pub use config::DashboardConfig;
pub use display::{format_rep_time, severity_class, FatigueBadge, MlDisplay, Readouts, PLACEHOLDER};
pub use poll::{LoopGuard, LoopTicket};
pub use session::{
    Command, Controls, HighlightTicket, Indicator, Phase, RepMode, SessionCtx, SetupError,
    SetupForm,
};

/// Which side of a keyboard shortcut applies, given the current controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    MarkRep,
    StartSession,
    StopSession,
}

/// Keys typed into these elements belong to the field, not to the shortcuts.
pub fn is_text_entry(tag_name: &str) -> bool {
    ["input", "textarea", "select"]
        .iter()
        .any(|t| tag_name.eq_ignore_ascii_case(t))
}

/// Map a key press to a dashboard action. `key` is `KeyboardEvent.key`.
pub fn shortcut_for(
    key: &str,
    ctrl_or_meta: bool,
    repeat: bool,
    controls: &Controls,
) -> Option<Shortcut> {
    if ctrl_or_meta && key.eq_ignore_ascii_case("s") {
        if controls.start_enabled {
            return Some(Shortcut::StartSession);
        }
        if controls.stop_enabled {
            return Some(Shortcut::StopSession);
        }
        return None;
    }
    if !ctrl_or_meta && !repeat && key.eq_ignore_ascii_case("m") && controls.manual_rep_enabled {
        return Some(Shortcut::MarkRep);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_s_toggles_session() {
        let idle = Controls::default();
        assert_eq!(shortcut_for("s", true, false, &idle), Some(Shortcut::StartSession));
        let active = Controls {
            start_enabled: false,
            stop_enabled: true,
            manual_rep_enabled: false,
            setup_form_visible: false,
        };
        assert_eq!(shortcut_for("S", true, false, &active), Some(Shortcut::StopSession));
        let connecting = Controls {
            start_enabled: false,
            ..Controls::default()
        };
        assert_eq!(shortcut_for("s", true, false, &connecting), None);
    }

    #[test]
    fn m_marks_rep_only_when_enabled() {
        let mut controls = Controls::default();
        assert_eq!(shortcut_for("m", false, false, &controls), None);
        controls.manual_rep_enabled = true;
        assert_eq!(shortcut_for("m", false, false, &controls), Some(Shortcut::MarkRep));
        assert_eq!(shortcut_for("M", false, true, &controls), None);
        assert_eq!(shortcut_for("s", false, false, &controls), None);
    }

    #[test]
    fn form_fields_swallow_shortcuts() {
        assert!(is_text_entry("INPUT"));
        assert!(is_text_entry("textarea"));
        assert!(is_text_entry("SELECT"));
        assert!(!is_text_entry("BODY"));
        assert!(!is_text_entry("BUTTON"));
    }
}

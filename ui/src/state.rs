use leptos::*;
use session_shell::{DashboardConfig, LoopGuard, SessionCtx, SetupForm};
use telemetry_feed::ble::{BleLink, BleReadings};
use telemetry_feed::WindowStore;

#[cfg(target_arch = "wasm32")]
use js_sys::Reflect;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
pub fn read_global(key: &str) -> Option<String> {
    Reflect::get(&js_sys::global(), &JsValue::from_str(key))
        .ok()
        .and_then(|v| {
            v.as_string()
                .or_else(|| v.as_f64().map(|n| n.to_string()))
        })
}

/// Defaults, overridden by `BIOSIGNAL_*` globals in the browser.
pub fn load_config() -> DashboardConfig {
    #[cfg(target_arch = "wasm32")]
    {
        DashboardConfig::default().with_overrides(read_global)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        DashboardConfig::default()
    }
}

/// Shared dashboard state, provided once by `App`.
#[derive(Clone)]
pub struct DashCtx {
    pub config: DashboardConfig,
    pub session: RwSignal<SessionCtx>,
    pub store: RwSignal<WindowStore>,
    pub form: RwSignal<SetupForm>,
    pub download_name: RwSignal<String>,
    /// Recorded files offered for download, newest first.
    pub files: RwSignal<Vec<String>>,
    pub ble_link: RwSignal<BleLink>,
    pub ble: RwSignal<BleReadings>,
    pub status_loop: LoopGuard,
    pub telemetry_loop: LoopGuard,
}

pub fn provide_dash_ctx(config: DashboardConfig) -> DashCtx {
    let store = match WindowStore::new(config.window_capacity) {
        Ok(store) => store,
        Err(e) => {
            log::warn!("window capacity {}: {e}; using default", config.window_capacity);
            WindowStore::default()
        }
    };
    let form = SetupForm {
        emg_baudrate: config.default_baudrate.to_string(),
        ..SetupForm::default()
    };
    let ctx = DashCtx {
        session: create_rw_signal(SessionCtx::default()),
        store: create_rw_signal(store),
        form: create_rw_signal(form),
        download_name: create_rw_signal(String::new()),
        files: create_rw_signal(Vec::new()),
        ble_link: create_rw_signal(BleLink::default()),
        ble: create_rw_signal(BleReadings::default()),
        status_loop: LoopGuard::new(),
        telemetry_loop: LoopGuard::new(),
        config,
    };
    provide_context(ctx.clone());
    ctx
}

pub fn use_dash_ctx() -> DashCtx {
    use_context::<DashCtx>().expect("DashCtx not provided")
}

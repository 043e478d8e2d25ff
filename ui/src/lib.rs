pub mod app;
pub mod chart;
pub mod logging;
pub mod state;
pub mod theme;
#[cfg(target_arch = "wasm32")]
pub mod ble;
#[cfg(target_arch = "wasm32")]
pub mod runtime;

pub use app::App;

#[cfg(all(any(feature = "csr", feature = "hydrate"), target_arch = "wasm32"))]
use leptos::*;
#[cfg(all(any(feature = "csr", feature = "hydrate"), target_arch = "wasm32"))]
use wasm_bindgen::prelude::*;

#[cfg(all(any(feature = "csr", feature = "hydrate"), target_arch = "wasm32"))]
fn boot() {
    console_error_panic_hook::set_once();
    let level = state::read_global(session_shell::config::GLOBAL_LOG_LEVEL);
    logging::init(level.as_deref());
    log::info!("biosignal dashboard {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(all(feature = "csr", target_arch = "wasm32"))]
#[wasm_bindgen]
pub fn start() {
    boot();
    leptos::mount_to_body(|| view! { <App/> });
}

#[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
#[wasm_bindgen]
pub fn hydrate() {
    boot();
    leptos::mount_to_body(|| view! { <App/> });
}

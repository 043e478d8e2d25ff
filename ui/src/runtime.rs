//! Runs the side effects requested by session transitions: REST calls and the
//! two poll loops. Browser build only.

use crate::state::DashCtx;
use gloo_timers::future::TimeoutFuture;
use leptos::*;
use session_shell::{ApiClient, Command, HighlightTicket};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Blob, HtmlAnchorElement, Url};

/// Minutes east of UTC for the browser's local zone.
pub fn utc_offset_minutes() -> i32 {
    -(js_sys::Date::new_0().get_timezone_offset() as i32)
}

pub fn dispatch(ctx: &DashCtx, cmds: Vec<Command>) {
    for cmd in cmds {
        execute(ctx, cmd);
    }
}

fn execute(ctx: &DashCtx, cmd: Command) {
    log::debug!("command {cmd:?}");
    let client = ApiClient::new(ctx.config.clone());
    match cmd {
        Command::SendStart(req) => {
            let ctx = ctx.clone();
            spawn_local(async move {
                let reply = client.start_session(&req).await;
                if let Err(e) = &reply {
                    log::warn!("start_session: {e}");
                }
                let next = ctx
                    .session
                    .try_update(|s| s.on_start_reply(reply))
                    .unwrap_or_default();
                dispatch(&ctx, next);
            });
        }
        Command::SendStop => {
            let ctx = ctx.clone();
            spawn_local(async move {
                let reply = client.stop_session().await;
                if let Err(e) = &reply {
                    log::warn!("stop_session: {e}");
                }
                let next = ctx
                    .session
                    .try_update(|s| s.on_stop_reply(reply))
                    .unwrap_or_default();
                dispatch(&ctx, next);
            });
        }
        Command::SendStopDetached => {
            spawn_local(async move {
                if let Err(e) = client.stop_session().await {
                    log::error!("stop on unload: {e}");
                }
            });
        }
        Command::SendRepMode { automatic } => {
            spawn_local(async move {
                match client.set_rep_mode(automatic).await {
                    Ok(_) => log::info!(
                        "rep detection mode set to {}",
                        if automatic { "automatic" } else { "manual" }
                    ),
                    Err(e) => log::error!("set_rep_mode: {e}"),
                }
            });
        }
        Command::SendManualRep => {
            // The count itself arrives with the next telemetry tick.
            spawn_local(async move {
                match client.manual_rep().await {
                    Ok(_) => log::info!("manual rep recorded"),
                    Err(e) => log::error!("manual_rep: {e}"),
                }
            });
        }
        Command::StartStatusPoll => start_status_poll(ctx, client),
        Command::StopStatusPoll => ctx.status_loop.cancel(),
        Command::StartTelemetryPoll => start_telemetry_poll(ctx, client),
        Command::StopTelemetryPoll => ctx.telemetry_loop.cancel(),
    }
}

fn start_status_poll(ctx: &DashCtx, client: ApiClient) {
    let ticket = ctx.status_loop.start();
    let period = ctx.config.status_period_ms;
    let ctx = ctx.clone();
    log::info!("status poll started");
    spawn_local(async move {
        loop {
            TimeoutFuture::new(period).await;
            if !ctx.status_loop.is_current(ticket) {
                break;
            }
            match client.connection_status().await {
                Ok(status) => {
                    if !ctx.status_loop.is_current(ticket) {
                        break;
                    }
                    let next = ctx
                        .session
                        .try_update(|s| s.on_connection_status(&status))
                        .unwrap_or_default();
                    dispatch(&ctx, next);
                }
                Err(e) => log::warn!("connection_status: {e}"),
            }
        }
        log::info!("status poll stopped");
    });
}

/// Each tick awaits its request before sleeping, so windows update in order.
fn start_telemetry_poll(ctx: &DashCtx, client: ApiClient) {
    let ticket = ctx.telemetry_loop.start();
    let period = ctx.config.telemetry_period_ms;
    let ctx = ctx.clone();
    log::info!("telemetry poll started");
    spawn_local(async move {
        loop {
            TimeoutFuture::new(period).await;
            if !ctx.telemetry_loop.is_current(ticket) {
                break;
            }
            let snapshot = match client.data().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    log::warn!("data: {e}");
                    continue;
                }
            };
            if !ctx.telemetry_loop.is_current(ticket) {
                break;
            }
            match ctx.store.try_update(|store| store.ingest(&snapshot)) {
                Some(Ok(frame)) => {
                    let offset = utc_offset_minutes();
                    let highlight = ctx
                        .session
                        .try_update(|s| s.apply_frame(&frame, offset))
                        .flatten();
                    if let Some(t) = highlight {
                        schedule_highlight_clear(&ctx, t);
                    }
                }
                Some(Err(e)) => log::warn!("skipping telemetry tick: {e}"),
                None => break,
            }
        }
        log::info!("telemetry poll stopped");
    });
}

fn schedule_highlight_clear(ctx: &DashCtx, ticket: HighlightTicket) {
    let session = ctx.session;
    let ms = ctx.config.highlight_ms;
    spawn_local(async move {
        TimeoutFuture::new(ms).await;
        session.try_update(|s| s.clear_highlight(ticket));
    });
}

/// Reload the recorded-file list shown in the download panel.
pub fn refresh_files(ctx: &DashCtx) {
    let client = ApiClient::new(ctx.config.clone());
    let files = ctx.files;
    let session = ctx.session;
    spawn_local(async move {
        match client.list_files().await {
            Ok(list) => {
                log::debug!("{} recorded files", list.len());
                files.try_set(list);
            }
            Err(e) => {
                log::error!("list files: {e}");
                session.try_update(|s| s.set_status(format!("Error loading files: {e}")));
            }
        }
    });
}

/// Fetch a recorded file and hand it to the browser as a download.
pub fn download_file(ctx: &DashCtx, name: String) {
    let name = name.trim().to_string();
    if name.is_empty() {
        return;
    }
    let client = ApiClient::new(ctx.config.clone());
    let session = ctx.session;
    spawn_local(async move {
        let result = match client.download(&name).await {
            Ok(bytes) => save_blob(&name, &bytes),
            Err(e) => Err(JsValue::from_str(&e.to_string())),
        };
        match result {
            Ok(()) => log::info!("downloaded {name}"),
            Err(e) => {
                let detail = e.as_string().unwrap_or_else(|| format!("{e:?}"));
                log::error!("download {name}: {detail}");
                session.update(|s| s.set_status(format!("Error downloading the file: {detail}")));
            }
        }
    });
}

fn save_blob(name: &str, bytes: &[u8]) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?;

    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
    let blob = Blob::new_with_u8_array_sequence(&parts)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| JsValue::from_str("anchor cast failed"))?;
    anchor.set_attribute("style", "display: none")?;
    anchor.set_href(&url);
    anchor.set_download(name);
    body.append_child(&anchor)?;
    anchor.click();
    anchor.remove();
    Url::revoke_object_url(&url)
}

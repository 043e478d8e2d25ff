use crate::{
    chart::SignalChartView,
    state::{load_config, provide_dash_ctx, use_dash_ctx, DashCtx},
    theme::GLOBAL_CSS,
};
use leptos::*;
use leptos_meta::*;
use session_shell::{Command, RepMode};
use signal_core::{Channel, ChannelGroup};
use telemetry_feed::ble::ImuCharacteristic;

#[cfg(target_arch = "wasm32")]
use session_shell::{is_text_entry, shortcut_for, Shortcut};
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use web_sys::{window, KeyboardEvent};

#[cfg(target_arch = "wasm32")]
fn run(ctx: &DashCtx, cmds: Vec<Command>) {
    crate::runtime::dispatch(ctx, cmds);
}

#[cfg(not(target_arch = "wasm32"))]
fn run(_ctx: &DashCtx, cmds: Vec<Command>) {
    if !cmds.is_empty() {
        log::debug!("no browser runtime; dropping {cmds:?}");
    }
}

fn start_session(ctx: &DashCtx) {
    let form = ctx.form.get_untracked();
    match ctx.session.try_update(|s| s.request_start(&form)) {
        Some(Ok(cmds)) => {
            if !cmds.is_empty() {
                log::info!("starting session {:?}", form.session_name.trim());
            }
            run(ctx, cmds);
        }
        Some(Err(e)) => log::info!("setup form rejected: {e}"),
        None => {}
    }
}

fn stop_session(ctx: &DashCtx) {
    let cmds = ctx
        .session
        .try_update(|s| s.request_stop())
        .unwrap_or_default();
    run(ctx, cmds);
}

fn mark_rep(ctx: &DashCtx) {
    let cmds = ctx.session.with_untracked(|s| s.request_manual_rep());
    run(ctx, cmds);
}

fn set_rep_mode(ctx: &DashCtx, mode: RepMode) {
    let cmds = ctx
        .session
        .try_update(|s| s.set_rep_mode(mode))
        .unwrap_or_default();
    log::info!("rep mode {}", mode.label());
    run(ctx, cmds);
}

#[cfg(not(target_arch = "wasm32"))]
#[component]
pub fn App() -> impl IntoView {
    view! { <div>UI available in browser build.</div> }
}

#[cfg(target_arch = "wasm32")]
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let ctx = provide_dash_ctx(load_config());

    // Global shortcuts: `M` marks a rep, Ctrl/Cmd+S starts or stops the session.
    if let Some(win) = window() {
        let key_ctx = ctx.clone();
        let cb = Rc::new(Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(
            move |ev: web_sys::Event| {
                let in_field = ev
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                    .is_some_and(|el| is_text_entry(&el.tag_name()));
                if in_field {
                    return;
                }
                let Ok(key_ev) = ev.dyn_into::<KeyboardEvent>() else {
                    return;
                };
                let controls = key_ctx.session.with_untracked(|s| s.controls());
                let modifier = key_ev.ctrl_key() || key_ev.meta_key();
                match shortcut_for(&key_ev.key(), modifier, key_ev.repeat(), &controls) {
                    Some(Shortcut::MarkRep) => mark_rep(&key_ctx),
                    Some(Shortcut::StartSession) => {
                        key_ev.prevent_default();
                        start_session(&key_ctx);
                    }
                    Some(Shortcut::StopSession) => {
                        key_ev.prevent_default();
                        stop_session(&key_ctx);
                    }
                    None => {
                        if modifier && key_ev.key().eq_ignore_ascii_case("s") {
                            key_ev.prevent_default();
                        }
                    }
                }
            },
        )));
        let _ = win.add_event_listener_with_callback("keydown", cb.as_ref().as_ref().unchecked_ref());

        let unload_ctx = ctx.clone();
        let unload = Rc::new(Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(
            move |_ev: web_sys::Event| {
                let cmds = unload_ctx.session.with_untracked(|s| s.on_unload());
                crate::runtime::dispatch(&unload_ctx, cmds);
                crate::ble::disconnect();
            },
        )));
        let _ = win
            .add_event_listener_with_callback("beforeunload", unload.as_ref().as_ref().unchecked_ref());

        on_cleanup(move || {
            if let Some(win) = window() {
                let _ = win.remove_event_listener_with_callback(
                    "keydown",
                    cb.as_ref().as_ref().unchecked_ref(),
                );
                let _ = win.remove_event_listener_with_callback(
                    "beforeunload",
                    unload.as_ref().as_ref().unchecked_ref(),
                );
            }
        });
    }

    let api_label = if ctx.config.api_base.is_empty() {
        "same origin".to_string()
    } else {
        ctx.config.api_base.clone()
    };

    view! {
        <Style>{GLOBAL_CSS}</Style>
        <Title text="Biosignal Dashboard"/>
        <main class="dash-app">
            <div class="dash-shell">
                <header class="panel dash-topbar">
                    <span class="brand-title">Biosignal Dashboard</span>
                    <span class="section-label">{format!("API: {api_label}")}</span>
                </header>
                <div class="dash-body">
                    <aside class="dash-side">
                        <SessionPanel/>
                        <ConnectionIndicators/>
                        <RepModeToggle/>
                        <MlResultsPanel/>
                        <BlePanel/>
                        <DownloadPanel/>
                    </aside>
                    <section class="dash-main">
                        <div class="chart-grid">
                            <SignalChartView group=ChannelGroup::Accel/>
                            <SignalChartView group=ChannelGroup::Gyro/>
                            <SignalChartView group=ChannelGroup::Emg/>
                        </div>
                        <LiveReadouts/>
                    </section>
                </div>
            </div>
        </main>
    }
}

#[component]
fn SessionPanel() -> impl IntoView {
    let ctx = use_dash_ctx();
    let session = ctx.session;
    let form = ctx.form;
    let controls = create_memo(move |_| session.with(|s| s.controls()));

    let on_start = {
        let ctx = ctx.clone();
        move |_| start_session(&ctx)
    };
    let on_stop = move |_| stop_session(&ctx);

    view! {
        <section class="panel flex-col">
            <div class="section-label">Session</div>
            <Show
                when=move || controls.get().setup_form_visible
                fallback=move || view! { <ActiveSession/> }
            >
                <div class="input-stack">
                    <label class="input-label" for="session-name">Session name</label>
                    <input
                        id="session-name"
                        type="text"
                        placeholder="trial1"
                        prop:value=move || form.with(|f| f.session_name.clone())
                        on:input=move |ev| form.update(|f| f.session_name = event_target_value(&ev))
                    />
                </div>
                <div class="input-stack">
                    <label class="input-label" for="emg-port">EMG port</label>
                    <input
                        id="emg-port"
                        type="text"
                        placeholder="COM3"
                        prop:value=move || form.with(|f| f.emg_port.clone())
                        on:input=move |ev| form.update(|f| f.emg_port = event_target_value(&ev))
                    />
                </div>
                <div class="input-stack">
                    <label class="input-label" for="emg-baudrate">Baud rate</label>
                    <input
                        id="emg-baudrate"
                        type="number"
                        prop:value=move || form.with(|f| f.emg_baudrate.clone())
                        on:input=move |ev| form.update(|f| f.emg_baudrate = event_target_value(&ev))
                    />
                </div>
            </Show>
            <div class="flex-row">
                <button
                    id="btn-start-session"
                    class="primary"
                    disabled=move || !controls.get().start_enabled
                    on:click=on_start
                >
                    "Start session"
                </button>
                <button
                    id="btn-stop-session"
                    class="danger"
                    disabled=move || !controls.get().stop_enabled
                    on:click=on_stop
                >
                    "Stop session"
                </button>
            </div>
            <div class="status-line" id="session-status">
                {move || session.with(|s| s.status_line())}
            </div>
        </section>
    }
}

#[component]
fn ActiveSession() -> impl IntoView {
    let session = use_dash_ctx().session;
    let field = move |pick: fn(&telemetry_feed::StartSessionRequest) -> String| {
        move || {
            session.with(|s| {
                s.active_session()
                    .map(pick)
                    .unwrap_or_else(|| session_shell::PLACEHOLDER.to_string())
            })
        }
    };
    view! {
        <dl class="session-info">
            <dt>Session</dt>
            <dd>{field(|r| r.session_name.clone())}</dd>
            <dt>EMG port</dt>
            <dd>{field(|r| r.emg_port.clone())}</dd>
            <dt>Baud rate</dt>
            <dd>{field(|r| r.emg_baudrate.to_string())}</dd>
        </dl>
    }
}

#[component]
fn ConnectionIndicators() -> impl IntoView {
    let session = use_dash_ctx().session;
    let imu = create_memo(move |_| session.with(|s| s.imu_indicator()));
    let emg = create_memo(move |_| session.with(|s| s.emg_indicator()));
    view! {
        <section class="panel flex-col">
            <div class="section-label">Devices</div>
            <div class="indicator-row">
                <span>IMU</span>
                <span id="imu-indicator" class=move || imu.get().class()>{move || imu.get().label()}</span>
            </div>
            <div class="indicator-row">
                <span>EMG</span>
                <span id="emg-indicator" class=move || emg.get().class()>{move || emg.get().label()}</span>
            </div>
        </section>
    }
}

#[component]
fn RepModeToggle() -> impl IntoView {
    let ctx = use_dash_ctx();
    let session = ctx.session;
    let mode = create_memo(move |_| session.with(|s| s.rep_mode()));
    let manual_enabled = create_memo(move |_| session.with(|s| s.controls().manual_rep_enabled));

    let on_toggle = {
        let ctx = ctx.clone();
        move |ev| set_rep_mode(&ctx, RepMode::from_automatic(event_target_checked(&ev)))
    };
    let on_mark = move |_| mark_rep(&ctx);

    view! {
        <section class="panel flex-col">
            <div class="section-label">Repetition counting</div>
            <label class="mode-toggle">
                <input
                    id="rep-mode-toggle"
                    type="checkbox"
                    prop:checked=move || mode.get().is_automatic()
                    on:change=on_toggle
                />
                <span class="mode-label">{move || mode.get().label()}</span>
            </label>
            <button
                id="btn-count-rep"
                style:display=move || if mode.get() == RepMode::Manual { "inline-block" } else { "none" }
                disabled=move || !manual_enabled.get()
                on:click=on_mark
            >
                "Count rep (M)"
            </button>
        </section>
    }
}

fn badge_class(class: Option<&'static str>) -> String {
    match class {
        Some(c) => format!("fatigue {c}"),
        None => "fatigue".to_string(),
    }
}

#[component]
fn MlResultsPanel() -> impl IntoView {
    let session = use_dash_ctx().session;
    let ml = create_memo(move |_| session.with(|s| s.ml().clone()));
    let highlighted = create_memo(move |_| session.with(|s| s.highlighted()));
    view! {
        <section class="panel flex-col">
            <div class="section-label">Analysis</div>
            <div class="ml-grid">
                <span class="input-label">Exercise</span>
                <span id="exercise-type">{move || ml.with(|m| m.exercise.clone())}</span>
                <span class="input-label">Reps</span>
                <span
                    id="rep-count"
                    class=move || if highlighted.get() { "rep-count rep-highlight" } else { "rep-count" }
                >
                    {move || ml.with(|m| m.rep_count.clone())}
                </span>
                <span class="input-label">Bicep fatigue</span>
                <span id="bicep-fatigue" class=move || ml.with(|m| badge_class(m.bicep.class))>
                    {move || ml.with(|m| m.bicep.text.clone())}
                </span>
                <span class="input-label">Shoulder fatigue</span>
                <span id="shoulder-fatigue" class=move || ml.with(|m| badge_class(m.shoulder.class))>
                    {move || ml.with(|m| m.shoulder.text.clone())}
                </span>
                <span class="input-label">Last rep</span>
                <span id="last-rep-time">{move || ml.with(|m| m.last_rep.clone())}</span>
            </div>
        </section>
    }
}

#[component]
fn LiveReadouts() -> impl IntoView {
    let session = use_dash_ctx().session;
    let cells = Channel::ALL
        .into_iter()
        .map(|channel| {
            let key = format!("{} {}", channel.group().title(), channel.label());
            view! {
                <span class="readout-key">{key}</span>
                <span id=format!("readout-{}", channel.key())>
                    {move || session.with(|s| s.readouts().get(channel).to_string())}
                </span>
                <span></span>
            }
        })
        .collect_view();
    view! {
        <section class="panel flex-col">
            <div class="section-label">Live values</div>
            <div class="readout-grid">{cells}</div>
            <div class="status-line">
                "EMG time: " {move || session.with(|s| s.readouts().emg_time.clone())}
            </div>
        </section>
    }
}

#[component]
fn BlePanel() -> impl IntoView {
    let ctx = use_dash_ctx();
    let link = ctx.ble_link;
    let readings = ctx.ble;

    #[cfg(target_arch = "wasm32")]
    let on_connect = move |_| crate::ble::start_connect(&ctx);
    #[cfg(not(target_arch = "wasm32"))]
    let on_connect = move |_| {
        let _ = &ctx;
        log::warn!("Web Bluetooth needs the browser build");
    };

    let cells = ImuCharacteristic::ALL
        .into_iter()
        .map(|c| {
            let channel = c.channel();
            let key = format!("{} {}", channel.group().title(), channel.label());
            view! {
                <span class="readout-key">{key}</span>
                <span id=format!("ble-{}", channel.key())>{move || readings.with(|r| r.display(c))}</span>
                <span></span>
            }
        })
        .collect_view();

    view! {
        <section class="panel flex-col">
            <div class="section-label">BLE IMU</div>
            <button
                id="btn-ble-connect"
                disabled=move || !link.with(|l| l.can_connect())
                on:click=on_connect
            >
                "Connect device"
            </button>
            <div class="status-line" id="connection-status">
                {move || format!("Status: {}", link.with(|l| l.message()))}
            </div>
            <div class="readout-grid">{cells}</div>
        </section>
    }
}

#[component]
fn DownloadPanel() -> impl IntoView {
    let ctx = use_dash_ctx();
    let name = ctx.download_name;
    let files = ctx.files;

    #[cfg(target_arch = "wasm32")]
    let (on_download, on_refresh, pick) = {
        crate::runtime::refresh_files(&ctx);
        let download_ctx = ctx.clone();
        let refresh_ctx = ctx.clone();
        (
            move |_| crate::runtime::download_file(&download_ctx, name.get_untracked()),
            move |_| crate::runtime::refresh_files(&refresh_ctx),
            move |file: String| {
                name.set(file.clone());
                crate::runtime::download_file(&ctx, file);
            },
        )
    };
    #[cfg(not(target_arch = "wasm32"))]
    let (on_download, on_refresh, pick) = {
        let _ = &ctx;
        (
            move |_| log::warn!("download of {:?} needs the browser build", name.get_untracked()),
            move |_| log::warn!("file listing needs the browser build"),
            move |file: String| name.set(file),
        )
    };

    view! {
        <section class="panel flex-col">
            <div class="flex-row">
                <div class="section-label">Recorded files</div>
                <button on:click=on_refresh>"Refresh"</button>
            </div>
            <Show
                when=move || files.with(|f| !f.is_empty())
                fallback=|| view! { <div class="muted">"No recorded files"</div> }
            >
                <ul class="file-list">
                    {
                        let pick = pick.clone();
                        move || {
                            let pick = pick.clone();
                            files
                                .get()
                                .into_iter()
                                .map(|file| {
                                    let pick = pick.clone();
                                    let label = file.clone();
                                    view! {
                                        <li>
                                            <button class="file-entry" on:click=move |_| pick(file.clone())>
                                                {label}
                                            </button>
                                        </li>
                                    }
                                })
                                .collect_view()
                        }
                    }
                </ul>
            </Show>
            <div class="flex-row">
                <input
                    id="download-name"
                    type="text"
                    placeholder="trial1_imu.csv"
                    prop:value=move || name.get()
                    on:input=move |ev| name.set(event_target_value(&ev))
                />
                <button on:click=on_download disabled=move || name.with(|n| n.trim().is_empty())>
                    "Download"
                </button>
            </div>
        </section>
    }
}

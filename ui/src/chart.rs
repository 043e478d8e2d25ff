use crate::state::use_dash_ctx;
use leptos::*;
use signal_core::ChannelGroup;

#[cfg(target_arch = "wasm32")]
use chart_frontend::SignalChart;
#[cfg(target_arch = "wasm32")]
use gloo_timers::future::TimeoutFuture;
#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

/// Canvas for one channel group, redrawn whenever the windows change.
#[component]
pub fn SignalChartView(group: ChannelGroup) -> impl IntoView {
    let canvas_id = group.canvas_id();
    let ctx = use_dash_ctx();
    #[cfg(not(target_arch = "wasm32"))]
    let _ = &ctx;

    #[cfg(target_arch = "wasm32")]
    {
        let chart: Rc<RefCell<Option<SignalChart>>> = Rc::new(RefCell::new(None));
        let store = ctx.store;

        {
            // The canvas only exists once the view is mounted.
            let chart = chart.clone();
            spawn_local(async move {
                TimeoutFuture::new(0).await;
                match SignalChart::for_group(canvas_id, group) {
                    Ok(mut c) => {
                        store.with_untracked(|s| c.render(s.windows()));
                        *chart.borrow_mut() = Some(c);
                    }
                    Err(e) => log::error!("chart {canvas_id}: {e:?}"),
                }
            });
        }

        {
            let chart = chart.clone();
            create_effect(move |_| {
                store.with(|s| {
                    if let Some(c) = chart.borrow_mut().as_mut() {
                        c.render(s.windows());
                    }
                });
            });
        }

        on_cleanup(move || {
            if let Some(c) = chart.borrow_mut().as_mut() {
                c.destroy();
            }
        });
    }

    view! {
        <div class="chart-cell">
            <div class="section-label">{group.title()}</div>
            <canvas id=canvas_id class="chart-canvas"></canvas>
        </div>
    }
}

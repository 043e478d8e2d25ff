#[cfg(feature = "ssr")]
mod server {
    use axum::http::StatusCode;
    use axum::routing::get_service;
    use axum::Router;
    use leptos::*;
    use leptos_axum::{generate_route_list, LeptosRoutes};
    use tower_http::services::ServeDir;
    use ui::App;

    pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
        let conf = get_configuration(None).await?;
        let leptos_options = conf.leptos_options;
        let addr = leptos_options.site_addr;
        let routes = generate_route_list(App);

        let app = Router::new()
            .leptos_routes(&leptos_options, routes, App)
            .fallback_service(
                get_service(ServeDir::new(leptos_options.site_root.clone()))
                    .handle_error(|_| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .with_state(leptos_options);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("dashboard listening on http://{addr}");
        axum::serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = server::run().await {
        log::error!("server stopped: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "ssr"))]
fn main() {}

use axum::{
    body::Body, extract::ConnectInfo, http::Request, middleware::{from_fn, Next}, response::Response, routing::get, Router
};
use campus_nav_lib::floor_plan::IMAGE_DIR;
use campus_nav_tracking::config::NavigatorConfig;
use server::{navigation_endpoint, server_state::ServerState};
use std::{fs::OpenOptions, net::SocketAddr, sync::Arc};
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOG_DIR: &str = "server/log";
const LOG_FILE: &str = "server/log/server.log";
const FLOOR_PLAN_DIR: &str = "images";
const BIND_VAR: &str = "CAMPUS_NAV_BIND";
const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::fs::create_dir_all(LOG_DIR)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace,campus_nav_tracking=debug", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    let server_state = Arc::new(ServerState {
        config: NavigatorConfig::from_env()?,
        http: reqwest::Client::new(),
    });

    let app = Router::new()
        .nest_service(IMAGE_DIR, ServeDir::new(FLOOR_PLAN_DIR))
        .route("/navigate/{schedule_id}", get(navigation_endpoint::navigate))
        .with_state(server_state)
        .layer(from_fn(log_requests));

    let addr: SocketAddr = std::env::var(BIND_VAR)
        .unwrap_or_else(|_| DEFAULT_BIND.to_string())
        .parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path().to_owned();

    if let Some(addr) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        tracing::debug!("{} {} from {}", req.method(), path, addr.ip());
    }

    let response = next.run(req).await;
    if response.status().is_client_error() || response.status().is_server_error() {
        tracing::warn!("{} answered {}", path, response.status());
    }

    response
}

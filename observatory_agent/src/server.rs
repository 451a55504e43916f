//! HTTP surface: dashboard document, WebSocket upgrade, and the listener setup.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::assembler::SnapshotAssembler;
use crate::config::AgentConfig;
use crate::processes::ProcessLister;
use crate::registry::SessionRegistry;
use crate::sampler::spawn_sampler;
use crate::session::run_session;
use crate::source::HostSource;
use crate::tls::ensure_self_signed_cert;

const DASHBOARD: &str = include_str!("../assets/dashboard.html");

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
}

pub fn router(registry: Arc<SessionRegistry>) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/ws", get(ws_handler))
        .fallback(not_found)
        .with_state(AppState { registry })
}

async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state.registry))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}

/// Assembler over the local host with the platform's process lister.
pub fn host_assembler(config: &AgentConfig) -> SnapshotAssembler {
    let source = HostSource::new();
    let cores = source.logical_cores();
    let lister = ProcessLister::detect();
    if !lister.is_supported() {
        warn!(
            os = std::env::consts::OS,
            "process listing unsupported on this platform; snapshots will carry no processes"
        );
    }
    SnapshotAssembler::new(Box::new(source), lister, cores, config.top_processes)
}

/// Starts sampling and serves until the listener fails.
pub async fn run(config: AgentConfig) -> anyhow::Result<()> {
    let registry = Arc::new(SessionRegistry::new());
    let assembler = host_assembler(&config);
    info!(
        cores = assembler.cores(),
        period_ms = config.period.as_millis() as u64,
        "sampler configured"
    );
    let _sampler = spawn_sampler(assembler, registry.clone(), config.period);
    let app = router(registry);
    let addr = SocketAddr::new(config.bind, config.port);

    if config.enable_ssl {
        let (cert, key) = ensure_self_signed_cert()?;
        let tls = RustlsConfig::from_pem_file(&cert, &key)
            .await
            .with_context(|| format!("loading TLS material from {}", cert.display()))?;
        info!("observatory agent listening on https://{addr} (wss://{addr}/ws)");
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await
            .context("TLS server failed")?;
    } else {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        serve(listener, app).await?;
    }
    Ok(())
}

pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    info!("observatory agent listening on http://{local} (ws://{local}/ws)");
    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}

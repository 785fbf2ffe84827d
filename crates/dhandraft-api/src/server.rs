use std::net::SocketAddr;

use anyhow::Context;
use dhandraft_core::{Database, Settings};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

use crate::{create_router, realtime::spawn_retention_sweeper, seed::seed_demo_data, AppState};

pub struct Server {
    state: AppState,
    addr: SocketAddr,
}

impl Server {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid bind address {}:{}",
                    settings.server.host, settings.server.port
                )
            })?;

        let db = Database::open(&settings.database).context("opening database")?;
        let state = AppState::new(settings, db)?;

        if state.settings.seed.demo_data {
            seed_demo_data(&state.db, &state.passwords, &state.settings.alerts)
                .await
                .context("seeding demo data")?;
        }

        Ok(Self { state, addr })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Binds with tuned socket options for faster rebinds and keep-alive.
    pub fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
        let socket = if addr.is_ipv6() {
            tokio::net::TcpSocket::new_v6()
        } else {
            tokio::net::TcpSocket::new_v4()
        }?;

        let _ = socket.set_reuseaddr(true);
        #[cfg(unix)]
        let _ = socket.set_reuseport(true);
        let _ = socket.set_keepalive(true);

        socket.bind(addr)?;
        socket.listen(1024)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = Self::bind(self.addr).with_context(|| format!("binding {}", self.addr))?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener until Ctrl+C or SIGTERM.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let settings = &self.state.settings;
        info!("Starting DHAN-DRAFT API v{} ({} env)", env!("CARGO_PKG_VERSION"), settings.env);
        info!("Storage backend: {}", self.state.db.backend_name());
        info!("CORS origins: {:?}", settings.cors.allowed_origins);
        if settings.auth.uses_default_secret() {
            warn!("JWT secret is the insecure default; tokens can be forged");
        }

        let sweeper = spawn_retention_sweeper(self.state.clone());
        let router = create_router(self.state);

        info!("Server listening on http://{}", listener.local_addr()?);
        info!("  GET /health - Health check");
        info!("  GET /metrics - Prometheus metrics");
        info!("  WS  /api/ws/alerts, /api/ws/chat - Realtime channels (?token=<jwt>)");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        sweeper.abort();
        info!("Shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}

use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use std::net::SocketAddr;
use study_planner_backend::config::{AppConfig, StorageConfig};
use study_planner_backend::infrastructure::{database, storage};
use study_planner_backend::services::orphan_sweeper::OrphanSweeper;
use study_planner_backend::{AppState, create_app};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Serve the HTTP API only
    Api,
    /// Run the orphaned blob sweeper only
    Sweeper,
    /// API and sweeper in one process
    All,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Study planner resource backend")]
struct Args {
    #[arg(long, value_enum, default_value = "all")]
    mode: Mode,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "study_planner_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Study Planner Backend ({:?} mode)...", args.mode);

    let config = AppConfig::from_env();
    config.validate()?;
    info!(
        "🛡️  Credential TTLs: upload={}m, read={}m, write attempts={}",
        config.upload_ttl_minutes, config.read_ttl_minutes, config.max_write_attempts
    );

    // Setup Infrastructure
    let db = database::setup_database().await?;
    let storage_handles = storage::setup_storage(&StorageConfig::from_env()).await;

    let state = AppState::new(db, storage_handles.clone(), config.clone());

    // Setup Shutdown Channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let sweeper = (args.mode != Mode::Api).then(|| {
        let sweeper = OrphanSweeper::new(
            state.store.clone(),
            storage_handles.storage.clone(),
            storage_handles.locator.clone(),
            config.clone(),
            shutdown_rx,
        );
        tokio::spawn(sweeper.run())
    });

    if args.mode == Mode::Sweeper {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
        if let Some(handle) = sweeper {
            let _ = handle.await;
        }
        info!("🛑 Sweeper shut down gracefully.");
        return Ok(());
    }

    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                // request_id is recorded by the request context middleware
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = tracing::field::Empty,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                // Query strings can carry tokens, keep them out of the logs
                info!("📥 {} {}", request.method(), request.uri().path());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    if let Some(handle) = sweeper {
        let _ = handle.await;
    }

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}

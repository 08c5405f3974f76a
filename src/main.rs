use std::net::SocketAddr;

use vocab_exam_backend::config::Config;
use vocab_exam_backend::db::Database;
use vocab_exam_backend::logging::init_tracing;
use vocab_exam_backend::state::AppState;
use vocab_exam_backend::{app_with_state, seed};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    if let Err(err) = config.exam.validate() {
        tracing::error!(error = %err, "refusing to start with invalid exam policy");
        std::process::exit(1);
    }

    let db = match Database::connect(config.sqlite.clone()).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, path = %config.sqlite.path.display(), "database init failed");
            std::process::exit(1);
        }
    };

    if config.seed_demo_data {
        seed::seed_demo_data(&db).await;
    }

    let state = AppState::from_database(db.clone(), config.exam.clone());
    let app = app_with_state(state);

    let addr = config.bind_addr();
    tracing::info!(%addr, "exam backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    db.close().await;
    tracing::info!("Graceful shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

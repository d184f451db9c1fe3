use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};

use loadboard::{build_app, build_backend, config::EnvironmentConfig, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let level = if config.is_development() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚚 LoadBoard - Gateway del tablero de cargas");
    info!("============================================");

    let backend = build_backend(&config).await?;
    let addr = config.server_url();
    let app = build_app(AppState::new(config, backend));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   GET  /api/statuses/:status");
    info!("   GET  /api/trucker/requests");
    info!("   POST /api/trucker/requests/:id/assign");
    info!("   POST /api/trucker/requests/:id/decline");
    info!("   GET  /api/trucker/bids?status=");
    info!("   POST /api/bids/:id/advance");
    info!("   POST /api/bids/:id/resume");
    info!("   GET  /api/client/bids");
    info!("   POST /api/client/bids/:id/accept");
    info!("   POST /api/client/requests");
    info!("   GET|POST /api/trucks, DELETE /api/trucks/:id");
    info!("   POST|DELETE /api/board/poll");

    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}

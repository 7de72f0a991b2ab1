use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rental_backoffice::config::EnvironmentConfig;
use rental_backoffice::database::DatabaseConnection;
use rental_backoffice::repositories::Repositories;
use rental_backoffice::services::{AuthService, LocalPhotoStore, PhotoStore};
use rental_backoffice::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚗 Location de voitures - Back-office API");
    info!("=========================================");

    let config = EnvironmentConfig::from_env()?;
    info!("⚙️ Entorno: {}", config.environment);

    // Store: PostgreSQL si hay DATABASE_URL, memoria si no
    let repositories = match &config.database {
        Some(database) => {
            let connection = DatabaseConnection::new(database).await.map_err(|e| {
                error!("❌ Error conectando a la base de datos: {}", e);
                e
            })?;
            Repositories::postgres(connection.pool().clone())
        }
        None => {
            warn!("⚠️ DATABASE_URL no definida: usando almacenamiento en memoria");
            Repositories::in_memory()
        }
    };

    let photos: Arc<dyn PhotoStore> = Arc::new(LocalPhotoStore::new(config.upload_dir.clone()));
    let auth = AuthService::from_config(&config)
        .await
        .context("No se pudo inicializar la autenticación")?;

    let app_state = AppState::new(config.clone(), repositories, photos, auth);

    if let Some(secs) = config.status_sweep_interval_secs.filter(|secs| *secs > 0) {
        spawn_status_sweep(app_state.clone(), Duration::from_secs(secs));
    }

    let app = create_router(app_state);

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .with_context(|| format!("Dirección inválida: {}", config.server_url()))?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🔑 Auth:");
    info!("   POST /api/auth/login - Login administrador");
    info!("   POST /api/auth/change-password - Cambiar contraseña");
    info!("🚗 Cars:");
    info!("   GET  /api/cars - Listar coches (?model= comprobar serie)");
    info!("   POST /api/cars - Crear coche");
    info!("   GET/PUT/DELETE /api/cars/:id - Obtener / actualizar / eliminar");
    info!("   GET  /api/cars/:id/active-contract - Contrato en curso");
    info!("📝 Contracts:");
    info!("   GET  /api/contracts - Por coche (?car_id=) o próximos (?future=true)");
    info!("   POST /api/contracts - Crear contrato");
    info!("   POST /api/contracts/refresh-statuses - Pasar vencidos a pending_return");
    info!("   GET/DELETE /api/contracts/:id - Obtener / eliminar");
    info!("   POST /api/contracts/:id/return - Registrar retour");
    info!("   PUT  /api/contracts/:id/status - Cambiar estado");
    info!("   GET/POST/DELETE /api/contracts/:id/photos - Fotos");
    info!("   PUT  /api/contracts/:id/contract-photo - Foto del contrato");
    info!("🔧 Entretien:");
    info!("   GET  /api/entretien - Alertas de todos los coches");
    info!("   POST /api/entretien - Crear / actualizar entretien");
    info!("   GET/DELETE /api/entretien/:car_id - Obtener / eliminar");
    info!("   PUT  /api/entretien/:car_id/service - Registrar un servicio");
    info!("   PUT  /api/entretien/:car_id/notes - Notas");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("No se pudo abrir {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Pasada periódica de `refresh_statuses`
fn spawn_status_sweep(state: AppState, every: Duration) {
    info!("⏱️ Barrido de estados cada {:?}", every);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = state.contracts().refresh_statuses(chrono::Utc::now()).await {
                error!("❌ Error en el barrido de estados: {}", e);
            }
        }
    });
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use cab_dispatch::config::EnvironmentConfig;
use cab_dispatch::database;
use cab_dispatch::middleware::cors::cors_middleware;
use cab_dispatch::routes;
use cab_dispatch::state::AppState;
use cab_dispatch::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚕 Cab Dispatch - Motor de orquestación de viajes");
    info!("=================================================");

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    database::run_migrations(&pool).await?;

    let config = EnvironmentConfig::default();
    let app_state = AppState::new(PgStore::new(pool), config.clone());

    let app = Router::new()
        .nest("/api/trip", routes::trip_routes::create_trip_router())
        .nest("/api/car", routes::car_routes::create_car_router())
        .nest("/api/service", routes::service_routes::create_service_router())
        .layer(cors_middleware())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("🧭 Trip:");
    info!("   POST /api/trip/create - Crear viaje (customer)");
    info!("   GET  /api/trip/user-trips - Viajes del cliente");
    info!("   GET  /api/trip/trips - Todos los viajes (admin)");
    info!("   POST /api/trip/cancel - Cancelar viaje propio");
    info!("   POST /api/trip/stop - Llegada a destino");
    info!("   POST /api/trip/attach-service - Adjuntar servicio");
    info!("   POST /api/trip/detach-service - Quitar servicio");
    info!("   POST /api/trip/advance - Señal de inicio (dispositivo)");
    info!("   POST /api/trip/complete - Señal de fin (dispositivo)");
    info!("🚗 Car:");
    info!("   GET  /api/car/cars - Listar flota");
    info!("   POST /api/car/create - Alta de coche (admin)");
    info!("   POST /api/car/edit - Editar coche (admin)");
    info!("   DELETE /api/car/delete/:id - Baja de coche (admin)");
    info!("   POST /api/car/update - Telemetría (dispositivo)");
    info!("   GET  /api/car/door-status/:device_id - Estado de puertas");
    info!("🧰 Service:");
    info!("   GET  /api/service/services - Listar catálogo");
    info!("   POST /api/service/create - Alta de servicio (admin)");
    info!("   POST /api/service/edit - Editar servicio (admin)");
    info!("   DELETE /api/service/delete/:id - Baja de servicio (admin)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
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
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}

use std::net::TcpListener;
use std::sync::Arc;

use session_rotation::configuration::get_configuration;
use session_rotation::identity::PgIdentityDirectory;
use session_rotation::rotation::RotationProtocol;
use session_rotation::session::PgSessionStore;
use session_rotation::startup::run;
use session_rotation::telemetry::init_telemetry;
use session_rotation::transport::CookieTransport;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(configuration.database.max_connections)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
        })?;

    tracing::info!("Database ready");

    // A bad signing secret must stop the process before it serves anything.
    let protocol = RotationProtocol::from_settings(
        &configuration.jwt,
        Arc::new(PgSessionStore::new(pool.clone())),
        Arc::new(PgIdentityDirectory::new(pool)),
    )
    .map_err(|e| {
        tracing::error!("Invalid token configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    let transport = CookieTransport::new(configuration.cookie.clone());

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, protocol, transport)?.await
}

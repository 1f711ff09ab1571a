use std::sync::Arc;
use std::time::Duration;

use auth::TokenIssuer;
use auth_service::config::Config;
use auth_service::domain::user::service::AuthService;
use auth_service::domain::user::service::AuthSettings;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::email::SmtpEmailSender;
use auth_service::outbound::repositories::reference::PostgresReferenceCatalog;
use auth_service::outbound::repositories::user::PostgresCredentialStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;
    let dev_mode = config.app.is_development();

    tracing::info!(
        http_port = config.server.http_port,
        backend_url = %config.server.backend_url,
        frontend_url = %config.server.frontend_url,
        smtp_host = %config.smtp.host,
        environment = %config.app.environment,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.timeout_secs))
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let tokens = Arc::new(TokenIssuer::new(
        config.jwt.secret.as_bytes(),
        config.jwt.issuer.clone(),
        config.jwt.access_ttl()?,
    ));
    let credential_store = Arc::new(PostgresCredentialStore::new(pg_pool.clone()));
    let reference_catalog = Arc::new(PostgresReferenceCatalog::new(pg_pool));
    let email_sender = Arc::new(SmtpEmailSender::new(
        &config.smtp,
        &config.server.frontend_url,
    )?);

    let settings = AuthSettings {
        refresh_ttl: config.jwt.refresh_ttl()?,
        store_deadline: Duration::from_secs(config.database.timeout_secs),
    };
    let auth_service = Arc::new(AuthService::new(
        credential_store,
        reference_catalog,
        email_sender,
        tokens,
        settings,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        dev_mode,
        "Http server listening"
    );

    let http_application = create_router(auth_service, dev_mode);
    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");
    Ok(())
}

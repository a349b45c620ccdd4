use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use nordid_api_auth::{api_router, BankIdService};
use nordid_rp::{HttpRpClient, QrGenerator, RpClient, StartTokenQrGenerator};
use nordid_session::lock::DEFAULT_LEASE_TTL;
use nordid_session::{
    InMemorySessionDao, InMemoryTryLockRepository, PgSessionDao, PgTryLockRepository, SessionDao,
    SessionDataListener, SessionEventPublisher, TryLockRepository,
};

mod config;

use config::IdpConfig;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,nordid=debug")),
        )
        .init();

    // Load configuration
    let config = IdpConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    tracing::info!(
        bind_addr = %config.bind_addr(),
        bankid_base_url = %config.bankid_base_url,
        durable_store = config.database_url.is_some(),
        "starting idp server"
    );

    // Select session stores
    let (sessions, locks): (Arc<dyn SessionDao>, Arc<dyn TryLockRepository>) =
        match &config.database_url {
            Some(database_url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(database_url)
                    .await
                    .unwrap_or_else(|e| {
                        eprintln!("Database connection error: {e}");
                        std::process::exit(1);
                    });

                nordid_session::postgres::migrate(&pool).await.unwrap_or_else(|e| {
                    eprintln!("Migration error: {e}");
                    std::process::exit(1);
                });

                (
                    Arc::new(PgSessionDao::new(pool.clone())),
                    Arc::new(PgTryLockRepository::new(pool)),
                )
            }
            None => {
                tracing::warn!(
                    "DATABASE_URL not set, using in-memory stores (single instance only)"
                );
                (
                    Arc::new(InMemorySessionDao::new()),
                    Arc::new(InMemoryTryLockRepository::new(DEFAULT_LEASE_TTL)),
                )
            }
        };

    // Wire the orchestrator
    let client: Arc<dyn RpClient> = Arc::new(HttpRpClient::new(&config.bankid_base_url));
    let listener = Arc::new(SessionDataListener::new(sessions.clone()));
    let publisher = SessionEventPublisher::new(listener);
    let service = Arc::new(BankIdService::new(client, sessions, locks, publisher));
    let qr_generator: Arc<dyn QrGenerator> = Arc::new(StartTokenQrGenerator);

    let app = api_router(service, qr_generator);

    let tcp = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .unwrap_or_else(|e| {
            eprintln!("Bind error: {e}");
            std::process::exit(1);
        });

    tracing::info!(bind_addr = %config.bind_addr(), "idp server listening");

    axum::serve(
        tcp,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap_or_else(|e| {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    });
}

use dotenvy::dotenv;
use rentdesk::{
    api::{self, AppState},
    config::{database, settings},
    errors::Result,
    notify::{Mailer, OutboxMailer},
    receipt::PdfReceiptRenderer,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since variables can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load settings (file, then environment overrides)
    let settings = settings::load_settings()
        .inspect_err(|e| error!("Critical error loading settings: {}", e))?;
    info!("Successfully processed application settings.");

    // 4. Connect and create tables
    let db = database::create_connection(&settings.database.url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Spool outgoing mail for the relay
    info!("Spooling mail to {}", settings.mail.outbox_dir.display());
    let mailer: Arc<dyn Mailer> = Arc::new(OutboxMailer::new(
        settings.mail.from.clone(),
        settings.mail.outbox_dir.clone(),
    ));

    // 6. Serve
    let bind_addr = settings.server.bind_addr;
    let state = AppState::new(db, settings, mailer, Arc::new(PdfReceiptRenderer));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", bind_addr, e))?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, api::router(state)).await?;

    Ok(())
}

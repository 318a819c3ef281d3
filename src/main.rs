use custodybot::{
    bot::{BotHandler, Dispatcher, IntentBroadcaster},
    config::AppConfig,
    db::{self, Sealer, SqliteWalletStore},
    ledger::BalanceOracle,
    session::{self, InMemorySessionStore},
    telegram::TelegramClient,
    web,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "custodybot=debug,tower_http=info".into());

    let json = std::env::var("CUSTODYBOT_LOG_JSON").is_ok_and(|v| v == "1");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting custodybot v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::init()?;
    info!("Configuration loaded");

    // Secrets at rest
    let pool = db::connect(&config.database).await?;
    db::init_db(&pool).await?;
    let sealer = Sealer::from_base64(&config.storage.encryption_key)?;
    let wallets = Arc::new(SqliteWalletStore::new(pool, sealer));

    let sessions = Arc::new(InMemorySessionStore::new(Duration::from_secs(
        config.session.ttl_secs,
    )));
    let _sweeper = session::spawn_sweeper(
        sessions.clone(),
        Duration::from_secs(config.session.sweep_interval_secs),
    );

    let oracle = Arc::new(BalanceOracle::from_config(&config.ledger)?);
    info!("Balance oracle ready with {} endpoint(s)", oracle.source_count());

    let telegram = Arc::new(TelegramClient::new(&config.telegram)?);
    match config.telegram.webhook_url.as_deref() {
        Some(url) => {
            if let Err(e) = telegram.set_webhook(url).await {
                warn!("Webhook registration failed, keeping the existing one: {}", e);
            }
        }
        None => warn!("telegram.webhook_url not set; assuming the webhook is registered already"),
    }

    let intents = IntentBroadcaster::new();
    let handler = Arc::new(BotHandler::new(
        sessions,
        wallets,
        oracle,
        telegram,
        intents.clone(),
    ));
    let dispatcher = Dispatcher::new(
        handler,
        config.dispatcher.queue_capacity,
        Duration::from_secs(config.dispatcher.idle_timeout_secs),
    );

    if config.web.intents_token.is_none() {
        warn!("web.intents_token not set; trade intents have no consumer");
    }
    let state = web::AppState {
        dispatcher,
        intents,
        webhook_secret: config.telegram.webhook_secret.as_deref().map(Arc::from),
        intents_token: config.web.intents_token.as_deref().map(Arc::from),
    };
    let app = web::create_router(state);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Web server listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Web server error: {}", e);
        return Err(e.into());
    }

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

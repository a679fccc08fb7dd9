//! Process wiring: clients, catalog load, health server and the long-polling loop.

use crate::adapters::health;
use crate::adapters::openai::OpenAiChooser;
use crate::adapters::sheets::{CsvExportSource, ServiceAccountKey, SheetsApiSource};
use crate::adapters::telegram::TelegramClient;
use crate::config::AppConfig;
use crate::core::catalog::{load_into, Catalog};
use crate::core::dialogue::Dialogue;
use crate::core::recommender::Recommender;
use crate::domain::ports::{ChatApi, VenueChooser, VenueSource};
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{validate_required_field, Validate};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Service account when credentials are configured, public CSV export otherwise.
pub fn build_source(config: &AppConfig) -> Result<Box<dyn VenueSource>> {
    let sheet_url = config.sheet_url()?;
    match config.sheet.credentials_json.as_deref() {
        Some(raw) => {
            let key = ServiceAccountKey::from_json(raw)?;
            Ok(Box::new(SheetsApiSource::new(
                config.sheet.sheets_api_base.clone(),
                sheet_url,
                config.sheet.range.clone(),
                key,
            )?))
        }
        None => {
            tracing::warn!("⚠️ GOOGLE_CREDENTIALS_JSON not set, reading the public CSV export");
            Ok(Box::new(CsvExportSource::new(
                config.sheet.docs_base.clone(),
                sheet_url,
            )?))
        }
    }
}

/// Resolves once Ctrl+C or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("❌ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("🛑 Received Ctrl+C, shutting down"),
        _ = terminate => tracing::warn!("🛑 Received terminate signal, shutting down"),
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

async fn stopped(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Long-polls Telegram and hands each update to the dialogue, one at a time.
pub async fn poll_updates<A: ChatApi, C: VenueChooser>(
    dialogue: &Dialogue<A, C>,
    poll_timeout_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut offset: Option<i64> = None;
    let mut backoff = INITIAL_BACKOFF;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let batch = tokio::select! {
            _ = shutdown.changed() => break,
            batch = dialogue.chat().get_updates(offset, poll_timeout_secs) => batch,
        };

        match batch {
            Ok(updates) => {
                backoff = INITIAL_BACKOFF;
                for update in updates {
                    offset = Some(update.update_id + 1);
                    dialogue.dispatch(update).await;
                }
            }
            Err(e) => {
                tracing::error!("❌ Polling failed: {} (retrying in {:?})", e, backoff);
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = next_backoff(backoff);
            }
        }
    }

    tracing::info!("🛑 Polling stopped");
}

fn spawn_refresh(
    source: Arc<dyn VenueSource>,
    catalog: Catalog,
    every: Duration,
    shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick fires immediately and the catalog was just loaded
        ticker.tick().await;
        let stop = stopped(shutdown);
        tokio::pin!(stop);
        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    load_into(source.as_ref(), &catalog).await;
                }
            }
        }
    })
}

/// Runs the bot until a shutdown signal arrives.
pub async fn run(config: AppConfig) -> Result<()> {
    config.validate()?;

    let token = validate_required_field("TELEGRAM_BOT_TOKEN", &config.telegram.token)?;
    let api_key = validate_required_field("OPENAI_API_KEY", &config.openai.api_key)?;

    let chat = TelegramClient::new(config.telegram.api_base.clone(), token.clone());
    let chooser = OpenAiChooser::new(
        config.openai.api_base.clone(),
        api_key.clone(),
        config.openai.model.clone(),
    );
    tracing::info!("✅ Telegram and OpenAI clients created");

    // A broken sheet setup leaves the catalog empty; the bot still answers
    let catalog = Catalog::new();
    let source: Option<Arc<dyn VenueSource>> = match build_source(&config) {
        Ok(source) => {
            let source: Arc<dyn VenueSource> = Arc::from(source);
            load_into(source.as_ref(), &catalog).await;
            Some(source)
        }
        Err(e) => {
            tracing::error!("❌ Cannot set up the venue source: {}", e);
            tracing::error!("💡 {}", e.recovery_suggestion());
            None
        }
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let health_catalog = catalog.clone();
    let health_stop = stopped(stop_rx.clone());
    let health_task = tokio::spawn(async move {
        if let Err(e) = health::serve(addr, health_catalog, health_stop).await {
            tracing::error!("❌ Health endpoint failed: {}", e);
        }
    });

    if let (Some(minutes), Some(source)) = (config.sheet.refresh_minutes, source) {
        tracing::info!("🔄 Catalog refresh every {} minutes", minutes);
        spawn_refresh(
            source,
            catalog.clone(),
            Duration::from_secs(minutes * 60),
            stop_rx.clone(),
        );
    }

    let bot_username = match chat.get_me().await {
        Ok(me) => me.username,
        Err(e) => {
            tracing::warn!("⚠️ Could not look up the bot's username: {}", e);
            None
        }
    };

    if let Err(e) = chat.drop_pending_updates().await {
        if matches!(e, BotError::TelegramError { code: 401, .. }) {
            return Err(e);
        }
        tracing::warn!("⚠️ Could not drop pending updates: {}", e);
    }

    let recommender = Recommender::new(catalog, chooser)
        .with_timeout(Duration::from_secs(config.openai.timeout_secs));
    let dialogue = Dialogue::new(chat, recommender).with_bot_username(bot_username);

    tracing::info!("✅ All services connected, bot is ready");
    poll_updates(&dialogue, config.telegram.poll_timeout_secs, stop_rx).await;

    let _ = health_task.await;
    Ok(())
}

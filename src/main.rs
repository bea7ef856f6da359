use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::time::sleep;

use imglinker::cli::{Cli, Commands};
use imglinker::core::{config, init_logger, log_startup_configuration, metrics};
use imglinker::hosts::{http_client, HostRegistry};
use imglinker::storage::assets::{spawn_sweeper, AssetStore};
use imglinker::storage::create_pool;
use imglinker::telegram::webhook;
use imglinker::telegram::{
    create_bot, schema, setup_bot_commands, HandlerDeps, TelegramMembership, TelegramRelay,
};
use imglinker::upload::{ChannelGate, Relay, UploadFlow};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env before any config is read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH, &config::LOG_LEVEL)?;

    match cli.command {
        Some(Commands::Run { webhook }) => {
            log::info!("Running bot (webhook: {})", webhook);
            run_bot(webhook).await
        }
        Some(Commands::SetWebhook) => {
            let bot = create_bot()?;
            let url = webhook::set_webhook(&bot).await?;
            log::info!("✅ Webhook registered at {}/<token>", url.origin().ascii_serialization());
            Ok(())
        }
        Some(Commands::DeleteWebhook) => {
            let bot = create_bot()?;
            webhook::delete_webhook(&bot).await?;
            log::info!("✅ Webhook deleted");
            Ok(())
        }
        None => {
            log::info!("No command specified, running bot in polling mode");
            run_bot(false).await
        }
    }
}

async fn run_bot(use_webhook: bool) -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");

    metrics::init_metrics();

    let bot = create_bot()?;
    let bot_info = bot.get_me().await?;
    log::info!("Bot username: {:?}, Bot ID: {}", bot_info.username, bot_info.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    let downloads_dir = PathBuf::from(config::DOWNLOADS_DIR.as_str());
    tokio::fs::create_dir_all(&downloads_dir).await?;

    let hosts = Arc::new(HostRegistry::from_config(http_client()?));
    log_startup_configuration(&hosts);

    let assets = Arc::new(AssetStore::new());
    let _sweeper = config::assets::ttl().map(|ttl| {
        spawn_sweeper(Arc::clone(&assets), ttl, config::assets::sweep_interval(ttl))
    });

    let relay: Arc<dyn Relay> = Arc::new(TelegramRelay::new(bot.clone())?);
    let gate = ChannelGate::new(
        config::FORCE_SUB_CHANNEL.clone(),
        Arc::new(TelegramMembership::new(bot.clone())),
    );
    let flow = Arc::new(UploadFlow::new(
        Arc::clone(&relay),
        assets,
        hosts,
        gate,
        downloads_dir,
    ));

    let deps = HandlerDeps::new(db_pool, flow, relay, *config::OWNER_ID);
    let handler = schema(deps);

    log::info!("================================================");
    log::info!(
        "🎉 Bot initialization complete in {:.2}s",
        bot_init_start.elapsed().as_secs_f64()
    );
    log::info!("📡 Ready to receive updates!");
    log::info!("================================================");

    if use_webhook {
        log::info!("Starting bot in webhook mode on port {}", *config::PORT);
        let listener = webhook::start(bot.clone()).await?;
        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the webhook listener"),
            )
            .await;
        return Ok(());
    }

    log::info!("Starting bot in long polling mode");
    bot.delete_webhook().await?;

    let mut retry_count = 0;
    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;

    // Run the dispatcher with retry logic
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // A panic in the dispatcher is caught via the JoinHandle
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone())
                .allowed_updates(webhook::allowed_updates())
                .build();

            Dispatcher::builder(bot_clone, handler_clone)
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) if join_err.is_panic() => {
                log::error!("Dispatcher panicked: {}", join_err);
                if retry_count >= max_retries {
                    log::error!("Max retries reached after panic. Exiting...");
                    break;
                }
                retry_count += 1;
                log::info!(
                    "Retrying dispatcher (attempt {}/{})...",
                    retry_count,
                    max_retries
                );
                sleep(config::retry::dispatcher_delay()).await;
            }
            Err(join_err) => {
                log::warn!("Dispatcher task was cancelled: {}", join_err);
                break;
            }
        }
    }

    Ok(())
}

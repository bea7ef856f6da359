//! Webhook mode: teloxide's axum listener plus health and metrics routes

use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use teloxide::prelude::*;
use teloxide::types::AllowedUpdate;
use teloxide::update_listeners::webhooks::{self, Options};
use teloxide::update_listeners::UpdateListener;
use tokio::net::TcpListener;
use url::Url;

use crate::core::{config, metrics};

async fn health() -> &'static str {
    "Bot Is Up"
}

async fn metrics_text() -> String {
    metrics::render()
}

/// `GET /` and `GET /metrics`
pub fn service_routes() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/metrics", get(metrics_text))
}

/// `PUBLIC_URL/<BOT_TOKEN>`
pub fn webhook_url(public_url: &str, token: &str) -> anyhow::Result<Url> {
    let base = public_url.trim_end_matches('/');
    Url::parse(&format!("{base}/{token}")).map_err(|e| anyhow::anyhow!("Invalid PUBLIC_URL: {}", e))
}

pub fn allowed_updates() -> Vec<AllowedUpdate> {
    vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]
}

/// Serves updates on `0.0.0.0:PORT` at `PUBLIC_URL/<BOT_TOKEN>`.
pub async fn start(bot: Bot) -> anyhow::Result<impl UpdateListener<Err = std::convert::Infallible>> {
    let public_url = config::PUBLIC_URL
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("PUBLIC_URL is required in webhook mode"))?;
    let url = webhook_url(public_url, bot.token())?;
    let addr = SocketAddr::from(([0, 0, 0, 0], *config::PORT));
    serve(bot, url, addr).await
}

/// Registers `url` through teloxide (which adds the secret token), binds
/// `addr` and serves updates plus the service routes. Pending updates are
/// kept. Returns the listener to hand to the dispatcher.
pub async fn serve(
    bot: Bot,
    url: Url,
    addr: SocketAddr,
) -> anyhow::Result<impl UpdateListener<Err = std::convert::Infallible>> {
    let options = Options::new(addr, url);
    let (listener, stop_flag, router) = webhooks::axum_to_router(bot, options).await?;
    let app = router.merge(service_routes());

    let tcp = TcpListener::bind(addr).await?;
    log::info!("🌐 Webhook server listening on {}", addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
            log::error!("Webhook server error: {}", e);
        }
    });

    Ok(listener)
}

/// Registers `PUBLIC_URL/<BOT_TOKEN>` with Telegram and returns it
pub async fn set_webhook(bot: &Bot) -> anyhow::Result<Url> {
    let public_url = config::PUBLIC_URL
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("PUBLIC_URL is required to register a webhook"))?;
    let url = webhook_url(public_url, bot.token())?;
    bot.set_webhook(url.clone()).allowed_updates(allowed_updates()).await?;
    Ok(url)
}

pub async fn delete_webhook(bot: &Bot) -> anyhow::Result<()> {
    bot.delete_webhook().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url() {
        let url = webhook_url("https://bot.example.com/", "123:abc").unwrap();
        assert_eq!(url.as_str(), "https://bot.example.com/123:abc");
        assert!(webhook_url("not a url", "t").is_err());
    }

    #[test]
    fn test_allowed_updates() {
        assert_eq!(
            allowed_updates(),
            vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]
        );
    }

    #[tokio::test]
    async fn test_health_text() {
        assert_eq!(health().await, "Bot Is Up");
    }
}

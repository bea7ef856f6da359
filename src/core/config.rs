use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot
///
/// Every value is read once from the environment on first access. `main`
/// loads `.env` through `dotenvy` before touching any of these.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Public base URL of the deployed bot (webhook mode)
/// Read from PUBLIC_URL, falling back to RENDER_EXTERNAL_URL and K_SERVICE_URL
pub static PUBLIC_URL: Lazy<Option<String>> = Lazy::new(|| {
    non_empty_var("PUBLIC_URL")
        .or_else(|| non_empty_var("RENDER_EXTERNAL_URL"))
        .or_else(|| non_empty_var("K_SERVICE_URL"))
        .map(|url| url.trim_end_matches('/').to_string())
});

/// HTTP port for the webhook server
/// Read from PORT environment variable
/// Default: 5000
pub static PORT: Lazy<u16> = Lazy::new(|| {
    env::var("PORT")
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(5000)
});

/// Custom Bot API server URL (local telegram-bot-api)
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("BOT_API_URL"));

/// Channel users must join before using the bot (`@name` or numeric id)
/// Unset or empty disables the subscription gate
pub static FORCE_SUB_CHANNEL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("FORCE_SUB_CHANNEL"));

/// Owner user id (for /users and /broadcast)
/// 0 means no owner is configured
pub static OWNER_ID: Lazy<i64> = Lazy::new(|| {
    env::var("OWNER_ID")
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: database.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "database.sqlite".to_string()));

/// Directory for downloaded images awaiting upload
/// Read from DOWNLOADS_DIR environment variable
/// Default: downloads
pub static DOWNLOADS_DIR: Lazy<String> =
    Lazy::new(|| env::var("DOWNLOADS_DIR").unwrap_or_else(|_| "downloads".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Log level (error, warn, info, debug, trace)
/// Read from LOG_LEVEL environment variable
/// Default: info
pub static LOG_LEVEL: Lazy<String> =
    Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Image host credentials
pub mod hosts {
    use once_cell::sync::Lazy;
    use secrecy::SecretString;

    /// ImgBB API key
    /// The ImgBB destination is only offered when this is set
    pub static IMGBB_API_KEY: Lazy<Option<SecretString>> =
        Lazy::new(|| super::non_empty_var("IMGBB_API_KEY").map(SecretString::from));
}

/// Asset reference lifetime configuration
pub mod assets {
    use super::Duration;
    use once_cell::sync::Lazy;
    use std::env;

    /// Default age (in seconds) after which an abandoned reference is evicted
    pub const DEFAULT_TTL_SECS: u64 = 3600;

    /// Lower bound for the sweeper interval (in seconds)
    pub const MIN_SWEEP_INTERVAL_SECS: u64 = 30;

    /// Read from ASSET_TTL_SECS environment variable; 0 disables eviction
    pub static TTL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("ASSET_TTL_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_TTL_SECS)
    });

    /// Reference time-to-live, `None` when eviction is disabled
    pub fn ttl() -> Option<Duration> {
        match *TTL_SECS {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// How often the sweeper looks for stale references
    pub fn sweep_interval(ttl: Duration) -> Duration {
        (ttl / 4).max(Duration::from_secs(MIN_SWEEP_INTERVAL_SECS))
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for HTTP requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Broadcast configuration
pub mod broadcast {
    use super::Duration;

    /// Pause between consecutive broadcast messages (in milliseconds)
    pub const SEND_DELAY_MS: u64 = 100;

    pub fn send_delay() -> Duration {
        Duration::from_millis(SEND_DELAY_MS)
    }
}

/// Dispatcher reconnection configuration
pub mod retry {
    use super::Duration;

    /// Maximum number of retries for dispatcher reconnection
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher retry attempts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;

    /// Dispatcher retry delay duration
    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(DISPATCHER_RETRY_DELAY_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_interval_is_quarter_of_ttl() {
        assert_eq!(
            assets::sweep_interval(Duration::from_secs(3600)),
            Duration::from_secs(900)
        );
    }

    #[test]
    fn test_sweep_interval_has_lower_bound() {
        assert_eq!(
            assets::sweep_interval(Duration::from_secs(10)),
            Duration::from_secs(assets::MIN_SWEEP_INTERVAL_SECS)
        );
    }
}

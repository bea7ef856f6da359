//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of which features are configured

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;
use crate::hosts::HostRegistry;

/// Parses a textual level ("warn", "DEBUG", ...) falling back to `Info`
pub fn parse_level(raw: &str) -> LevelFilter {
    raw.trim().parse::<LevelFilter>().unwrap_or(LevelFilter::Info)
}

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `level` - Textual log level, see [`parse_level`]
pub fn init_logger(log_file_path: &str, level: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;
    let level = parse_level(level);

    let log_config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("h2")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(level, log_config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, log_config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs which destinations and gates are active. Never prints secrets.
pub fn log_startup_configuration(hosts: &HostRegistry) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🖼️  Image hosts: {}", hosts.tags().join(", "));
    if config::hosts::IMGBB_API_KEY.is_none() {
        log::warn!("⚠️  IMGBB_API_KEY not set - ImgBB is not offered");
    }

    match config::FORCE_SUB_CHANNEL.as_deref() {
        Some(channel) => log::info!("🔒 Subscription gate: {}", channel),
        None => log::info!("🔓 Subscription gate: disabled"),
    }

    if *config::OWNER_ID == 0 {
        log::warn!("⚠️  OWNER_ID not set - /users and /broadcast are unavailable");
    }

    match config::assets::ttl() {
        Some(ttl) => log::info!("🧹 Abandoned images are evicted after {}s", ttl.as_secs()),
        None => log::warn!("⚠️  ASSET_TTL_SECS=0 - abandoned images are never evicted"),
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

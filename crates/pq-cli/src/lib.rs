//! PQ CLI - operator front end for the quote desk
//!
//! - [`AppConfig`]: TOML file plus environment overlay
//! - [`build_desk`]: wires the Sheets store and Resend notifier when configured
//! - [`commands`]: clap command tree and dispatch
//!
//! # Example
//!
//! ```rust,ignore
//! use pq_cli::{build_desk, commands, AppConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::load(None)?;
//! let desk = build_desk(&config).await;
//! desk.bootstrap().await;
//! let matches = commands::cli().get_matches_from(["pq-desk", "health"]);
//! println!("{}", commands::run(&desk, &matches).await?);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod commands;
pub mod config;
pub mod logging;

pub use config::AppConfig;
pub use logging::{init_logging, LogFormat};

use pq_sheets::{ResendNotifier, SheetsApiStore};
use pq_sync::QuoteDesk;
use std::sync::Arc;

/// Build a desk from `config`.
///
/// Adapter failures are logged and the desk falls back to local-only
/// operation for that concern.
pub async fn build_desk(config: &AppConfig) -> QuoteDesk {
    let mut desk = QuoteDesk::new(config.desk_config());

    if let Some(sheets) = config.sheets_config() {
        match SheetsApiStore::connect(sheets).await {
            Ok(store) => {
                tracing::info!(spreadsheet = store.spreadsheet_id(), "remote sheet enabled");
                desk = desk.with_remote(Arc::new(store));
            }
            Err(e) => tracing::warn!(error = %e, "remote sheet disabled"),
        }
    } else {
        tracing::info!("no spreadsheet configured, running local-only");
    }

    if let Some(resend) = config.resend_config() {
        match ResendNotifier::new(resend) {
            Ok(notifier) => desk = desk.with_notifier(Arc::new(notifier)),
            Err(e) => tracing::warn!(error = %e, "notifications disabled"),
        }
    }

    desk
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

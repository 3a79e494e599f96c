//! PQ Sheets - HTTP adapters for the quote desk
//!
//! - [`SheetsApiStore`]: Google Sheets v4 values API behind the
//!   `TabularStore` port
//! - [`ResendNotifier`]: Resend e-mail API behind the `NotificationPort`
//!
//! # Example
//!
//! ```rust,ignore
//! use pq_sheets::{SheetsApiStore, SheetsConfig};
//! use pq_sync::{DeskConfig, QuoteDesk};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SheetsApiStore::connect(SheetsConfig::new("1AbC...")).await?;
//! let desk = QuoteDesk::new(DeskConfig::new()).with_remote(Arc::new(store));
//! desk.bootstrap().await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod resend;
pub mod sheets;

pub use config::{ResendConfig, SheetsConfig};
pub use error::AdapterError;
pub use resend::ResendNotifier;
pub use sheets::SheetsApiStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

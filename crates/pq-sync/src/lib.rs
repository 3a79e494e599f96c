//! PQ Sync - request store, sheet synchronization and the quote desk
//!
//! Everything between the pure domain in `pq_core` and the outside world:
//! - The authoritative in-memory [`RequestStore`] with its JSON snapshot
//! - The [`TabularStore`] port and an in-memory implementation
//! - The two-tab [`SheetSyncEngine`] (pull, push, header repair)
//! - [`SettingsStore`] with local file and remote key/value tab
//! - The [`NotificationPort`] and detached [`BackgroundTasks`]
//! - The [`QuoteDesk`] facade that ties them together
//!
//! # Example
//!
//! ```rust,ignore
//! use pq_sync::{DeskConfig, MemoryTabularStore, QuoteDesk};
//! use pq_core::NewRequest;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let desk = QuoteDesk::new(DeskConfig::in_dir("/tmp/pq"))
//!     .with_remote(Arc::new(MemoryTabularStore::new()));
//! desk.bootstrap().await;
//!
//! let request = desk
//!     .submit(NewRequest::new("Ada", "ada@example.com", "https://stlflix.com/m/1"))
//!     .await?;
//! desk.set_status(&request.id, "responded").await?;
//! desk.flush().await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod desk;
pub mod engine;
pub mod error;
pub mod memory;
pub mod notify;
pub mod settings_store;
pub mod snapshot;
pub mod store;
pub mod tabular;
pub mod tasks;

// Re-exports for convenience
pub use config::{DeskConfig, TabNames};
pub use desk::{BootstrapReport, DeskStatus, QuoteDesk};
pub use engine::{HeaderAction, PullReport, PushReport, SheetSyncEngine};
pub use error::{DeskError, SyncError};
pub use memory::{MemoryTabularStore, StoreCall};
pub use notify::{NoopNotifier, NotificationPort, NotifyError};
pub use settings_store::SettingsStore;
pub use snapshot::{SnapshotCache, SnapshotError};
pub use store::{RequestStore, StoreCounts};
pub use tabular::{RowSpan, StoreError, TabRange, TabularStore, MAX_ROWS};
pub use tasks::{BackgroundTasks, TaskError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with PQ Sync
    pub use crate::{
        DeskConfig, DeskError, MemoryTabularStore, NotificationPort, QuoteDesk, RequestStore,
        SheetSyncEngine, SyncError, TabularStore,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! PQ Core - quote request domain
//!
//! Everything that does not touch a network or a disk:
//! - The [`Request`] record and its submission payload
//! - The status workflow
//! - The versioned [`RowCodec`] between records and sheet rows
//! - Settings sanitize/merge and the site registry
//! - Source detection for model links
//! - Notification message composition and export projections
//!
//! # Example
//!
//! ```rust
//! use pq_core::{NewRequest, RowCodec, RowLayout};
//!
//! let request = NewRequest::new("Ada", "ada@example.com", "https://stlflix.com/m/1")
//!     .into_request()
//!     .unwrap();
//!
//! let codec = RowCodec::current();
//! let row = codec.encode(&request);
//! let back = codec.decode(&row, &RowLayout::canonical()).unwrap();
//! assert_eq!(back.id, request.id);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod codec;
pub mod error;
pub mod export;
pub mod notification;
pub mod settings;
pub mod source;
pub mod status;
pub mod timestamp;
pub mod types;

// Re-exports for convenience
pub use codec::{Column, DecodedTab, Row, RowCodec, RowLayout, SchemaVersion, CANONICAL_HEADER};
pub use error::CoreError;
pub use notification::QuoteNotification;
pub use settings::{Settings, SettingsPatch, SiteInput, SupportedSite};
pub use source::{detect_source, DetectedSource};
pub use status::{apply_status, RequestStatus};
pub use types::{NewRequest, Request, RequestId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with PQ Core
    pub use crate::{
        apply_status, detect_source, CoreError, NewRequest, Request, RequestId, RequestStatus,
        RowCodec, RowLayout, Settings,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn submission_to_row_and_back() {
        let settings = Settings::default();
        let mut request = NewRequest::new("Ada", "ada@example.com", "https://platform.stlflix.com/x")
            .into_request()
            .unwrap();

        let source = detect_source(&request.model_link, &settings.supported_sites);
        assert_eq!(source.label, "STLFlix");

        apply_status(&mut request, "sent_to_printer").unwrap();
        request.set_archived(true);

        let codec = RowCodec::current();
        let back = codec
            .decode(&codec.encode(&request), &RowLayout::canonical())
            .unwrap();
        assert_eq!(back.status, RequestStatus::SentToPrinter);
        assert!(back.archived);
    }
}

//! Fulfillment status workflow
//!
//! The happy path runs `new → responded → quote_approved → sent_to_printer →
//! print_complete → qc_complete → shipped → paid`, but the workflow is a
//! set-membership check: any enumerated status may follow any other,
//! including backward moves and skips.

use crate::error::CoreError;
use crate::types::Request;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\s]+").expect("static regex"));

/// Status of a quote request
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Just submitted
    #[default]
    New,
    /// Customer has been contacted
    Responded,
    /// Customer accepted the quote
    QuoteApproved,
    /// Queued on a printer
    SentToPrinter,
    /// Printing finished
    PrintComplete,
    /// Quality check passed
    QcComplete,
    /// Shipped to the customer
    Shipped,
    /// Payment received
    Paid,
}

impl RequestStatus {
    /// All statuses in happy-path order
    pub const ALL: [RequestStatus; 8] = [
        RequestStatus::New,
        RequestStatus::Responded,
        RequestStatus::QuoteApproved,
        RequestStatus::SentToPrinter,
        RequestStatus::PrintComplete,
        RequestStatus::QcComplete,
        RequestStatus::Shipped,
        RequestStatus::Paid,
    ];

    /// Internal code (`quote_approved`)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Responded => "responded",
            Self::QuoteApproved => "quote_approved",
            Self::SentToPrinter => "sent_to_printer",
            Self::PrintComplete => "print_complete",
            Self::QcComplete => "qc_complete",
            Self::Shipped => "shipped",
            Self::Paid => "paid",
        }
    }

    /// Display label used in sheet cells and exports (`Quote approved`)
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Responded => "Responded",
            Self::QuoteApproved => "Quote approved",
            Self::SentToPrinter => "Sent to printer",
            Self::PrintComplete => "Print complete",
            Self::QcComplete => "QC complete",
            Self::Shipped => "Shipped",
            Self::Paid => "Paid",
        }
    }

    /// Lenient decode of a stored cell.
    ///
    /// Case and whitespace are normalized, so both `Quote approved` and
    /// `quote_approved` decode. Blank or unrecognized input yields `New`.
    #[must_use]
    pub fn from_label(value: &str) -> Self {
        let norm = SEPARATORS
            .replace_all(value.trim(), "_")
            .to_lowercase();
        norm.parse().unwrap_or_default()
    }
}

impl FromStr for RequestStatus {
    type Err = CoreError;

    /// Strict parse of an internal code
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply an admin-supplied status to a record.
///
/// # Errors
/// - `CoreError::InvalidStatus` if `new_status` is not an internal code. The
///   record is left untouched.
pub fn apply_status(record: &mut Request, new_status: &str) -> Result<RequestStatus, CoreError> {
    let status: RequestStatus = new_status.parse()?;
    record.status = status;
    record.touch();
    Ok(status)
}

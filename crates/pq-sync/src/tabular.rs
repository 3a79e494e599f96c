//! Remote tabular store port
//!
//! The sync engine only needs three range operations plus tab creation, so
//! any remote sheet API, or an in-memory fake, can stand behind it.
//!
//! Rows are 1-based as in spreadsheet A1 notation; columns are zero-based
//! widths starting at column `A`.

use async_trait::async_trait;
use pq_core::Row;
use std::fmt;

/// Last data row the engine reads or clears
pub const MAX_ROWS: usize = 10_000;

/// Inclusive span of 1-based rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowSpan {
    /// First row
    pub first: usize,
    /// Last row
    pub last: usize,
}

impl RowSpan {
    /// Span from `first` to `last`
    #[inline]
    #[must_use]
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    /// The header row only
    #[inline]
    #[must_use]
    pub fn header() -> Self {
        Self::new(1, 1)
    }

    /// Header plus all data rows
    #[inline]
    #[must_use]
    pub fn whole(last: usize) -> Self {
        Self::new(1, last)
    }

    /// Data rows below the header
    #[inline]
    #[must_use]
    pub fn data(last: usize) -> Self {
        Self::new(2, last)
    }

    /// Whether a 1-based row falls in the span
    #[inline]
    #[must_use]
    pub fn contains(&self, row: usize) -> bool {
        (self.first..=self.last).contains(&row)
    }
}

/// Rectangular range within one tab
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabRange {
    /// Tab title
    pub tab: String,
    /// Rows covered
    pub rows: RowSpan,
    /// Number of columns from `A`
    pub width: usize,
}

impl TabRange {
    /// Create range
    #[inline]
    #[must_use]
    pub fn new(tab: impl Into<String>, rows: RowSpan, width: usize) -> Self {
        Self {
            tab: tab.into(),
            rows,
            width,
        }
    }

    /// A1 notation, e.g. `Active!A2:K10000`
    #[must_use]
    pub fn to_a1(&self) -> String {
        format!(
            "{}!A{}:{}{}",
            quote_tab(&self.tab),
            self.rows.first,
            column_letter(self.width.saturating_sub(1)),
            self.rows.last
        )
    }
}

impl fmt::Display for TabRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Anchor cell for a write, e.g. `Active!A1`
#[must_use]
pub fn anchor_a1(tab: &str, row: usize) -> String {
    format!("{}!A{row}", quote_tab(tab))
}

/// Column letters for a zero-based index (`0 → A`, `26 → AA`)
#[must_use]
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn quote_tab(tab: &str) -> String {
    if tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        tab.to_string()
    } else {
        format!("'{}'", tab.replace('\'', "''"))
    }
}

/// Remote store failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Could not reach the store
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the call
    #[error("store rejected request ({status}): {message}")]
    Rejected {
        /// Transport status code
        status: u16,
        /// Store-supplied message
        message: String,
    },

    /// The store answered with something unreadable
    #[error("malformed store response: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Check if the store could not be reached at all
    #[inline]
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Check if a later attempt could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed(_) => false,
        }
    }
}

/// A remote store of named tabs holding rows of string cells
#[async_trait]
pub trait TabularStore: Send + Sync + fmt::Debug {
    /// Read the rows of `range`.
    ///
    /// Trailing empty rows and trailing empty cells may be omitted, as the
    /// Sheets API does.
    async fn read_range(&self, range: &TabRange) -> Result<Vec<Row>, StoreError>;

    /// Blank every cell of `range`
    async fn clear_range(&self, range: &TabRange) -> Result<(), StoreError>;

    /// Write `rows` starting at column `A` of row `first_row`
    async fn write_rows(&self, tab: &str, first_row: usize, rows: &[Row])
        -> Result<(), StoreError>;

    /// Create `tab` if it does not exist
    async fn ensure_tab(&self, tab: &str) -> Result<(), StoreError>;
}

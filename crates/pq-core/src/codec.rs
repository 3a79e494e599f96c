//! Row codec
//!
//! Maps a [`Request`] to an ordered row of string cells and back.
//!
//! # Schema drift
//!
//! The sheet has carried two layouts:
//! - `V1`: nine columns, `ID` through `Archived`
//! - `V2`: eleven columns, adds `Admin Notes` and `Tracking #` at the end
//!
//! Decoding never assumes positions blindly. A [`RowLayout`] is built from the
//! tab's header row by column name, with positional fallback for columns the
//! header does not name, and missing trailing cells read as empty.

use crate::status::RequestStatus;
use crate::timestamp;
use crate::types::{Request, RequestId};

/// One row of cells
pub type Row = Vec<String>;

/// Logical column of a request row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Request id
    Id,
    /// Creation time (display string)
    Created,
    /// Submitter name
    Name,
    /// Submitter e-mail
    Email,
    /// Model link
    ModelLink,
    /// Submitter details
    Details,
    /// Status label
    Status,
    /// Assignee
    FulfilledBy,
    /// `Yes` / `No`
    Archived,
    /// Admin notes
    AdminNotes,
    /// Tracking number
    TrackingNumber,
}

impl Column {
    /// All columns in canonical order
    pub const ALL: [Column; 11] = [
        Column::Id,
        Column::Created,
        Column::Name,
        Column::Email,
        Column::ModelLink,
        Column::Details,
        Column::Status,
        Column::FulfilledBy,
        Column::Archived,
        Column::AdminNotes,
        Column::TrackingNumber,
    ];

    /// Canonical header cell
    #[inline]
    #[must_use]
    pub fn header(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Created => "Created",
            Self::Name => "Name",
            Self::Email => "Email",
            Self::ModelLink => "Model Link",
            Self::Details => "Details",
            Self::Status => "Status",
            Self::FulfilledBy => "Fulfilled By",
            Self::Archived => "Archived",
            Self::AdminNotes => "Admin Notes",
            Self::TrackingNumber => "Tracking #",
        }
    }

    /// Canonical zero-based position
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        *self as usize
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::ModelLink => &["stl link", "link"],
            Self::TrackingNumber => &["tracking", "tracking number"],
            Self::FulfilledBy => &["fulfiller", "assigned to"],
            Self::Created => &["created at"],
            _ => &[],
        }
    }

    fn matches(&self, normalized: &str) -> bool {
        normalized == normalize_header_cell(self.header())
            || self.aliases().contains(&normalized)
    }
}

/// Canonical header, current schema
pub const CANONICAL_HEADER: [&str; 11] = [
    "ID",
    "Created",
    "Name",
    "Email",
    "Model Link",
    "Details",
    "Status",
    "Fulfilled By",
    "Archived",
    "Admin Notes",
    "Tracking #",
];

/// Known sheet layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SchemaVersion {
    /// Nine columns, through `Archived`
    V1,
    /// Adds admin notes and tracking number
    #[default]
    V2,
}

impl SchemaVersion {
    /// Version written by this build
    pub const CURRENT: SchemaVersion = SchemaVersion::V2;

    /// Columns in write order
    #[inline]
    #[must_use]
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Self::V1 => &Column::ALL[..9],
            Self::V2 => &Column::ALL,
        }
    }

    /// Number of columns
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns().len()
    }

    /// Header row
    #[must_use]
    pub fn header(&self) -> Row {
        self.columns()
            .iter()
            .map(|c| c.header().to_string())
            .collect()
    }
}

/// Column positions of one tab, derived from its header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    positions: [Option<usize>; 11],
}

impl RowLayout {
    /// Canonical positions
    #[must_use]
    pub fn canonical() -> Self {
        let mut positions = [None; 11];
        for column in Column::ALL {
            positions[column.index()] = Some(column.index());
        }
        Self { positions }
    }

    /// Build from a header row.
    ///
    /// Named columns win. A column the header does not name keeps its
    /// canonical position only if that cell is blank or past the end of the
    /// header, so a custom column is never misread as a known field.
    #[must_use]
    pub fn from_header(header: &[String]) -> Self {
        let normalized: Vec<String> = header.iter().map(|c| normalize_header_cell(c)).collect();

        let mut positions = [None; 11];
        let mut claimed = vec![false; normalized.len()];

        for column in Column::ALL {
            let found = normalized
                .iter()
                .enumerate()
                .find(|(i, cell)| !claimed[*i] && column.matches(cell))
                .map(|(i, _)| i);
            if let Some(i) = found {
                claimed[i] = true;
                positions[column.index()] = Some(i);
            }
        }

        if positions.iter().all(Option::is_none) {
            return Self::canonical();
        }

        for column in Column::ALL {
            if positions[column.index()].is_some() {
                continue;
            }
            let i = column.index();
            let free = match normalized.get(i) {
                None => true,
                Some(cell) => cell.is_empty() && !claimed[i],
            };
            if free {
                positions[column.index()] = Some(i);
            }
        }

        Self { positions }
    }

    /// Position of a column, if the tab has one
    #[inline]
    #[must_use]
    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions[column.index()]
    }

    /// Whether this equals the canonical layout
    #[inline]
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        *self == Self::canonical()
    }
}

impl Default for RowLayout {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Records decoded from one tab
#[derive(Debug, Clone, Default)]
pub struct DecodedTab {
    /// Decoded records, in row order
    pub records: Vec<Request>,
    /// Data rows dropped for having no id
    pub skipped: usize,
}

/// Versioned request row codec
#[derive(Debug, Clone, Copy, Default)]
pub struct RowCodec {
    version: SchemaVersion,
}

impl RowCodec {
    /// Codec writing the given schema
    #[inline]
    #[must_use]
    pub fn new(version: SchemaVersion) -> Self {
        Self { version }
    }

    /// Codec writing the current schema
    #[inline]
    #[must_use]
    pub fn current() -> Self {
        Self::new(SchemaVersion::CURRENT)
    }

    /// Schema written by this codec
    #[inline]
    #[must_use]
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Header row written by this codec
    #[inline]
    #[must_use]
    pub fn header(&self) -> Row {
        self.version.header()
    }

    /// Encode a record in schema order
    #[must_use]
    pub fn encode(&self, record: &Request) -> Row {
        self.version
            .columns()
            .iter()
            .map(|column| encode_cell(*column, record))
            .collect()
    }

    /// Decode one data row.
    ///
    /// Returns `None` when the id cell is blank or missing.
    #[must_use]
    pub fn decode(&self, row: &[String], layout: &RowLayout) -> Option<Request> {
        let cell = |column: Column| -> &str {
            layout
                .position(column)
                .and_then(|i| row.get(i))
                .map_or("", String::as_str)
        };

        let id = cell(Column::Id);
        if id.trim().is_empty() {
            return None;
        }

        let fulfilled_by = cell(Column::FulfilledBy);
        let archived = cell(Column::Archived).trim().to_lowercase();

        Some(Request {
            id: RequestId::from(id),
            name: cell(Column::Name).to_string(),
            email: cell(Column::Email).to_string(),
            model_link: cell(Column::ModelLink).to_string(),
            details: cell(Column::Details).to_string(),
            status: RequestStatus::from_label(cell(Column::Status)),
            fulfilled_by: (!fulfilled_by.trim().is_empty()).then(|| fulfilled_by.to_string()),
            archived: archived == "yes" || archived == "true",
            admin_notes: cell(Column::AdminNotes).to_string(),
            tracking_number: cell(Column::TrackingNumber).to_string(),
            created_at: timestamp::parse_flexible(cell(Column::Created))
                .unwrap_or_else(timestamp::now),
            updated_at: timestamp::now(),
        })
    }

    /// Decode a whole tab whose first row is the header
    #[must_use]
    pub fn decode_tab(&self, rows: &[Row]) -> DecodedTab {
        let Some((header, data)) = rows.split_first() else {
            return DecodedTab::default();
        };
        let layout = RowLayout::from_header(header);

        let mut decoded = DecodedTab::default();
        for row in data {
            match self.decode(row, &layout) {
                Some(record) => decoded.records.push(record),
                None => decoded.skipped += 1,
            }
        }
        decoded
    }
}

fn encode_cell(column: Column, record: &Request) -> String {
    match column {
        Column::Id => record.id.to_string(),
        Column::Created => timestamp::to_display(&record.created_at),
        Column::Name => record.name.clone(),
        Column::Email => record.email.clone(),
        Column::ModelLink => record.model_link.clone(),
        Column::Details => record.details.clone(),
        Column::Status => record.status.label().to_string(),
        Column::FulfilledBy => record.fulfilled_by.clone().unwrap_or_default(),
        Column::Archived => if record.archived { "Yes" } else { "No" }.to_string(),
        Column::AdminNotes => record.admin_notes.clone(),
        Column::TrackingNumber => record.tracking_number.clone(),
    }
}

fn normalize_header_cell(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

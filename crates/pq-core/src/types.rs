//! Core types for PQ
//!
//! Defines the record the whole system revolves around:
//! - Request identity
//! - The public submission payload
//! - The mutable quote request record and its admin mutations

use crate::error::CoreError;
use crate::status::RequestStatus;
use crate::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ulid::Ulid;

/// Opaque request identifier.
///
/// New ids are ULIDs. Ids read back from the sheet are kept verbatim, so
/// older millisecond ids stay valid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new time-derived id
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public submission payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    /// Submitter name
    #[serde(default)]
    pub name: String,
    /// Submitter e-mail
    #[serde(default)]
    pub email: String,
    /// Link to the model to print
    #[serde(default, alias = "stlLink")]
    pub model_link: String,
    /// Free-form notes from the submitter
    #[serde(default)]
    pub details: Option<String>,
}

impl NewRequest {
    /// Create payload with the required fields
    #[inline]
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        model_link: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            model_link: model_link.into(),
            details: None,
        }
    }

    /// With submitter details
    #[inline]
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Validate and build a fresh record.
    ///
    /// # Errors
    /// - `CoreError::MissingField` if name, email or model link is blank
    pub fn into_request(self) -> Result<Request, CoreError> {
        let name = required("name", &self.name)?;
        let email = required("email", &self.email)?;
        let model_link = required("modelLink", &self.model_link)?;
        let now = timestamp::now();

        Ok(Request {
            id: RequestId::generate(),
            name,
            email,
            model_link,
            details: self.details.unwrap_or_default(),
            status: RequestStatus::New,
            fulfilled_by: None,
            archived: false,
            admin_notes: String::new(),
            tracking_number: String::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CoreError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// One customer quote request and its fulfillment state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Immutable id
    pub id: RequestId,
    /// Submitter name
    #[serde(default)]
    pub name: String,
    /// Submitter e-mail
    #[serde(default)]
    pub email: String,
    /// Link to the model to print
    #[serde(default, alias = "stlLink")]
    pub model_link: String,
    /// Free-form notes from the submitter
    #[serde(default)]
    pub details: String,
    /// Workflow status
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: RequestStatus,
    /// Assignee display name, not checked against settings
    #[serde(default, deserialize_with = "blank_as_none")]
    pub fulfilled_by: Option<String>,
    /// Partition flag
    #[serde(default)]
    pub archived: bool,
    /// Admin-only notes
    #[serde(default)]
    pub admin_notes: String,
    /// Carrier tracking number
    #[serde(default)]
    pub tracking_number: String,
    /// Creation instant
    #[serde(default = "timestamp::epoch", with = "timestamp::lenient")]
    pub created_at: DateTime<Utc>,
    /// Last mutation instant
    #[serde(default = "timestamp::epoch", with = "timestamp::lenient")]
    pub updated_at: DateTime<Utc>,
}

impl Request {
    /// Refresh `updated_at`
    #[inline]
    pub fn touch(&mut self) {
        self.updated_at = timestamp::now();
    }

    /// Assign a fulfiller; blank clears the assignment
    pub fn assign(&mut self, fulfiller: Option<&str>) {
        self.fulfilled_by = fulfiller
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        self.touch();
    }

    /// Replace admin notes
    pub fn set_admin_notes(&mut self, notes: impl Into<String>) {
        self.admin_notes = notes.into();
        self.touch();
    }

    /// Replace tracking number (trimmed)
    pub fn set_tracking_number(&mut self, tracking: &str) {
        self.tracking_number = tracking.trim().to_string();
        self.touch();
    }

    /// Move between the active and archived partitions
    pub fn set_archived(&mut self, archived: bool) {
        self.archived = archived;
        self.touch();
    }
}

fn lenient_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RequestStatus, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(RequestStatus::from_label)
        .unwrap_or_default())
}

fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

//! Admin notification message for a new submission

use crate::source::DetectedSource;
use crate::types::Request;
use serde::{Deserialize, Serialize};

/// Fully-formed message handed to a notification transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteNotification {
    /// Request the message is about
    pub request: Request,
    /// Source classification of the model link
    pub source: DetectedSource,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
}

impl QuoteNotification {
    /// Compose the message for `request`.
    ///
    /// `admin_url` is the service base URL; the body links to its admin page.
    #[must_use]
    pub fn compose(request: &Request, source: DetectedSource, admin_url: &str) -> Self {
        let name = escape_html(&request.name);
        let email = escape_html(&request.email);
        let link = escape_html(&request.model_link);
        let details = if request.details.trim().is_empty() {
            "(none)".to_string()
        } else {
            escape_html(&request.details)
        };
        let unsupported = if source.supported {
            ""
        } else {
            " (not on supported list)"
        };
        let admin = escape_html(admin_url.trim_end_matches('/'));

        let html = format!(
            "<h2>New Quote Request</h2>\n\
             <p><strong>Name:</strong> {name}</p>\n\
             <p><strong>Email:</strong> <a href=\"mailto:{email}\">{email}</a></p>\n\
             <p><strong>Model link:</strong> <a href=\"{link}\">{link}</a></p>\n\
             <p><strong>Detected source:</strong> {label}{unsupported}</p>\n\
             <p><strong>Details:</strong> {details}</p>\n\
             <p><a href=\"{admin}/admin.html\">View in Admin Panel</a></p>\n",
            label = escape_html(&source.label),
        );

        Self {
            request: request.clone(),
            subject: format!("New quote request from {}", request.name),
            source,
            html,
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

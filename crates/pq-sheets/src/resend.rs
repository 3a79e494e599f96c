//! Resend e-mail API as a [`NotificationPort`]

use crate::config::ResendConfig;
use crate::error::{error_message, notify_transport, AdapterError};
use async_trait::async_trait;
use pq_core::QuoteNotification;
use pq_sync::{NotificationPort, NotifyError};
use reqwest::Url;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Sends the admin notification through Resend
#[derive(Debug)]
pub struct ResendNotifier {
    config: ResendConfig,
    endpoint: Url,
    client: reqwest::Client,
}

impl ResendNotifier {
    /// Build a notifier.
    ///
    /// # Errors
    /// - `AdapterError::Config` if key, sender or recipient is blank, or the
    ///   base URL is invalid
    /// - `AdapterError::Client` if the HTTP client cannot be built
    pub fn new(config: ResendConfig) -> Result<Self, AdapterError> {
        for (field, value) in [
            ("api_key", &config.api_key),
            ("from", &config.from),
            ("to", &config.to),
        ] {
            if value.trim().is_empty() {
                return Err(AdapterError::config(format!("{field} cannot be empty")));
            }
        }

        let endpoint = Url::parse(&config.api_base)
            .and_then(|base| base.join("emails"))
            .map_err(|e| AdapterError::config(format!("invalid api_base: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            config,
            endpoint,
            client,
        })
    }
}

#[async_trait]
impl NotificationPort for ResendNotifier {
    async fn notify(&self, message: QuoteNotification) -> Result<(), NotifyError> {
        let body = EmailRequest {
            from: &self.config.from,
            to: [&self.config.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| notify_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        tracing::info!(
            request_id = %message.request.id,
            to = %self.config.to,
            "sent quote notification"
        );
        Ok(())
    }
}

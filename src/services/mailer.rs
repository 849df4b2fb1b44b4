//! Transactional mail through an HTTP relay.
//!
//! Mail is a courtesy, not a contract: every failure here is logged and
//! swallowed so signup never breaks because the relay is down.

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::MailerConfig;

#[derive(Clone)]
pub struct Mailer {
    config: MailerConfig,
    client: Client,
}

impl Mailer {
    #[must_use]
    pub fn new(config: MailerConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub async fn send_welcome(&self, to_email: &str, name: Option<&str>) {
        let greeting = name.unwrap_or("there");
        let body = format!(
            "Hi {greeting},\n\nYour Snapnest account is ready. Create an event and share the \
             link with your guests to start collecting photos.\n"
        );

        self.send(to_email, "Welcome to Snapnest", &body).await;
    }

    async fn send(&self, to_email: &str, subject: &str, body: &str) {
        if !self.config.enabled {
            debug!(to = %to_email, subject = %subject, "Mailer disabled, skipping send");
            return;
        }

        let payload = json!({
            "from": {
                "address": self.config.from_address,
                "name": self.config.from_name,
            },
            "to": to_email,
            "subject": subject,
            "text": body,
        });

        let result = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(to = %to_email, status = %response.status(), "Mail relay refused message");
            }
            Err(e) => warn!(to = %to_email, "Mail send failed: {e}"),
            Ok(_) => debug!(to = %to_email, subject = %subject, "Mail sent"),
        }
    }
}

//! Outbound email message type.
//!
//! The store server queues these into the mail outbox; the worker decides
//! how they actually leave the machine (HTTP gateway or log-only).

use serde::{Deserialize, Serialize};

/// A single outbound email, ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
    /// Optional deep link appended to the body (e.g. an order detail page).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
}

impl EmailMessage {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            recipients,
            link_url: None,
        }
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link_url = Some(url.into());
        self
    }

    /// Body with the deep link appended, as delivered.
    pub fn rendered_body(&self) -> String {
        match &self.link_url {
            Some(url) => format!("{}\n\n{}", self.body, url),
            None => self.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_body_appends_link() {
        let mail = EmailMessage::new("Hi", "Halo", vec!["a@b.c".into()])
            .with_link("https://store.example/orders/1");
        assert!(mail.rendered_body().ends_with("https://store.example/orders/1"));

        let plain = EmailMessage::new("Hi", "Halo", vec!["a@b.c".into()]);
        assert_eq!(plain.rendered_body(), "Halo");
    }
}

//! Multipart delivery of canonical messages to the relay endpoint.

use std::time::Duration;

use {
    reqwest::multipart::{Form, Part},
    tracing::{debug, warn},
    wabridge_protocol::DEFAULT_RELAY_TIMEOUT_SECS,
};

use crate::{
    error::{Error, Result},
    message::{Attachment, CanonicalMessage},
};

pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(DEFAULT_RELAY_TIMEOUT_SECS);

/// POSTs canonical messages to a single webhook. No retries.
#[derive(Debug, Clone)]
pub struct WebhookRelay {
    http: reqwest::Client,
    url: Option<String>,
    timeout: Duration,
}

impl WebhookRelay {
    pub fn new(url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.filter(|u| !u.trim().is_empty()),
            timeout: DEFAULT_RELAY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Deliver and return the response body; every failure is logged and
    /// collapses to an empty string.
    pub async fn relay(&self, message: &CanonicalMessage, attachment: &Attachment) -> String {
        match self.try_relay(message, attachment).await {
            Ok(body) => body,
            Err(e) => {
                warn!(message_id = %message.id, chat = %message.chat, error = %e, "relay failed");
                String::new()
            },
        }
    }

    pub async fn try_relay(
        &self,
        message: &CanonicalMessage,
        attachment: &Attachment,
    ) -> Result<String> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| Error::relay("no relay endpoint configured"))?;

        let form = build_form(message, attachment)?;
        let resp = self
            .http
            .post(url)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::relay(format!("endpoint answered {status}")));
        }

        let body = resp.text().await?;
        debug!(message_id = %message.id, bytes = body.len(), "relayed message");
        Ok(body)
    }
}

/// One text part per canonical field, then the file part if any.
pub fn build_form(message: &CanonicalMessage, attachment: &Attachment) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in message.fields() {
        form = form.text(name, value);
    }

    if !attachment.is_empty()
        && let Some(data) = attachment.data.clone()
    {
        let part = Part::bytes(data)
            .file_name(attachment.filename.clone())
            .mime_str("application/octet-stream")?;
        form = form.part("attachment", part);
    }

    Ok(form)
}

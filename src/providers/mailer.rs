// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound email for the account lifecycle.
//!
//! Production delivery goes through an HTTP mail relay
//! ([`MailRelayClient`]); local development runs without credentials using
//! [`LogNotifier`], which writes the code or link to the log instead of
//! sending anything.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use url::Url;

use crate::config::{self, OTP_TTL_MINUTES, RESET_TOKEN_TTL_MINUTES};

const MAIL_RELAY_URL_ENV: &str = "MAIL_RELAY_URL";
const MAIL_RELAY_API_KEY_ENV: &str = "MAIL_RELAY_API_KEY";
const MAIL_FROM_ENV: &str = "MAIL_FROM";
const DEFAULT_MAIL_FROM: &str = "no-reply@relational.markets";

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("mail relay configuration missing: {0}")]
    MissingConfig(String),

    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound account-lifecycle email.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the one-time verification code issued at registration.
    async fn send_otp(&self, email: &str, name: &str, code: &str) -> Result<(), NotifierError>;

    /// Deliver a password-reset link.
    async fn send_password_reset(
        &self,
        email: &str,
        name: &str,
        link: &Url,
    ) -> Result<(), NotifierError>;
}

/// Subject and body for the verification email.
fn otp_message(name: &str, code: &str) -> (String, String) {
    let subject = "Verify your email".to_string();
    let text = format!(
        "Hi {name},\n\n\
         Your verification code is {code}. It expires in {OTP_TTL_MINUTES} minutes.\n\n\
         If you did not create an account, you can ignore this email."
    );
    (subject, text)
}

/// Subject and body for the password-reset email.
fn reset_message(name: &str, link: &Url) -> (String, String) {
    let subject = "Reset your password".to_string();
    let text = format!(
        "Hi {name},\n\n\
         Follow this link to choose a new password: {link}\n\
         The link expires in {RESET_TOKEN_TTL_MINUTES} minutes.\n\n\
         If you did not request a reset, you can ignore this email."
    );
    (subject, text)
}

// =============================================================================
// MailRelayClient
// =============================================================================

/// HTTP transactional-mail relay client.
///
/// Sends `POST {relay_url}` with a JSON message and a bearer key.
#[derive(Debug, Clone)]
pub struct MailRelayClient {
    relay_url: String,
    api_key: String,
    from: String,
    http: Client,
}

impl MailRelayClient {
    /// Whether the environment carries relay credentials.
    pub fn is_configured() -> bool {
        config::env_optional(MAIL_RELAY_URL_ENV).is_some()
            && config::env_optional(MAIL_RELAY_API_KEY_ENV).is_some()
    }

    pub fn from_env() -> Result<Self, NotifierError> {
        let relay_url = config::env_optional(MAIL_RELAY_URL_ENV)
            .ok_or_else(|| NotifierError::MissingConfig(MAIL_RELAY_URL_ENV.to_string()))?;
        let api_key = config::env_optional(MAIL_RELAY_API_KEY_ENV)
            .ok_or_else(|| NotifierError::MissingConfig(MAIL_RELAY_API_KEY_ENV.to_string()))?;
        let from =
            config::env_optional(MAIL_FROM_ENV).unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| NotifierError::Delivery(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            relay_url,
            api_key,
            from,
            http,
        })
    }

    async fn send_message(
        &self,
        to: &str,
        subject: &str,
        text: &str,
    ) -> Result<(), NotifierError> {
        let payload = json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "text": text,
        });

        let response = self
            .http
            .post(&self.relay_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifierError::Delivery(format!("mail relay request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Delivery(format!(
                "mail relay returned {status}: {body}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for MailRelayClient {
    async fn send_otp(&self, email: &str, name: &str, code: &str) -> Result<(), NotifierError> {
        let (subject, text) = otp_message(name, code);
        self.send_message(email, &subject, &text).await
    }

    async fn send_password_reset(
        &self,
        email: &str,
        name: &str,
        link: &Url,
    ) -> Result<(), NotifierError> {
        let (subject, text) = reset_message(name, link);
        self.send_message(email, &subject, &text).await
    }
}

// =============================================================================
// LogNotifier
// =============================================================================

/// Development notifier: writes codes and links to the log, sends nothing.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_otp(&self, email: &str, _name: &str, code: &str) -> Result<(), NotifierError> {
        tracing::info!(email = %email, code = %code, "mail relay not configured, logging verification code");
        Ok(())
    }

    async fn send_password_reset(
        &self,
        email: &str,
        _name: &str,
        link: &Url,
    ) -> Result<(), NotifierError> {
        tracing::info!(email = %email, link = %link, "mail relay not configured, logging reset link");
        Ok(())
    }
}

use std::fmt::Debug;

use anyhow::{bail, Context};
use log::debug;
use serde::{Deserialize, Serialize};

use super::Transport;
use crate::phone;

pub const DEFAULT_FROM: &str = "whatsapp:+14155238886";
const WHATSAPP: &str = "whatsapp:";

/// Sends SMS or WhatsApp messages through Twilio's Messages API.
pub struct Twilio {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
}
impl Debug for Twilio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Twilio")
            .field("account_sid", &self.account_sid)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MessageForm<'a> {
    from: &'a str,
    to: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    status: String,
}

impl Twilio {
    /// `to` is normalized, and uses the same channel (SMS or WhatsApp) as `from`.
    pub fn new(
        client: reqwest::Client,
        account_sid: String,
        auth_token: String,
        from: String,
        to: &str,
    ) -> Self {
        let to = to.trim();
        let number = phone::normalize(to.strip_prefix(WHATSAPP).unwrap_or(to));
        let to = if from.starts_with(WHATSAPP) {
            format!("{WHATSAPP}{number}")
        } else {
            number
        };
        Self {
            client,
            account_sid,
            auth_token,
            from,
            to,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        )
    }

    fn form<'a>(&'a self, message: &'a str) -> MessageForm<'a> {
        MessageForm {
            from: &self.from,
            to: &self.to,
            body: message,
        }
    }
}

impl Transport for Twilio {
    fn name(&self) -> &str {
        "Twilio"
    }

    async fn send(&self, message: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&self.form(message))
            .send()
            .await
            .context("Failed to reach Twilio")?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            bail!("Twilio returned {status}: {body}");
        }
        match serde_json::from_str::<MessageResource>(&body) {
            Ok(resource) => debug!("Twilio message {} is {}", resource.sid, resource.status),
            Err(_) => debug!("Twilio response: {body}"),
        }
        Ok(())
    }
}

use std::fmt::Debug;

use anyhow::{bail, Context};
use log::debug;
use serde::Serialize;

use super::Transport;

const PUSHES_URL: &str = "https://api.pushbullet.com/v2/pushes";

/// Broadcasts a note to every device (or a channel) of a Pushbullet account.
pub struct Pushbullet {
    client: reqwest::Client,
    access_token: String,
    channel_tag: Option<String>,
}
impl Debug for Pushbullet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pushbullet")
            .field("channel_tag", &self.channel_tag)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct Push<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'static str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_tag: Option<&'a str>,
}

impl Pushbullet {
    pub fn new(client: reqwest::Client, access_token: String, channel_tag: Option<String>) -> Self {
        Self {
            client,
            access_token,
            channel_tag,
        }
    }

    fn push<'a>(&'a self, message: &'a str) -> Push<'a> {
        Push {
            kind: "note",
            title: "WisePay",
            body: message,
            channel_tag: self.channel_tag.as_deref(),
        }
    }
}

impl Transport for Pushbullet {
    fn name(&self) -> &str {
        "Pushbullet"
    }

    async fn send(&self, message: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(PUSHES_URL)
            .header("Access-Token", &self.access_token)
            .json(&self.push(message))
            .send()
            .await
            .context("Failed to reach Pushbullet")?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            bail!("Pushbullet returned {status}: {body}");
        }
        debug!("Pushbullet response: {body}");
        Ok(())
    }
}

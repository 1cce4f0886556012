use anyhow::Context;
use log::debug;
use reqwest::{StatusCode, Url};
use serde::Serialize;

use crate::credentials::{Credentials, Login, MerchantId, Password};

pub const LOGIN_URL: &str = "https://www.wisepay.co.uk/store/parent/process.asp";

/// A response body together with where it actually came from.
#[derive(Clone, Debug)]
pub struct Page {
    /// Final URL after redirects; relative links on the page resolve against it.
    pub url: Url,
    pub status: StatusCode,
    pub body: String,
}

/// Something pages of the portal can be requested from.
///
/// The first request of a session carries the login form; subsequent ones
/// are plain fetches that rely on the session cookies.
#[allow(async_fn_in_trait)]
pub trait Portal {
    async fn request(&mut self, url: &Url, form: Option<&LoginForm<'_>>) -> anyhow::Result<Page>;
}

pub struct WisepayClient {
    client: reqwest::Client,
}

impl WisepayClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .connection_verbose(true)
            .build()?;
        Ok(Self { client })
    }
}

impl Portal for WisepayClient {
    async fn request(&mut self, url: &Url, form: Option<&LoginForm<'_>>) -> anyhow::Result<Page> {
        let request = match form {
            Some(form) => {
                debug!("Logging in at {url}");
                self.client.post(url.clone()).form(form)
            }
            None => {
                debug!("Fetching {url}");
                self.client.get(url.clone())
            }
        };
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to request {url}"))?;
        let url = response.url().clone();
        let status = response.status();
        let body = response.text().await?;
        debug!("{status} from {url} ({} bytes)", body.len());
        Ok(Page { url, status, body })
    }
}

#[derive(Debug, Serialize)]
pub struct LoginForm<'a> {
    #[serde(rename = "ACT")]
    act: &'static str,
    #[serde(rename = "mID")]
    merchant_id: &'a MerchantId,
    #[serde(rename = "acc_user_email")]
    login: &'a Login,
    #[serde(rename = "acc_password")]
    password: &'a Password,
}
impl<'a> LoginForm<'a> {
    pub fn new(credentials: &'a Credentials) -> Self {
        Self {
            act: "login",
            merchant_id: &credentials.merchant_id,
            login: &credentials.login,
            password: &credentials.password,
        }
    }
}

use std::{ffi::OsString, path::PathBuf};

use clap::Parser;
use log::error;
use rust_decimal::Decimal;
use url::Url;

use crate::{
    api::LOGIN_URL,
    credentials::{Credentials, CredentialsError},
    notify::{pushbullet::Pushbullet, twilio::Twilio, ConfiguredTransport, Gate},
    traverse,
};

/// Exit status for anything wrong with the command line or environment.
pub const EXIT_CONFIG: u8 = 4;

#[derive(Debug, Parser)]
#[command(about = "Notifies you when a WisePay balance runs low")]
pub struct Opts {
    #[arg(long, env = "WISEPAY_MID")]
    pub merchant_id: String,
    #[arg(long, env = "WISEPAY_USER")]
    pub login: String,
    #[arg(long, env = "WISEPAY_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Only notify about balances below this amount.
    #[arg(long, env = "WISEPAY_THRESHOLD")]
    pub threshold: Option<Decimal>,
    /// Children never to notify about, case-insensitive.
    #[arg(long, env = "WISEPAY_IGNORE", value_delimiter = ',')]
    pub ignore: Vec<String>,
    #[arg(long, env = "WISEPAY_LOGIN_URL", default_value = LOGIN_URL)]
    pub login_url: Url,

    #[arg(long, env = "PUSHBULLET_TOKEN", hide_env_values = true)]
    pub pushbullet_token: Option<String>,
    #[arg(long, env = "PUSHBULLET_CHANNEL")]
    pub pushbullet_channel: Option<String>,

    #[arg(long, env = "TWILIO_ACCOUNT_SID")]
    pub twilio_account_sid: Option<String>,
    #[arg(long, env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
    pub twilio_auth_token: Option<String>,
    #[arg(long, env = "TWILIO_FROM", default_value = crate::notify::twilio::DEFAULT_FROM)]
    pub twilio_from: String,
    #[arg(long, env = "PHONE_NUMBER")]
    pub phone_number: Option<String>,

    /// Save every fetched page into this directory.
    #[arg(long, env = "WISEPAY_DUMP_HTML")]
    pub dump_html_dir: Option<PathBuf>,
    /// Log the messages instead of sending them.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error("Twilio needs all of TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and PHONE_NUMBER; missing {0}")]
    IncompleteTwilio(&'static str),
    #[error("No notification transport is configured (set PUSHBULLET_TOKEN or the TWILIO_* variables, or pass --dry-run)")]
    NoTransport,
}

/// Everything a run needs, fixed before the first request.
pub struct Config {
    pub traversal: traverse::Config,
    pub transports: Vec<ConfiguredTransport>,
}

impl Opts {
    /// Parses the command line, printing clap's message on failure.  `--help`
    /// yields `Err(0)`; every other failure yields `Err(EXIT_CONFIG)`.
    pub fn parse_or_exit_code<I, T>(args: I) -> Result<Self, u8>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| {
            if let Err(print) = e.print() {
                error!("Failed to print usage: {print}");
            }
            if e.use_stderr() {
                EXIT_CONFIG
            } else {
                0
            }
        })
    }

    pub fn into_config(self, client: &reqwest::Client) -> Result<Config, ConfigError> {
        let credentials = Credentials::builder()
            .merchant_id(self.merchant_id.into())
            .login(self.login.into())
            .password(self.password.into())
            .build()
            .validate()?;

        let mut transports = vec![];
        if let Some(token) = self.pushbullet_token.filter(|t| !t.trim().is_empty()) {
            transports.push(ConfiguredTransport::Pushbullet(Pushbullet::new(
                client.clone(),
                token,
                self.pushbullet_channel,
            )));
        }
        match (
            self.twilio_account_sid,
            self.twilio_auth_token,
            self.phone_number,
        ) {
            (None, None, None) => {}
            (Some(sid), Some(token), Some(phone_number)) => {
                transports.push(ConfiguredTransport::Twilio(Twilio::new(
                    client.clone(),
                    sid,
                    token,
                    self.twilio_from,
                    &phone_number,
                )));
            }
            (None, _, _) => return Err(ConfigError::IncompleteTwilio("TWILIO_ACCOUNT_SID")),
            (_, None, _) => return Err(ConfigError::IncompleteTwilio("TWILIO_AUTH_TOKEN")),
            (_, _, None) => return Err(ConfigError::IncompleteTwilio("PHONE_NUMBER")),
        }
        if self.dry_run {
            transports.clear();
        } else if transports.is_empty() {
            return Err(ConfigError::NoTransport);
        }

        let ignore = self
            .ignore
            .into_iter()
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .collect();
        Ok(Config {
            traversal: traverse::Config {
                login_url: self.login_url,
                credentials,
                gate: Gate::new(self.threshold, ignore),
                dump_html_dir: self.dump_html_dir,
            },
            transports,
        })
    }
}

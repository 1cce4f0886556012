use derive_more::{AsRef, Display, From};
use getset::{CopyGetters, Getters};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Name of the child (account holder) a balance belongs to.
#[derive(Clone, PartialEq, Eq, Debug, From, AsRef, Display, Serialize, Deserialize)]
#[as_ref(forward)]
pub struct ChildName(String);
impl ChildName {
    /// Shown when neither the heading nor the accounts panel names the child.
    pub fn unknown() -> Self {
        Self("?".to_owned())
    }

    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.to_lowercase() == other.trim().to_lowercase()
    }
}

/// One entry of the accounts panel, as captured from the markup.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct AccountRecord {
    pub text: String,
    pub url: Option<String>,
}

/// An account entry after its markers have been interpreted.
#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters)]
pub struct Account {
    #[getset(get = "pub")]
    pub(crate) name: String,
    #[getset(get = "pub")]
    pub(crate) url: Option<String>,
    #[getset(get_copy = "pub")]
    pub(crate) is_active: bool,
    #[getset(get_copy = "pub")]
    pub(crate) is_switch_target: bool,
}

#[derive(Clone, Default, PartialEq, Eq, Debug, Getters, CopyGetters)]
pub struct AccountList {
    #[getset(get = "pub")]
    pub(crate) accounts: Vec<Account>,
    #[getset(get_copy = "pub")]
    pub(crate) active: Option<usize>,
    #[getset(get_copy = "pub")]
    pub(crate) next: Option<usize>,
}
impl AccountList {
    pub fn active_account(&self) -> Option<&Account> {
        self.accounts.get(self.active?)
    }

    pub fn next_account(&self) -> Option<&Account> {
        self.accounts.get(self.next?)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters, Serialize)]
pub struct BalanceRecord {
    #[getset(get_copy = "pub")]
    pub(crate) balance: Decimal,
    #[getset(get = "pub")]
    pub(crate) date: String,
    #[getset(get = "pub")]
    pub(crate) time: String,
    #[getset(get = "pub")]
    pub(crate) child_name: ChildName,
    #[getset(get = "pub")]
    pub(crate) next_url: Option<String>,
}

/// Outcome of reading one balance page.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ParseResult {
    Success(BalanceRecord),
    /// The page did not yield a balance.  `next_url` is still reported
    /// so that sibling accounts are not skipped.
    Error {
        message: String,
        next_url: Option<String>,
    },
}
impl ParseResult {
    pub fn next_url(&self) -> Option<&str> {
        match self {
            ParseResult::Success(record) => record.next_url.as_deref(),
            ParseResult::Error { next_url, .. } => next_url.as_deref(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success(_))
    }
}

/// Worst outcome observed during a run, in increasing order of badness.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Debug, Display)]
pub enum Severity {
    #[default]
    #[display("OK")]
    Ok,
    #[display("parser error")]
    ParserError,
    #[display("HTTP error")]
    HttpError,
}
impl Severity {
    pub fn escalate(&mut self, other: Severity) {
        *self = (*self).max(other);
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Severity::Ok => 0,
            Severity::ParserError => 1,
            Severity::HttpError => 2,
        }
    }
}

use std::str::FromStr;

use itertools::Itertools;
use log::debug;
use rust_decimal::Decimal;

use super::scanner::ScanState;
use crate::schema::{Account, AccountList, AccountRecord, BalanceRecord, ChildName, ParseResult};

const SWITCH_PREFIX: &str = "Switch to ";
const ACTIVE_SUFFIX: &str = " (active)";
const DATE_CELL: usize = 1;
const TIME_CELL: usize = 2;
const BALANCE_CELL: usize = 3;

pub fn extract(state: &ScanState) -> ParseResult {
    let accounts = accounts(state.accounts());
    let next_url = accounts
        .next_account()
        .and_then(|account| account.url.clone());

    if let Some(message) = error_text(state.error_cells()) {
        debug!("The page reported an error: {message:?}");
        return ParseResult::Error { message, next_url };
    }

    let cells = state.balance_cells();
    if cells.len() <= BALANCE_CELL {
        return ParseResult::Error {
            message: format!("unexpected response, {} cells", cells.len()),
            next_url,
        };
    }
    let raw = &cells[BALANCE_CELL];
    let balance = match parse_balance(raw) {
        Ok(Some(balance)) => balance,
        Ok(None) => {
            return ParseResult::Error {
                message: "unknown error fetching balance".to_owned(),
                next_url,
            }
        }
        Err(e) => {
            return ParseResult::Error {
                message: e.to_string(),
                next_url,
            }
        }
    };

    let child_name = state
        .heading()
        .as_deref()
        .and_then(account_name_from_heading)
        .or_else(|| accounts.active_account().map(|a| a.name.clone()))
        .map_or_else(ChildName::unknown, ChildName::from);

    ParseResult::Success(BalanceRecord {
        balance,
        date: cells[DATE_CELL].trim().to_owned(),
        time: cells[TIME_CELL].trim().to_owned(),
        child_name,
        next_url,
    })
}

/// Interprets the accounts panel.  The last raw record is the trailer after
/// the final line break and is skipped.
///
/// Only a switch target that comes after the active account is picked as
/// the next one; targets listed before it have already been visited.
pub fn accounts(records: &[AccountRecord]) -> AccountList {
    let mut list = AccountList::default();
    let Some((_trailer, records)) = records.split_last() else {
        return list;
    };
    for (i, record) in records.iter().enumerate() {
        let text = record.text.trim_start().replace('\u{a0}', " ");
        let mut text = text.strip_prefix("> ").unwrap_or(&text).trim();

        let is_switch_target = match text.strip_prefix(SWITCH_PREFIX) {
            Some(rest) => {
                text = rest;
                if list.active.is_some() && list.next.is_none() {
                    list.next = Some(i);
                }
                true
            }
            None => false,
        };
        let is_active = match text.strip_suffix(ACTIVE_SUFFIX) {
            Some(rest) => {
                text = rest;
                list.active = Some(i);
                true
            }
            None => false,
        };

        list.accounts.push(Account {
            name: text.trim().to_owned(),
            url: record.url.clone(),
            is_active,
            is_switch_target,
        });
    }
    list
}

fn account_name_from_heading(heading: &str) -> Option<String> {
    let name = regex!(r"(?i)your account for\s+(.+?)\s*$")
        .captures(heading.trim())?
        .get(1)?
        .as_str()
        .replace('\u{a0}', " ");
    Some(name)
}

/// Joins the error cells, dropping blank lines.
fn error_text(cells: &[String]) -> Option<String> {
    let text = cells
        .iter()
        .join("\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .join("\n");
    (!text.is_empty()).then_some(text)
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unexpected balance format: {0}")]
pub struct BalanceFormatError(String);

/// Parses a money amount such as `£3.50`, `-£0.4`, ` - 12. ` or `£.5`.  The
/// decimal point is mandatory.
///
/// Returns `Ok(None)` when the text has the right shape but no digits at all.
pub fn parse_balance(raw: &str) -> Result<Option<Decimal>, BalanceFormatError> {
    let error = || BalanceFormatError(raw.to_owned());
    let captures = regex!(
        r"^\s*(?P<sign1>[+-])?\s*£?\s*(?P<sign2>[+-])?\s*(?P<int>[0-9]*)\.(?P<frac>[0-9]{0,2})\s*$"
    )
    .captures(raw)
    .ok_or_else(error)?;
    let sign = match (captures.name("sign1"), captures.name("sign2")) {
        (Some(_), Some(_)) => return Err(error()),
        (Some(sign), None) | (None, Some(sign)) => sign.as_str(),
        (None, None) => "",
    };
    let int = captures.name("int").map_or("", |m| m.as_str());
    let frac = captures.name("frac").map_or("", |m| m.as_str());
    if int.is_empty() && frac.is_empty() {
        return Ok(None);
    }
    let int = if int.is_empty() { "0" } else { int };
    let text = if frac.is_empty() {
        format!("{sign}{int}")
    } else {
        format!("{sign}{int}.{frac}")
    };
    Decimal::from_str(&text).map(Some).map_err(|_| error())
}

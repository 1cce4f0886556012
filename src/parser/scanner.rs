use getset::Getters;
use log::trace;
use scraper::{node::Element, Html};

use super::events::{events, Event};
use crate::schema::AccountRecord;

/// Class of the `<div>`s holding the home page's date, time and balance.
pub const BALANCE_PANEL_CLASS: &str = "cashless-home-balance-sml";
/// Class of the `<td>`s the portal shows its error messages in.
pub const ERROR_CELL_CLASS: &str = "error";
/// Id of the element listing every account linked to the login.
pub const ACCOUNTS_PANEL_ID: &str = "switch-account";

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Raw captures of a single pass over a document.
///
/// Captures are kept in document order and never deduplicated; the
/// extractor addresses balance cells by position.
#[derive(Default, Debug, Getters)]
pub struct ScanState {
    in_balance: bool,
    in_error: bool,
    /// Tag name of the accounts panel while inside it.
    in_accounts: Option<String>,
    /// Tag name of the heading while inside one (only tracked in the accounts panel).
    in_heading: Option<String>,

    #[getset(get = "pub")]
    balance_cells: Vec<String>,
    #[getset(get = "pub")]
    error_cells: Vec<String>,
    /// The last record is whatever follows the final line break and is not an account.
    #[getset(get = "pub")]
    accounts: Vec<AccountRecord>,
    #[getset(get = "pub")]
    heading: Option<String>,
}

pub fn scan(html: &Html) -> ScanState {
    let mut state = ScanState::default();
    for event in events(html) {
        state.feed(event);
    }
    trace!("Scan result: {state:?}");
    state
}

impl ScanState {
    pub fn feed(&mut self, event: Event) {
        match event {
            Event::Open(element) => self.open(element),
            Event::Close(name) => self.close(name),
            Event::Text(text) => self.text(text),
        }
    }

    fn open(&mut self, element: &Element) {
        let name = element.name();
        if name == "div" && has_class(element, BALANCE_PANEL_CLASS) {
            self.balance_cells.push(String::new());
            self.in_balance = true;
        }
        if name == "td" && has_class(element, ERROR_CELL_CLASS) {
            self.error_cells.push(String::new());
            self.in_error = true;
        }
        if self.in_accounts.is_none() && element.id() == Some(ACCOUNTS_PANEL_ID) {
            self.in_accounts = Some(name.to_owned());
            self.accounts.push(AccountRecord::default());
            return;
        }
        if self.in_accounts.is_some() {
            match name {
                "a" => {
                    if let (Some(href), Some(record)) =
                        (element.attr("href"), self.accounts.last_mut())
                    {
                        record.url = Some(href.to_owned());
                    }
                }
                "br" => self.accounts.push(AccountRecord::default()),
                _ if HEADINGS.contains(&name) => {
                    self.heading = Some(String::new());
                    self.in_heading = Some(name.to_owned());
                }
                _ => {}
            }
        }
    }

    fn close(&mut self, name: &str) {
        if self.in_balance && name == "div" {
            self.in_balance = false;
        }
        if self.in_error && name == "td" {
            self.in_error = false;
        }
        if self.in_heading.as_deref() == Some(name) {
            self.in_heading = None;
        }
        if self.in_accounts.as_deref() == Some(name) {
            self.in_accounts = None;
            self.in_heading = None;
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_balance {
            if let Some(cell) = self.balance_cells.last_mut() {
                cell.push_str(text);
            }
        }
        if self.in_error {
            if let Some(cell) = self.error_cells.last_mut() {
                cell.push_str(text);
            }
        }
        if self.in_accounts.is_some() {
            let target = if self.in_heading.is_some() {
                self.heading.as_mut()
            } else {
                self.accounts.last_mut().map(|record| &mut record.text)
            };
            if let Some(target) = target {
                target.push_str(text);
            }
        }
    }
}

fn has_class(element: &Element, class: &str) -> bool {
    element.classes().any(|c| c == class)
}

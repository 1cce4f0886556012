use std::path::PathBuf;

use clap::Parser;
use scraper::Html;
use wisepay_notifier::{
    notify::Notification,
    parser::{
        extract::{accounts, extract},
        scanner::scan,
    },
    schema::ParseResult,
};

/// Reads a saved balance page and shows what would be reported for it.
#[derive(Parser)]
struct Opts {
    html_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let html = Html::parse_document(&fs_err::read_to_string(&opts.html_path)?);
    let state = scan(&html);

    let accounts = accounts(state.accounts());
    for (i, account) in accounts.accounts().iter().enumerate() {
        println!(
            "{}{} {:?} -> {:?}",
            if accounts.active() == Some(i) { "*" } else { " " },
            if accounts.next() == Some(i) { ">" } else { " " },
            account.name(),
            account.url(),
        );
    }

    match extract(&state) {
        ParseResult::Success(record) => {
            println!("{}", Notification::balance(&record).text());
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        ParseResult::Error { message, next_url } => {
            println!("{}", Notification::error(&message).text());
            println!("next: {next_url:?}");
        }
    }
    Ok(())
}

use std::path::PathBuf;

use anyhow::Context;
use log::{info, warn};
use url::Url;

use crate::{
    api::{LoginForm, Page, Portal},
    credentials::Credentials,
    notify::{Dispatcher, Gate, Notification, Transport},
    parser::parse_document,
    schema::{ParseResult, Severity},
};

pub struct Config {
    pub login_url: Url,
    pub credentials: Credentials,
    pub gate: Gate,
    /// Every fetched page is written here as `page-<n>.html` when set.
    pub dump_html_dir: Option<PathBuf>,
}

/// Logs in, then follows the "switch to" links from account to account
/// until a page offers no further account.
///
/// A page that cannot be read is reported and the walk goes on; a
/// non-success HTTP status is reported and ends the walk.  Returns the worst
/// severity seen.  `Err` is reserved for failures to talk to the portal at all.
pub async fn traverse<P: Portal, T: Transport>(
    portal: &mut P,
    config: &Config,
    dispatcher: &Dispatcher<T>,
) -> anyhow::Result<Severity> {
    let login_form = LoginForm::new(&config.credentials);
    let mut url = config.login_url.clone();
    let mut form = Some(&login_form);
    let mut severity = Severity::Ok;

    for count in 1.. {
        let page = portal.request(&url, form).await?;
        if let Some(dir) = &config.dump_html_dir {
            dump(dir, count, &page);
        }

        if !page.status.is_success() {
            severity.escalate(Severity::HttpError);
            let detail = format!("server returned {}: {}", page.status, page.body.trim());
            warn!("{detail}");
            dispatcher.dispatch(&Notification::error(detail)).await;
            break;
        }

        let result = parse_document(&page.body);
        match &result {
            ParseResult::Success(record) => {
                let notification = Notification::balance(record);
                info!("{}", notification.text());
                match config.gate.check(&notification) {
                    Ok(()) => {
                        dispatcher.dispatch(&notification).await;
                    }
                    Err(reason) => info!("Skipping notification as {reason}"),
                }
            }
            ParseResult::Error { message, .. } => {
                severity.escalate(Severity::ParserError);
                let notification = Notification::error(message);
                warn!("{}", notification.text());
                dispatcher.dispatch(&notification).await;
            }
        }

        let Some(next) = result.next_url() else {
            break;
        };
        url = page
            .url
            .join(next)
            .with_context(|| format!("Invalid account link: {next:?}"))?;
        form = None;
        info!("Switching to the next account: {url}");
    }

    Ok(severity)
}

fn dump(dir: &std::path::Path, count: usize, page: &Page) {
    let path = dir.join(format!("page-{count}.html"));
    if let Err(e) = fs_err::create_dir_all(dir).and_then(|()| fs_err::write(&path, &page.body)) {
        warn!("Failed to save {}: {e}", page.url);
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, str::FromStr};

    use reqwest::StatusCode;
    use rust_decimal::Decimal;
    use url::Url;

    use super::{traverse, Config};
    use crate::{
        api::{LoginForm, Page, Portal},
        credentials::Credentials,
        notify::{tests::Recorder, Dispatcher, Gate},
        schema::Severity,
    };

    const LOGIN: &str = "https://portal.test/store/parent/process.asp";

    /// Serves canned pages and records what was requested.
    #[derive(Default)]
    struct FakePortal {
        pages: HashMap<String, (StatusCode, String)>,
        requests: Vec<(String, bool)>,
    }
    impl FakePortal {
        fn page(mut self, url: &str, status: StatusCode, body: String) -> Self {
            self.pages.insert(url.to_owned(), (status, body));
            self
        }
    }
    impl Portal for FakePortal {
        async fn request(
            &mut self,
            url: &Url,
            form: Option<&LoginForm<'_>>,
        ) -> anyhow::Result<Page> {
            self.requests.push((url.to_string(), form.is_some()));
            let (status, body) = self
                .pages
                .get(url.as_str())
                .cloned()
                .unwrap_or((StatusCode::NOT_FOUND, "not found".to_owned()));
            Ok(Page {
                url: url.clone(),
                status,
                body,
            })
        }
    }

    fn account_page(balance: &str, accounts: &[(&str, Option<&str>)]) -> String {
        let cells = ["", "12 Mar", "08:15", balance]
            .iter()
            .map(|cell| format!(r#"<div class="cashless-home-balance-sml">{cell}</div>"#))
            .collect::<String>();
        let accounts = accounts
            .iter()
            .map(|(text, href)| match href {
                Some(href) => format!(r#"<a href="{href}">{text}</a><br>"#),
                None => format!("{text}<br>"),
            })
            .collect::<String>();
        format!(r#"<html><body>{cells}<div id="switch-account">{accounts}</div></body></html>"#)
    }

    fn config(threshold: Option<&str>) -> Config {
        Config {
            login_url: Url::parse(LOGIN).unwrap(),
            credentials: Credentials::builder()
                .merchant_id("1234".to_owned().into())
                .login("parent@example.com".to_owned().into())
                .password("secret".to_owned().into())
                .build(),
            gate: Gate::new(threshold.map(|t| Decimal::from_str(t).unwrap()), vec![]),
            dump_html_dir: None,
        }
    }

    fn three_accounts(second_balance: &str) -> FakePortal {
        FakePortal::default()
            .page(
                LOGIN,
                StatusCode::OK,
                account_page(
                    "£1.00",
                    &[
                        ("A (active)", None),
                        ("Switch to B", Some("switch.asp?child=2")),
                        ("Switch to C", Some("switch.asp?child=3")),
                    ],
                ),
            )
            .page(
                "https://portal.test/store/parent/switch.asp?child=2",
                StatusCode::OK,
                account_page(
                    second_balance,
                    &[
                        ("Switch to A", Some("switch.asp?child=1")),
                        ("B (active)", None),
                        ("Switch to C", Some("switch.asp?child=3")),
                    ],
                ),
            )
            .page(
                "https://portal.test/store/parent/switch.asp?child=3",
                StatusCode::OK,
                account_page(
                    "£3.00",
                    &[
                        ("Switch to A", Some("switch.asp?child=1")),
                        ("Switch to B", Some("switch.asp?child=2")),
                        ("C (active)", None),
                    ],
                ),
            )
    }

    #[tokio::test]
    async fn test_visits_every_account_once() {
        let mut portal = three_accounts("£2.00");
        let dispatcher = Dispatcher::new(vec![Recorder::named("recorder")]);
        let severity = traverse(&mut portal, &config(None), &dispatcher)
            .await
            .unwrap();
        assert_eq!(severity, Severity::Ok);
        assert_eq!(
            portal.requests,
            [
                (LOGIN.to_owned(), true),
                (
                    "https://portal.test/store/parent/switch.asp?child=2".to_owned(),
                    false
                ),
                (
                    "https://portal.test/store/parent/switch.asp?child=3".to_owned(),
                    false
                ),
            ]
        );
        assert_eq!(
            dispatcher.transports()[0].sent(),
            [
                "WisePay balance for A: £1.00 on 12 Mar at 08:15",
                "WisePay balance for B: £2.00 on 12 Mar at 08:15",
                "WisePay balance for C: £3.00 on 12 Mar at 08:15",
            ]
        );
    }

    #[tokio::test]
    async fn test_parse_error_does_not_stop_the_walk() {
        let mut portal = three_accounts("unknown");
        let dispatcher = Dispatcher::new(vec![Recorder::named("recorder")]);
        let severity = traverse(&mut portal, &config(Some("2.50")), &dispatcher)
            .await
            .unwrap();
        assert_eq!(severity, Severity::ParserError);
        assert_eq!(portal.requests.len(), 3);
        assert_eq!(
            dispatcher.transports()[0].sent(),
            [
                "WisePay balance for A: £1.00 on 12 Mar at 08:15",
                "WisePay error: unexpected balance format: unknown",
            ]
        );
    }

    #[tokio::test]
    async fn test_http_error_ends_the_walk() {
        let mut portal = three_accounts("£2.00").page(
            "https://portal.test/store/parent/switch.asp?child=2",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error".to_owned(),
        );
        let dispatcher = Dispatcher::new(vec![Recorder::named("recorder")]);
        let severity = traverse(&mut portal, &config(Some("0.50")), &dispatcher)
            .await
            .unwrap();
        assert_eq!(severity, Severity::HttpError);
        assert_eq!(portal.requests.len(), 2);
        assert_eq!(
            dispatcher.transports()[0].sent(),
            ["WisePay error: server returned 500 Internal Server Error: Internal error"]
        );
    }

    #[tokio::test]
    async fn test_dumps_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            dump_html_dir: Some(dir.path().join("pages")),
            ..config(None)
        };
        let mut portal = three_accounts("£2.00");
        let dispatcher = Dispatcher::new(vec![Recorder::named("recorder")]);
        traverse(&mut portal, &config, &dispatcher).await.unwrap();
        for (n, balance) in [(1, "£1.00"), (2, "£2.00"), (3, "£3.00")] {
            let body = fs_err::read_to_string(dir.path().join(format!("pages/page-{n}.html")))
                .unwrap();
            assert!(body.contains(balance), "page-{n}.html: {body}");
        }
        assert!(!dir.path().join("pages/page-4.html").exists());
    }

    #[tokio::test]
    async fn test_ignored_child_is_visited_but_not_reported() {
        let config = Config {
            gate: Gate::new(None, vec!["b".to_owned()]),
            ..config(None)
        };
        let mut portal = three_accounts("£2.00");
        let dispatcher = Dispatcher::new(vec![Recorder::named("recorder")]);
        let severity = traverse(&mut portal, &config, &dispatcher)
            .await
            .unwrap();
        assert_eq!(severity, Severity::Ok);
        assert_eq!(portal.requests.len(), 3);
        assert_eq!(
            dispatcher.transports()[0].sent(),
            [
                "WisePay balance for A: £1.00 on 12 Mar at 08:15",
                "WisePay balance for C: £3.00 on 12 Mar at 08:15",
            ]
        );
    }

    #[tokio::test]
    async fn test_single_account() {
        let mut portal = FakePortal::default().page(
            LOGIN,
            StatusCode::OK,
            account_page("£9.99", &[]).replace(r#"<div id="switch-account"></div>"#, ""),
        );
        let dispatcher = Dispatcher::new(vec![Recorder::named("recorder")]);
        let severity = traverse(&mut portal, &config(None), &dispatcher)
            .await
            .unwrap();
        assert_eq!(severity, Severity::Ok);
        assert_eq!(portal.requests.len(), 1);
        assert_eq!(
            dispatcher.transports()[0].sent(),
            ["WisePay balance for ?: £9.99 on 12 Mar at 08:15"]
        );
    }
}

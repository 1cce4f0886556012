use std::process::ExitCode;

use log::{error, info};
use wisepay_notifier::{
    api::WisepayClient,
    config::{Opts, EXIT_CONFIG},
    notify::{Dispatcher, Notification, Transport},
    schema::Severity,
    traverse::{self, traverse},
};

const EXIT_UNEXPECTED: u8 = 3;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();

    let opts = match Opts::parse_or_exit_code(std::env::args_os()) {
        Ok(opts) => opts,
        Err(code) => return ExitCode::from(code),
    };
    let dry_run = opts.dry_run;
    let config = match opts.into_config(&reqwest::Client::new()) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    if dry_run {
        info!("Dry run: nothing will be sent.");
    }
    let dispatcher = Dispatcher::new(config.transports);

    match run(&config.traversal, &dispatcher).await {
        Ok(severity) => {
            info!("Finished: {severity}");
            ExitCode::from(severity.exit_code())
        }
        Err(e) => {
            error!("{e:#}");
            dispatcher
                .dispatch(&Notification::error(format!("{e:#}")))
                .await;
            ExitCode::from(EXIT_UNEXPECTED)
        }
    }
}

async fn run<T: Transport>(
    config: &traverse::Config,
    dispatcher: &Dispatcher<T>,
) -> anyhow::Result<Severity> {
    let mut client = WisepayClient::new()?;
    traverse(&mut client, config, dispatcher).await
}

pub mod pushbullet;
pub mod twilio;

use std::fmt::Display;

use getset::Getters;
use log::{error, info};
use rust_decimal::Decimal;

use crate::schema::{BalanceRecord, ChildName};

use self::{pushbullet::Pushbullet, twilio::Twilio};

/// A finished message, together with what the gate needs to judge it.
#[derive(Clone, PartialEq, Eq, Debug, Getters)]
pub struct Notification {
    #[getset(get = "pub")]
    text: String,
    balance: Option<Decimal>,
    #[getset(get = "pub")]
    child_name: Option<ChildName>,
}
impl Notification {
    pub fn balance(record: &BalanceRecord) -> Self {
        Self {
            text: format!(
                "WisePay balance for {}: £{:.2} on {} at {}",
                record.child_name(),
                record.balance(),
                record.date(),
                record.time()
            ),
            balance: Some(record.balance()),
            child_name: Some(record.child_name().clone()),
        }
    }

    pub fn error(detail: impl Display) -> Self {
        Self {
            text: format!("WisePay error: {detail}"),
            balance: None,
            child_name: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Gate {
    threshold: Option<Decimal>,
    ignored_children: Vec<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, derive_more::Display)]
pub enum Suppressed {
    #[display("balance is not under threshold ({_0:.2})")]
    NotUnderThreshold(Decimal),
    #[display("{_0} is in the ignore list")]
    IgnoredChild(ChildName),
}

impl Gate {
    pub fn new(threshold: Option<Decimal>, ignored_children: Vec<String>) -> Self {
        Self {
            threshold,
            ignored_children,
        }
    }

    /// Errors always pass.  A balance passes only when it is strictly
    /// below the threshold and the child is not ignored.
    pub fn check(&self, notification: &Notification) -> Result<(), Suppressed> {
        if let (Some(threshold), Some(balance)) = (self.threshold, notification.balance) {
            if balance >= threshold {
                return Err(Suppressed::NotUnderThreshold(threshold));
            }
        }
        if let Some(child_name) = &notification.child_name {
            if self
                .ignored_children
                .iter()
                .any(|ignored| child_name.eq_ignore_case(ignored))
            {
                return Err(Suppressed::IgnoredChild(child_name.clone()));
            }
        }
        Ok(())
    }
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    fn name(&self) -> &str;
    async fn send(&self, message: &str) -> anyhow::Result<()>;
}

/// The transports that can be switched on from the command line.
#[derive(Debug)]
pub enum ConfiguredTransport {
    Pushbullet(Pushbullet),
    Twilio(Twilio),
}
impl Transport for ConfiguredTransport {
    fn name(&self) -> &str {
        match self {
            ConfiguredTransport::Pushbullet(t) => t.name(),
            ConfiguredTransport::Twilio(t) => t.name(),
        }
    }

    async fn send(&self, message: &str) -> anyhow::Result<()> {
        match self {
            ConfiguredTransport::Pushbullet(t) => t.send(message).await,
            ConfiguredTransport::Twilio(t) => t.send(message).await,
        }
    }
}

pub struct Outcome {
    pub transport: String,
    pub result: anyhow::Result<()>,
}

pub struct Dispatcher<T = ConfiguredTransport> {
    transports: Vec<T>,
}
impl<T: Transport> Dispatcher<T> {
    pub fn new(transports: Vec<T>) -> Self {
        Self { transports }
    }

    pub fn transports(&self) -> &[T] {
        &self.transports
    }

    /// Sends to every transport in order; a failing transport does not
    /// prevent the remaining ones from being tried.
    pub async fn dispatch(&self, notification: &Notification) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(self.transports.len());
        for transport in &self.transports {
            let result = transport.send(notification.text()).await;
            match &result {
                Ok(()) => info!("Sent via {}.", transport.name()),
                Err(e) => error!("Failed to send via {}: {e:#}", transport.name()),
            }
            outcomes.push(Outcome {
                transport: transport.name().to_owned(),
                result,
            });
        }
        outcomes
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{str::FromStr, sync::Mutex};

    use anyhow::bail;
    use rust_decimal::Decimal;

    use super::{Dispatcher, Gate, Notification, Suppressed, Transport};
    use crate::schema::{BalanceRecord, ChildName};

    /// Remembers what it was asked to send.
    #[derive(Default)]
    pub struct Recorder {
        pub name: String,
        pub fail: bool,
        pub sent: Mutex<Vec<String>>,
    }
    impl Recorder {
        pub fn named(name: &str) -> Self {
            Self {
                name: name.to_owned(),
                ..Default::default()
            }
        }

        pub fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }
    impl Transport for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        async fn send(&self, message: &str) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(message.to_owned());
            if self.fail {
                bail!("{} is down", self.name);
            }
            Ok(())
        }
    }

    fn record(balance: &str, child: &str) -> BalanceRecord {
        BalanceRecord {
            balance: Decimal::from_str(balance).unwrap(),
            date: "12 Mar".to_owned(),
            time: "08:15".to_owned(),
            child_name: child.to_owned().into(),
            next_url: None,
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Notification::balance(&record("3.5", "Alice")).text(),
            "WisePay balance for Alice: £3.50 on 12 Mar at 08:15"
        );
        assert_eq!(
            Notification::error("Session expired").text(),
            "WisePay error: Session expired"
        );
    }

    #[test]
    fn test_threshold_gate() {
        let gate = Gate::new(Some(Decimal::from_str("5.00").unwrap()), vec![]);
        assert_eq!(
            gate.check(&Notification::balance(&record("5.00", "Alice"))),
            Err(Suppressed::NotUnderThreshold(
                Decimal::from_str("5.00").unwrap()
            ))
        );
        assert_eq!(
            gate.check(&Notification::balance(&record("7", "Alice"))),
            Err(Suppressed::NotUnderThreshold(
                Decimal::from_str("5.00").unwrap()
            ))
        );
        assert_eq!(
            gate.check(&Notification::balance(&record("4.99", "Alice"))),
            Ok(())
        );
        assert_eq!(gate.check(&Notification::error("oops")), Ok(()));
        assert_eq!(
            Gate::default().check(&Notification::balance(&record("100", "Alice"))),
            Ok(())
        );
    }

    #[test]
    fn test_ignore_list() {
        let gate = Gate::new(None, vec!["bob".to_owned()]);
        assert_eq!(
            gate.check(&Notification::balance(&record("1", "Bob"))),
            Err(Suppressed::IgnoredChild(ChildName::from("Bob".to_owned())))
        );
        assert_eq!(
            gate.check(&Notification::balance(&record("1", "Alice"))),
            Ok(())
        );
    }

    #[tokio::test]
    async fn test_dispatch_does_not_short_circuit() {
        let dispatcher = Dispatcher::new(vec![
            Recorder {
                fail: true,
                ..Recorder::named("first")
            },
            Recorder::named("second"),
        ]);
        let outcomes = dispatcher.dispatch(&Notification::error("x")).await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].transport, "first");
        assert!(outcomes[0].result.is_err());
        assert!(outcomes[1].result.is_ok());
        for transport in dispatcher.transports() {
            assert_eq!(transport.sent(), ["WisePay error: x"]);
        }
    }
}

use std::fmt;
use std::str::FromStr;

use tokio::task::JoinHandle;

use crate::address::BaseUrl;
use crate::console::ConsoleSink;
use crate::dispatcher::DoorClient;
use crate::error::RequestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ping,
    DoorStatus,
}

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::Ping, Operation::DoorStatus];

    pub fn path(self) -> &'static str {
        match self {
            Operation::Ping => "/v1.0/ping",
            Operation::DoorStatus => "/v1.0/door_status",
        }
    }

    /// Line logged to the console before the request goes out.
    pub fn intent(self) -> &'static str {
        match self {
            Operation::Ping => "ping",
            Operation::DoorStatus => "get door status",
        }
    }
}

impl AsRef<str> for Operation {
    fn as_ref(&self) -> &str {
        match self {
            Operation::Ping => "ping",
            Operation::DoorStatus => "door_status",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl FromStr for Operation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ping" => Ok(Operation::Ping),
            "door_status" | "door-status" | "status" => Ok(Operation::DoorStatus),
            _ => Err(anyhow::anyhow!("unknown operation {s:?}")),
        }
    }
}

/// The two historical versions of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Port 8080, both buttons, answers appended to the console.
    #[default]
    Current,
    /// Port 5000, ping only, the answer shown as an alert.
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Console,
    Alert,
}

impl Variant {
    pub fn port(self) -> u16 {
        match self {
            Variant::Current => 8080,
            Variant::Legacy => 5000,
        }
    }

    pub fn delivery(self) -> Delivery {
        match self {
            Variant::Current => Delivery::Console,
            Variant::Legacy => Delivery::Alert,
        }
    }

    pub fn binds(self, operation: Operation) -> bool {
        match self {
            Variant::Current => true,
            Variant::Legacy => operation == Operation::Ping,
        }
    }
}

/// Wires the triggers to their requests.
#[derive(Debug, Clone)]
pub struct Bindings<P, C, A> {
    client: DoorClient<P, C>,
    variant: Variant,
    alert: A,
}

impl<P, C, A> Bindings<P, C, A>
where
    P: BaseUrl,
    C: ConsoleSink + Clone + Send + 'static,
    A: ConsoleSink + Clone + Send + 'static,
{
    pub fn new(client: DoorClient<P, C>, variant: Variant, alert: A) -> Self {
        Self {
            client,
            variant,
            alert,
        }
    }

    pub fn client(&self) -> &DoorClient<P, C> {
        &self.client
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Fire-and-forget, like pressing the button. `None` when this variant
    /// has no button for `operation`.
    pub fn click(&self, operation: Operation) -> Option<JoinHandle<()>> {
        if !self.variant.binds(operation) {
            tracing::debug!(%operation, variant = ?self.variant, "no binding");
            return None;
        }
        self.log_intent(operation);
        let handle = match self.variant.delivery() {
            Delivery::Console => self.client.fire(operation.path()),
            Delivery::Alert => self.client.fire_to(operation.path(), self.alert.clone()),
        };
        Some(handle)
    }

    /// Awaited counterpart of [`click`](Self::click) that reports failures
    /// instead of dropping them.
    pub async fn invoke(&self, operation: Operation) -> anyhow::Result<()> {
        if !self.variant.binds(operation) {
            anyhow::bail!("{:?} client has no {} binding", self.variant, operation);
        }
        self.log_intent(operation);
        let body = self
            .client
            .get(operation.path())
            .await
            .map_err(|error: RequestError| anyhow::Error::new(error).context(operation))?;
        match self.variant.delivery() {
            Delivery::Console => self.client.console().log(&body),
            Delivery::Alert => self.alert.log(&body),
        }
        Ok(())
    }

    /// The legacy page had no console, only the alert.
    fn log_intent(&self, operation: Operation) {
        if self.variant.delivery() == Delivery::Console {
            self.client.console().log(operation.intent());
        }
    }
}

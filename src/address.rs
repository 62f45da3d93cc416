use std::sync::{Arc, PoisonError, RwLock};

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Something that yields the base URL requests are built on.
pub trait BaseUrl {
    fn base_url(&self) -> String;
}

impl<F> BaseUrl for F
where
    F: Fn() -> String,
{
    fn base_url(&self) -> String {
        self()
    }
}

/// The operator-editable host value. Clones share the same value, so an
/// edit is seen by the next request of every resolver holding a clone.
#[derive(Debug, Clone)]
pub struct HostField(Arc<RwLock<String>>);

impl HostField {
    pub fn new(initial: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(initial.into())))
    }

    pub fn get(&self) -> String {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, value: impl Into<String>) {
        let value = value.into();
        tracing::debug!(host = %value, "host field edited");
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

impl Default for HostField {
    fn default() -> Self {
        Self::new(DEFAULT_HOST)
    }
}

/// Joins the host field with a fixed scheme and port. The host is used
/// verbatim: nothing is trimmed, escaped or validated.
#[derive(Debug, Clone)]
pub struct AddressResolver {
    host: HostField,
    port: u16,
}

impl AddressResolver {
    pub fn new(host: HostField, port: u16) -> Self {
        Self { host, port }
    }

    pub fn resolve(&self) -> String {
        format!("http://{}:{}", self.host.get(), self.port)
    }

    pub fn host(&self) -> &HostField {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl BaseUrl for AddressResolver {
    fn base_url(&self) -> String {
        self.resolve()
    }
}

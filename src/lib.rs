pub mod address;
pub mod bindings;
pub mod console;
pub mod dispatcher;
mod error;
pub mod http;
mod socket;

pub use address::{AddressResolver, BaseUrl, HostField, DEFAULT_HOST};
pub use bindings::{Bindings, Delivery, Operation, Variant};
pub use console::{Alert, Console, ConsoleSink};
pub use dispatcher::{fetch, DoorClient};
pub use error::RequestError;
pub use socket::Socket;

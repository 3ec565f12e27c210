mod error;
mod message;
pub mod routing;
mod snapshot;
mod types;

pub use error::*;
pub use message::*;
pub use snapshot::*;
pub use types::*;

pub extern crate serde;
pub extern crate serde_json;

pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod server;
pub mod slack;

#[cfg(test)]
mod testing;

pub use error::{BroadcasterError, Result};

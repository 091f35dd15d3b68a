//! Fan-out of one message to many destinations

mod dispatcher;
mod types;

pub use dispatcher::{Dispatcher, MessageDecorator};
pub use types::{DispatchBatch, DispatchReport, DispatchRequest, DispatchResult, DispatchSummary};

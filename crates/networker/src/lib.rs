//! Outbound HTTP request pool for the chat client.
//!
//! Callers submit [`RequestParams`] to a [`NetworkerPool`]; a fixed set of
//! worker threads executes them in priority order and hands each finished
//! [`NetRequest`] to its completion handler on the worker thread.

pub mod completion;
pub mod config;
pub mod error;
mod immediate;
pub mod pool;
pub mod priority;
pub mod queue;
pub mod request;
pub mod transport;
pub mod worker;

pub use completion::{channel_handler, completion_channel, RequestOutcome, ResponseHandler};
pub use config::{load_config, NetConfig};
pub use error::{NetError, Result, TransportError};
pub use immediate::ImmediateClient;
pub use pool::NetworkerPool;
pub use request::{NetRequest, RequestBody, RequestKind, RequestParams};
pub use transport::{ReqwestTransport, Transport, TransportCall, TransportResponse};

/// The capability the rest of the client depends on. [`NetworkerPool`] is the
/// real implementation; [`ImmediateClient`] completes requests in place.
pub trait HttpClient: Send + Sync {
    fn init(&self) -> Result<()>;
    fn kill(&self) -> Result<()>;
    fn stop_all_requests(&self);
    fn prepare_quit(&self) -> Result<()>;
    /// Queue a request. `interactive` selects the latency-sensitive workers.
    fn perform_request(&self, interactive: bool, params: RequestParams) -> Result<()>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

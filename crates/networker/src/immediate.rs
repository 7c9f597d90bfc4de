use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::debug;

use crate::{
    completion::ResponseHandler,
    error::{NetError, Result},
    request::RequestParams,
    HttpClient,
};

/// Completes every request on the caller's thread with a canned response,
/// without touching the network.
pub struct ImmediateClient {
    status: i32,
    response: String,
    default_handler: Option<ResponseHandler>,
    running: AtomicBool,
    completed: AtomicUsize,
}

impl ImmediateClient {
    pub fn new(status: i32, response: impl Into<String>) -> Self {
        Self {
            status,
            response: response.into(),
            default_handler: None,
            running: AtomicBool::new(false),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn with_default_handler(mut self, handler: ResponseHandler) -> Self {
        self.default_handler = Some(handler);
        self
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl HttpClient for ImmediateClient {
    fn init(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(NetError::AlreadyInitialized);
        }
        Ok(())
    }

    fn kill(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop_all_requests(&self) {}

    fn prepare_quit(&self) -> Result<()> {
        Ok(())
    }

    fn perform_request(&self, interactive: bool, params: RequestParams) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(NetError::NotRunning);
        }
        let mut request = params.build()?;
        request.set_handler_if_missing(self.default_handler.as_ref());
        request.complete(self.status, self.response.clone());
        self.completed.fetch_add(1, Ordering::SeqCst);
        debug!(interactive, key = request.key().0, "immediate client: completed request");

        if let Some(handler) = request.handler() {
            handler(&request);
        }
        Ok(())
    }
}

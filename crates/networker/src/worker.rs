//! A single networker thread and its private request queue.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::Mutex;
use reqwest::StatusCode;
use shared::status;
use tracing::{debug, error, info};

use crate::{
    error::{NetError, Result, TransportError},
    queue::RequestQueue,
    request::{NetRequest, RequestBody, RequestKind},
    transport::{
        split_target, CallBody, Transport, TransportCall, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE,
        OCTET_CONTENT_TYPE,
    },
};

/// Read-only settings shared by every worker of a pool.
pub struct WorkerContext {
    pub transport: Arc<dyn Transport>,
    pub user_agent: String,
    pub default_host: Option<String>,
    pub idle_wait: Duration,
}

pub struct Worker {
    index: usize,
    queue: Arc<RequestQueue>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    pub fn spawn(index: usize, context: Arc<WorkerContext>) -> Result<Self> {
        let queue = Arc::new(RequestQueue::new());
        let thread_queue = Arc::clone(&queue);
        let handle = thread::Builder::new()
            .name(format!("networker-{index}"))
            .spawn(move || run(index, &thread_queue, &context))
            .map_err(|source| NetError::ThreadSpawn { index, source })?;

        Ok(Self {
            index,
            queue,
            thread: Mutex::new(Some(handle)),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Queue a request for this thread. Never blocks beyond the queue lock.
    pub fn enqueue(&self, request: NetRequest) {
        self.queue.push(request);
    }

    /// Abandon every request that has not started. Their handlers never run.
    pub fn stop_all(&self) -> usize {
        let abandoned = self.queue.clear();
        if abandoned > 0 {
            debug!(worker = self.index, abandoned, "networker: dropped pending requests");
        }
        abandoned
    }

    /// Abandon pending work and make shutdown the next thing this thread does.
    pub fn prepare_quit(&self) {
        let abandoned = self.queue.replace_all(NetRequest::quit());
        debug!(worker = self.index, abandoned, "networker: quit requested");
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_finished(&self) -> bool {
        self.thread
            .lock()
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the thread to exit. Returns immediately if already joined or
    /// when called from the worker thread itself.
    pub fn join(&self) {
        let handle = {
            let mut slot = self.thread.lock();
            let joining_self = slot
                .as_ref()
                .is_some_and(|handle| handle.thread().id() == thread::current().id());
            if joining_self {
                return;
            }
            slot.take()
        };
        let Some(handle) = handle else {
            return;
        };
        if handle.join().is_err() {
            error!(worker = self.index, "networker: thread panicked");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if !self.is_finished() {
            self.prepare_quit();
            self.join();
        }
    }
}

fn run(index: usize, queue: &RequestQueue, context: &WorkerContext) {
    info!(worker = index, "networker: thread started");
    loop {
        let Some(mut request) = queue.pop() else {
            queue.wait_for_work(context.idle_wait);
            continue;
        };

        if request.kind() == RequestKind::Quit {
            break;
        }

        execute(index, context, &mut request);
    }
    info!(worker = index, "networker: thread exiting");
}

/// Run one request to completion and hand it to its handler.
pub(crate) fn execute(index: usize, context: &WorkerContext, request: &mut NetRequest) {
    debug_assert!(
        request.kind().is_submittable(),
        "request kind {:?} reached execution",
        request.kind()
    );

    let (status, response) = match perform(context, request) {
        Ok(outcome) => outcome,
        Err(err) => (status::TRANSPORT_FAILURE, err.to_string()),
    };
    request.complete(status, response);
    let request: &NetRequest = request;

    debug!(
        worker = index,
        key = request.key().0,
        kind = request.kind().as_str(),
        status,
        "networker: request finished"
    );

    let Some(handler) = request.handler() else {
        debug!(worker = index, key = request.key().0, "networker: no handler for result");
        return;
    };
    if panic::catch_unwind(AssertUnwindSafe(|| handler(request))).is_err() {
        error!(
            worker = index,
            key = request.key().0,
            "networker: completion handler panicked"
        );
    }
}

fn perform(
    context: &WorkerContext,
    request: &NetRequest,
) -> std::result::Result<(i32, String), TransportError> {
    let target = split_target(request.url(), context.default_host.as_deref())?;
    let call = TransportCall {
        kind: request.kind(),
        host: target.host,
        path: target.path,
        user_agent: &context.user_agent,
        authorization: request.authorization(),
        body: call_body(request.kind(), request.body()),
    };

    let response = context.transport.execute(&call)?;
    Ok((
        i32::from(response.status),
        response_text(response.status, response.body),
    ))
}

fn call_body(kind: RequestKind, body: &RequestBody) -> CallBody<'_> {
    let content_type = match kind {
        RequestKind::Post | RequestKind::Put => FORM_CONTENT_TYPE,
        RequestKind::PostJson | RequestKind::Patch | RequestKind::Delete => JSON_CONTENT_TYPE,
        RequestKind::PutOctets => OCTET_CONTENT_TYPE,
        RequestKind::Get | RequestKind::Nothing | RequestKind::Quit => return CallBody::Empty,
    };
    match body {
        RequestBody::Bytes(content) => CallBody::Bytes {
            content,
            content_type,
        },
        RequestBody::Text(content) => CallBody::Text {
            content,
            content_type,
        },
        RequestBody::Empty => CallBody::Text {
            content: "",
            content_type,
        },
    }
}

/// Only a plain 200 keeps the server body; other codes carry their reason.
fn response_text(code: u16, body: String) -> String {
    if code == 200 {
        return body;
    }
    StatusCode::from_u16(code)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown Status")
        .to_string()
}

#[cfg(test)]
#[path = "tests/worker_tests.rs"]
mod tests;

//! Scripted transport used by the worker and pool tests.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

use crate::{
    error::TransportError,
    request::RequestKind,
    transport::{CallBody, Transport, TransportCall, TransportResponse},
};

pub(crate) const WAIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedCall {
    pub kind: RequestKind,
    pub host: String,
    pub path: String,
    pub user_agent: String,
    pub authorization: Option<String>,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
    pub thread: String,
}

/// Holds callers inside `execute` until opened.
#[derive(Default)]
pub(crate) struct Gate {
    open: Mutex<bool>,
    changed: Condvar,
    entered: AtomicUsize,
}

impl Gate {
    pub fn open(&self) {
        *self.open.lock() = true;
        self.changed.notify_all();
    }

    fn pass(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let mut open = self.open.lock();
        while !*open {
            self.changed.wait(&mut open);
        }
    }

    /// Wait until `count` callers have reached the gate.
    pub fn wait_entered(&self, count: usize) -> bool {
        let started = Instant::now();
        while self.entered.load(Ordering::SeqCst) < count {
            if started.elapsed() > WAIT {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
        true
    }
}

type Reply = Box<dyn Fn(&TransportCall<'_>) -> Result<TransportResponse, TransportError> + Send + Sync>;

pub(crate) struct ScriptedTransport {
    calls: Mutex<Vec<RecordedCall>>,
    gate: Option<std::sync::Arc<Gate>>,
    reply: Reply,
}

impl ScriptedTransport {
    /// Answers 200 with `ok <path>`.
    pub fn ok() -> Self {
        Self::replying(|call| {
            Ok(TransportResponse {
                status: 200,
                body: format!("ok {}", call.path),
            })
        })
    }

    pub fn status(status: u16, body: &'static str) -> Self {
        Self::replying(move |_| {
            Ok(TransportResponse {
                status,
                body: body.to_string(),
            })
        })
    }

    pub fn failing() -> Self {
        Self::replying(|call| Err(TransportError::Connect(format!("{} refused", call.host))))
    }

    pub fn replying<F>(reply: F) -> Self
    where
        F: Fn(&TransportCall<'_>) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            gate: None,
            reply: Box::new(reply),
        }
    }

    pub fn gated(mut self, gate: std::sync::Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, call: &TransportCall<'_>) -> Result<TransportResponse, TransportError> {
        let (content_type, body) = match call.body {
            CallBody::Empty => (None, Vec::new()),
            CallBody::Text {
                content,
                content_type,
            } => (Some(content_type), content.as_bytes().to_vec()),
            CallBody::Bytes {
                content,
                content_type,
            } => (Some(content_type), content.to_vec()),
        };
        self.calls.lock().push(RecordedCall {
            kind: call.kind,
            host: call.host.to_string(),
            path: call.path.to_string(),
            user_agent: call.user_agent.to_string(),
            authorization: call.authorization.map(str::to_string),
            content_type,
            body,
            thread: thread::current().name().unwrap_or_default().to_string(),
        });

        if let Some(gate) = &self.gate {
            gate.pass();
        }
        (self.reply)(call)
    }
}

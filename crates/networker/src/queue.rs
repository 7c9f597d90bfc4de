//! Mutex-guarded max-priority queue owned by one networker thread.

use std::{cmp::Ordering, collections::BinaryHeap, time::Duration};

use parking_lot::{Condvar, Mutex};

use crate::request::{NetRequest, RequestKind};

struct Queued {
    priority: i32,
    seq: u64,
    request: NetRequest,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl Ord for Queued {
    /// Higher priority first; equal priorities in submission order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct QueueState {
    heap: BinaryHeap<Queued>,
    next_seq: u64,
}

impl QueueState {
    fn push(&mut self, request: NetRequest) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(Queued {
            priority: request.priority(),
            seq,
            request,
        });
    }
}

/// Pending requests for a single worker. Every operation holds the one lock
/// for a bounded critical section and never runs I/O or handlers under it.
#[derive(Default)]
pub struct RequestQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, request: NetRequest) {
        self.state.lock().push(request);
        self.available.notify_one();
    }

    /// Highest-priority request, or `None` when the queue is empty.
    pub fn pop(&self) -> Option<NetRequest> {
        self.state.lock().heap.pop().map(|queued| queued.request)
    }

    /// Drop every pending request and return how many were abandoned. A
    /// queued shutdown record survives.
    pub fn clear(&self) -> usize {
        let abandoned = {
            let mut state = self.state.lock();
            let (quit, abandoned): (Vec<_>, Vec<_>) = std::mem::take(&mut state.heap)
                .into_iter()
                .partition(|queued| queued.request.kind() == RequestKind::Quit);
            state.heap.extend(quit);
            abandoned
        };
        abandoned.len()
    }

    /// Atomically abandon pending work and queue `request` as the only entry.
    pub fn replace_all(&self, request: NetRequest) -> usize {
        let abandoned = {
            let mut state = self.state.lock();
            let abandoned = std::mem::take(&mut state.heap);
            state.push(request);
            abandoned
        };
        self.available.notify_one();
        abandoned.len()
    }

    pub fn len(&self) -> usize {
        self.state.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().heap.is_empty()
    }

    /// Sleep until a push arrives or `timeout` elapses. Returns whether work is
    /// queued on wake-up.
    pub fn wait_for_work(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if state.heap.is_empty() {
            self.available.wait_for(&mut state, timeout);
        }
        !state.heap.is_empty()
    }
}

//! Fixed set of networker threads split into interactive and background
//! subsets, with round-robin submission inside each subset.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    completion::ResponseHandler,
    config::NetConfig,
    error::{NetError, Result},
    request::RequestParams,
    transport::{ReqwestTransport, Transport},
    worker::{Worker, WorkerContext},
    HttpClient,
};

type Workers = Arc<Vec<Worker>>;

enum PoolState {
    Idle,
    Running(Workers),
    Quitting(Workers),
    Killed,
}

pub struct NetworkerPool {
    config: NetConfig,
    context: Arc<WorkerContext>,
    default_handler: Option<ResponseHandler>,
    state: Mutex<PoolState>,
    next_interactive: AtomicUsize,
    next_background: AtomicUsize,
}

impl NetworkerPool {
    /// Pool backed by the blocking `reqwest` transport.
    pub fn new(config: NetConfig, default_handler: Option<ResponseHandler>) -> Result<Self> {
        let transport =
            ReqwestTransport::new(config.request_timeout, config.accept_invalid_certs)?;
        Self::with_transport(config, Arc::new(transport), default_handler)
    }

    /// `default_handler` receives results of requests submitted without their
    /// own handler.
    pub fn with_transport(
        config: NetConfig,
        transport: Arc<dyn Transport>,
        default_handler: Option<ResponseHandler>,
    ) -> Result<Self> {
        config.validate()?;
        let context = Arc::new(WorkerContext {
            transport,
            user_agent: config.user_agent.clone(),
            default_host: config.default_host.clone(),
            idle_wait: config.idle_wait,
        });
        Ok(Self {
            config,
            context,
            default_handler,
            state: Mutex::new(PoolState::Idle),
            next_interactive: AtomicUsize::new(0),
            next_background: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Spawn every worker thread. Fails if any thread cannot start; threads
    /// already started are shut down again.
    pub fn init(&self) -> Result<()> {
        let mut state = self.state.lock();
        match &*state {
            PoolState::Idle => {}
            PoolState::Running(_) | PoolState::Quitting(_) => {
                return Err(NetError::AlreadyInitialized)
            }
            PoolState::Killed => return Err(NetError::AlreadyKilled),
        }

        let mut workers = Vec::with_capacity(self.config.worker_count);
        for index in 0..self.config.worker_count {
            // On failure the started workers quit and join as they drop.
            workers.push(Worker::spawn(index, Arc::clone(&self.context))?);
        }

        info!(
            workers = self.config.worker_count,
            interactive = self.config.interactive_workers,
            "networker: pool started"
        );
        *state = PoolState::Running(Arc::new(workers));
        Ok(())
    }

    /// Build a request and queue it on the next worker of the chosen subset.
    /// Returns the index of that worker.
    pub fn submit(&self, interactive: bool, params: RequestParams) -> Result<usize> {
        let mut request = params.build()?;
        request.set_handler_if_missing(self.default_handler.as_ref());

        // The state lock is held across the push so a concurrent
        // `prepare_quit` either abandons this request or refuses it.
        let state = self.state.lock();
        let PoolState::Running(workers) = &*state else {
            return Err(NetError::NotRunning);
        };
        let worker = &workers[self.next_worker_index(interactive)];
        debug!(
            worker = worker.index(),
            interactive,
            key = request.key().0,
            kind = request.kind().as_str(),
            priority = request.priority(),
            "networker: request queued"
        );
        worker.enqueue(request);
        Ok(worker.index())
    }

    fn next_worker_index(&self, interactive: bool) -> usize {
        let interactive_count = self.config.interactive_workers;
        if interactive {
            self.next_interactive.fetch_add(1, Ordering::Relaxed) % interactive_count
        } else {
            let background_count = self.config.background_workers();
            interactive_count
                + self.next_background.fetch_add(1, Ordering::Relaxed) % background_count
        }
    }

    /// Drop every queued request on every worker. In-flight calls still
    /// complete. Returns the number of abandoned requests. Does nothing once
    /// shutdown has started.
    pub fn stop_all_requests(&self) -> usize {
        let workers = match &*self.state.lock() {
            PoolState::Running(workers) => Arc::clone(workers),
            _ => return 0,
        };
        let abandoned: usize = workers.iter().map(Worker::stop_all).sum();
        if abandoned > 0 {
            info!(abandoned, "networker: stopped pending requests");
        }
        abandoned
    }

    /// Ask every worker to quit after its current call and wait for all of
    /// them. No timeout: this waits for the slowest in-flight request.
    pub fn prepare_quit(&self) -> Result<()> {
        let workers = {
            let mut state = self.state.lock();
            match &*state {
                PoolState::Idle => return Ok(()),
                PoolState::Killed => return Err(NetError::AlreadyKilled),
                PoolState::Quitting(workers) => Arc::clone(workers),
                PoolState::Running(workers) => {
                    let workers = Arc::clone(workers);
                    *state = PoolState::Quitting(Arc::clone(&workers));
                    workers
                }
            }
        };
        quit_and_join(&workers);
        Ok(())
    }

    /// Shut down, join every thread and release the workers. Only valid once.
    pub fn kill(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), PoolState::Killed);
        let workers = match previous {
            PoolState::Killed => return Err(NetError::AlreadyKilled),
            PoolState::Idle => return Ok(()),
            PoolState::Running(workers) | PoolState::Quitting(workers) => workers,
        };
        quit_and_join(&workers);
        drop(workers);
        info!("networker: pool killed");
        Ok(())
    }

    /// Requests waiting in queues, not counting calls in flight.
    pub fn pending_requests(&self) -> usize {
        self.live_workers()
            .map_or(0, |workers| workers.iter().map(Worker::pending).sum())
    }

    pub fn is_running(&self) -> bool {
        matches!(&*self.state.lock(), PoolState::Running(_))
    }

    fn live_workers(&self) -> Option<Workers> {
        match &*self.state.lock() {
            PoolState::Running(workers) | PoolState::Quitting(workers) => {
                Some(Arc::clone(workers))
            }
            PoolState::Idle | PoolState::Killed => None,
        }
    }
}

fn quit_and_join(workers: &[Worker]) {
    for worker in workers {
        worker.prepare_quit();
    }
    for worker in workers {
        worker.join();
    }
}

impl Drop for NetworkerPool {
    fn drop(&mut self) {
        if matches!(
            &*self.state.lock(),
            PoolState::Running(_) | PoolState::Quitting(_)
        ) {
            warn!("networker: pool dropped without kill; shutting down");
            let _ = self.kill();
        }
    }
}

impl HttpClient for NetworkerPool {
    fn init(&self) -> Result<()> {
        NetworkerPool::init(self)
    }

    fn kill(&self) -> Result<()> {
        NetworkerPool::kill(self)
    }

    fn stop_all_requests(&self) {
        NetworkerPool::stop_all_requests(self);
    }

    fn prepare_quit(&self) -> Result<()> {
        NetworkerPool::prepare_quit(self)
    }

    fn perform_request(&self, interactive: bool, params: RequestParams) -> Result<()> {
        self.submit(interactive, params).map(|_| ())
    }
}

#[cfg(test)]
#[path = "tests/pool_tests.rs"]
mod tests;

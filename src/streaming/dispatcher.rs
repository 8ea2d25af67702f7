//! Background computation with delivery on the control thread
//!
//! Jobs run on a bounded rayon pool. Each finished job sends a boxed
//! completion through an unbounded channel; the owner drains the channel
//! once per tick and applies every completion to itself. Results arrive in
//! completion order, not submission order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::sync::mpsc;

use crate::core::error::Error;
use crate::core::types::Result;

/// Callback applied to the owner `M` on the control thread
pub type Completion<M> = Box<dyn FnOnce(&mut M) + Send>;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub struct WorkerDispatcher<M> {
    pool: ThreadPool,
    tx: mpsc::UnboundedSender<Completion<M>>,
    rx: mpsc::UnboundedReceiver<Completion<M>>,
    /// Submitted jobs whose completion has not been polled yet
    in_flight: Arc<AtomicUsize>,
}

impl<M: 'static> WorkerDispatcher<M> {
    /// Create a dispatcher with `threads` workers (0 for one per core)
    pub fn new(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("terrain-worker-{}", i))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();

        log::debug!("Worker dispatcher started with {} threads", pool.current_num_threads());

        Ok(Self {
            pool,
            tx,
            rx,
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Run `compute` on a worker and deliver its result to `on_complete`
    /// during a later [`poll`](Self::poll). A panicking job delivers
    /// `Err(Error::Worker)`.
    pub fn submit<T, F, C>(&self, compute: F, on_complete: C)
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(&mut M, Result<T>) + Send + 'static,
    {
        let tx = self.tx.clone();
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        self.pool.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(compute))
                .map_err(|payload| Error::Worker(panic_message(payload.as_ref())));
            if let Err(e) = &result {
                log::error!("Background job failed: {}", e);
            }

            let completion: Completion<M> = Box::new(move |owner| on_complete(owner, result));
            if tx.send(completion).is_err() {
                log::debug!("Dispatcher dropped before a job finished");
            }
        });
    }

    /// Run a side-effecting `action` and signal `on_done` when it finishes
    pub fn run<F, C>(&self, action: F, on_done: C)
    where
        F: FnOnce() + Send + 'static,
        C: FnOnce(&mut M, Result<()>) + Send + 'static,
    {
        self.submit(action, on_done);
    }

    /// Drain every completion that has arrived, in arrival order
    pub fn poll(&mut self) -> Vec<Completion<M>> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            completions.push(completion);
        }
        completions
    }

    /// Jobs submitted but not yet delivered through `poll`
    pub fn pending(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

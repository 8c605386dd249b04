//! The execution context transitions run on.
//!
//! All tree mutation and hook invocation is serialized onto a single logical
//! thread owned by a [`Dispatcher`]. The machine only needs two primitives:
//! a non-blocking FIFO enqueue and a blocking run-on-the-owner call. Any
//! execution model that provides both conforms; [`ThreadDispatcher`] is the
//! bundled implementation backed by a dedicated worker thread.

use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::Sender;

/// A unit of work handed to a dispatcher.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Serial execution context.
pub trait Dispatcher: Send + Sync {
    /// Enqueue `job` for later execution on the owning thread.
    ///
    /// Non-blocking; jobs run in FIFO order relative to each other.
    fn schedule(&self, job: Job);

    /// Execute `job` on the owning thread before returning.
    ///
    /// Reentrant-safe: when called from the owning thread itself the job
    /// runs inline. Otherwise the caller blocks until the job has executed,
    /// after all previously scheduled work.
    fn run_sync(&self, job: Job);
}

/// Dispatcher backed by one worker thread draining an unbounded queue.
///
/// Dropping the dispatcher closes the queue; the worker finishes whatever is
/// already enqueued and exits, and the drop joins it.
///
/// # Example
///
/// ```rust
/// use statepath::dispatch::{Dispatcher, ThreadDispatcher};
/// use std::sync::{Arc, Mutex};
///
/// let dispatcher = ThreadDispatcher::spawn();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// for n in 0..3 {
///     let seen = Arc::clone(&seen);
///     dispatcher.schedule(Box::new(move || seen.lock().unwrap().push(n)));
/// }
/// // run_sync runs after everything already queued.
/// dispatcher.run_sync(Box::new(|| {}));
///
/// assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
/// ```
pub struct ThreadDispatcher {
    tx: Sender<Job>,
    worker_id: Arc<OnceLock<ThreadId>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadDispatcher {
    /// Spawn the worker thread and return the dispatcher owning it.
    pub fn spawn() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let worker_id = Arc::new(OnceLock::new());
        let id_slot = Arc::clone(&worker_id);
        let handle = thread::spawn(move || {
            let _ = id_slot.set(thread::current().id());
            for job in rx {
                job();
            }
        });
        Self {
            tx,
            worker_id,
            handle: Some(handle),
        }
    }

    fn on_worker_thread(&self) -> bool {
        self.worker_id.get() == Some(&thread::current().id())
    }
}

impl Dispatcher for ThreadDispatcher {
    fn schedule(&self, job: Job) {
        if self.tx.send(job).is_err() {
            tracing::warn!("dispatcher queue is closed; job discarded");
        }
    }

    fn run_sync(&self, job: Job) {
        if self.on_worker_thread() {
            job();
            return;
        }
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let wrapped: Job = Box::new(move || {
            job();
            let _ = done_tx.send(());
        });
        if self.tx.send(wrapped).is_err() {
            tracing::warn!("dispatcher queue is closed; job discarded");
            return;
        }
        let _ = done_rx.recv();
    }
}

impl Drop for ThreadDispatcher {
    fn drop(&mut self) {
        // Close the queue so the worker drains and exits, then join it. The
        // worker thread itself may hold the last reference; never self-join.
        let (closed_tx, _) = crossbeam_channel::unbounded();
        drop(std::mem::replace(&mut self.tx, closed_tx));
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn scheduled_jobs_run_in_fifo_order() {
        let dispatcher = ThreadDispatcher::spawn();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..10 {
            let order = Arc::clone(&order);
            dispatcher.schedule(Box::new(move || order.lock().unwrap().push(n)));
        }
        dispatcher.run_sync(Box::new(|| {}));

        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn run_sync_blocks_until_executed() {
        let dispatcher = ThreadDispatcher::spawn();
        let flag = Arc::new(Mutex::new(false));

        let set = Arc::clone(&flag);
        dispatcher.run_sync(Box::new(move || *set.lock().unwrap() = true));

        assert!(*flag.lock().unwrap());
    }

    #[test]
    fn run_sync_is_reentrant_on_the_worker_thread() {
        let dispatcher = Arc::new(ThreadDispatcher::spawn());
        let flag = Arc::new(Mutex::new(false));

        let inner_dispatcher = Arc::clone(&dispatcher);
        let set = Arc::clone(&flag);
        // A nested run_sync from a scheduled job must run inline instead of
        // deadlocking on its own queue.
        dispatcher.run_sync(Box::new(move || {
            inner_dispatcher.run_sync(Box::new(move || *set.lock().unwrap() = true));
        }));

        assert!(*flag.lock().unwrap());
    }

    #[test]
    fn run_sync_runs_after_previously_scheduled_work() {
        let dispatcher = ThreadDispatcher::spawn();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&order);
        dispatcher.schedule(Box::new(move || first.lock().unwrap().push("scheduled")));
        let second = Arc::clone(&order);
        dispatcher.run_sync(Box::new(move || second.lock().unwrap().push("sync")));

        assert_eq!(*order.lock().unwrap(), vec!["scheduled", "sync"]);
    }

    #[test]
    fn drop_drains_pending_jobs() {
        let dispatcher = ThreadDispatcher::spawn();
        let count = Arc::new(Mutex::new(0));

        for _ in 0..100 {
            let count = Arc::clone(&count);
            dispatcher.schedule(Box::new(move || *count.lock().unwrap() += 1));
        }
        drop(dispatcher);

        assert_eq!(*count.lock().unwrap(), 100);
    }
}

//! The transition coordinator.
//!
//! [`StateMachine`] owns the tree, the current-leaf pointer, and the
//! in-flight guard, and runs the exit/enter algorithm on its dispatcher's
//! thread. Requests may come from any thread; they only touch the guard and
//! the dispatcher queue, making that queue the sole synchronization
//! boundary.

mod builder;

pub use builder::MachineBuilder;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::Mutex;

use crate::core::{
    resolve, NodeId, StateContext, StateTree, TransitionLog, TransitionRecord, TransitionRequest,
};
use crate::diagnostics::{DiagnosticEvent, Diagnostics};
use crate::dispatch::Dispatcher;

/// Hierarchical state machine with path-addressed transitions.
///
/// Exactly one leaf is current while the machine runs. Transitions are
/// requested with path expressions (see [`crate::core::resolve`]) and applied
/// on the dispatcher thread: exit hooks run from the old leaf root-ward to
/// the common ancestor, the current pointer switches, enter hooks run from
/// the common ancestor leaf-ward to the new leaf.
///
/// Cloning is cheap and shares the same machine.
///
/// # Example
///
/// ```rust
/// use statepath::core::{NoopBehavior, StateTree, NEXT_STATE};
/// use statepath::dispatch::{Dispatcher, ThreadDispatcher};
/// use statepath::machine::StateMachine;
/// use std::sync::Arc;
///
/// let mut tree = StateTree::new();
/// let root = tree.root();
/// let menu = tree.add_child(root, "menu", "Main menu", NoopBehavior)?;
/// tree.add_child(menu, "idle", "Waiting", NoopBehavior)?;
/// tree.add_child(menu, "busy", "Working", NoopBehavior)?;
///
/// let dispatcher = Arc::new(ThreadDispatcher::spawn());
/// let machine = StateMachine::builder(tree)
///     .dispatcher(Arc::clone(&dispatcher) as Arc<dyn Dispatcher>)
///     .build();
///
/// machine.start();
/// assert_eq!(machine.current_path().as_deref(), Some("/menu/idle"));
///
/// machine.request_transition(NEXT_STATE);
/// dispatcher.run_sync(Box::new(|| {})); // drain the queue
/// assert_eq!(machine.current_path().as_deref(), Some("/menu/busy"));
///
/// machine.stop();
/// assert!(!machine.is_running());
/// # Ok::<(), statepath::core::TreeError>(())
/// ```
pub struct StateMachine {
    inner: Arc<MachineInner>,
}

impl Clone for StateMachine {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(crate) struct MachineInner {
    tree: Mutex<StateTree>,
    current: Mutex<Option<NodeId>>,
    in_flight: AtomicBool,
    dispatcher: Arc<dyn Dispatcher>,
    diagnostics: Arc<dyn Diagnostics>,
    log: Mutex<TransitionLog>,
}

impl StateMachine {
    /// Build a machine over `tree` with the default dispatcher and
    /// diagnostics.
    pub fn new(tree: StateTree) -> Self {
        Self::builder(tree).build()
    }

    /// Start configuring a machine over `tree`.
    pub fn builder(tree: StateTree) -> MachineBuilder {
        MachineBuilder::new(tree)
    }

    pub(crate) fn from_inner(inner: MachineInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub(crate) fn inner_parts(
        tree: StateTree,
        dispatcher: Arc<dyn Dispatcher>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> MachineInner {
        MachineInner {
            tree: Mutex::new(tree),
            current: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            dispatcher,
            diagnostics,
            log: Mutex::new(TransitionLog::new()),
        }
    }

    /// Start the machine: the first leaf of the tree becomes current and the
    /// enter hooks run from the root down to it.
    ///
    /// Completes on the dispatcher thread before returning.
    pub fn start(&self) {
        let inner = Arc::clone(&self.inner);
        self.inner.dispatcher.run_sync(Box::new(move || {
            let mut tree = inner.tree.lock();
            let target = tree.first_leaf(tree.root());
            *inner.current.lock() = Some(target);

            let path = tree.canonical_path(target);
            tracing::info!(path = %path, "state machine started");
            inner
                .diagnostics
                .emit(DiagnosticEvent::Entered { path });

            let chain = tree.canonical_chain(target);
            MachineInner::enter_path(&inner, &mut tree, &chain, 0);
        }));
    }

    /// Stop the machine: exit hooks run from the current leaf up to the
    /// root and the current pointer is cleared. A no-op when not running.
    ///
    /// Completes on the dispatcher thread before returning.
    pub fn stop(&self) {
        let inner = Arc::clone(&self.inner);
        self.inner.dispatcher.run_sync(Box::new(move || {
            let mut tree = inner.tree.lock();
            let Some(current) = inner.current.lock().take() else {
                return;
            };

            let chain = tree.canonical_chain(current);
            MachineInner::exit_path(&inner, &mut tree, &chain, 0);

            let path = tree.canonical_path(current);
            tracing::info!(path = %path, "state machine stopped");
            inner.diagnostics.emit(DiagnosticEvent::Exited { path });
        }));
    }

    /// `stop` followed by `start`.
    pub fn restart(&self) {
        self.stop();
        self.start();
    }

    /// Request a transition to `expr`. Callable from any thread; returns
    /// immediately.
    ///
    /// If a transition is already in flight the request is discarded
    /// (drop-newest, never queued) with a log line and a
    /// [`DiagnosticEvent::Dropped`]. Otherwise the application is scheduled
    /// on the dispatcher in FIFO order with other pending work.
    pub fn request_transition(&self, expr: &str) {
        MachineInner::request(&self.inner, expr);
    }

    /// Canonical path of the current leaf, `None` when stopped.
    pub fn current_path(&self) -> Option<String> {
        let current = (*self.inner.current.lock())?;
        Some(self.inner.tree.lock().canonical_path(current))
    }

    /// Whether a leaf is current.
    pub fn is_running(&self) -> bool {
        self.inner.current.lock().is_some()
    }

    /// Snapshot of the applied-transition log.
    pub fn history(&self) -> TransitionLog {
        self.inner.log.lock().clone()
    }
}

impl MachineInner {
    fn request(inner: &Arc<MachineInner>, expr: &str) {
        if inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!(requested = %expr, "transition in flight; request dropped");
            inner.diagnostics.emit(DiagnosticEvent::Dropped {
                requested: expr.to_string(),
            });
            return;
        }

        tracing::info!(requested = %expr, "transition scheduled");
        let expr = expr.to_string();
        let scheduled = Arc::clone(inner);
        inner
            .dispatcher
            .schedule(Box::new(move || Self::apply_transition(&scheduled, &expr)));
    }

    /// The exit/enter algorithm. Always runs on the dispatcher thread.
    fn apply_transition(inner: &Arc<MachineInner>, expr: &str) {
        let mut tree = inner.tree.lock();
        let Some(current) = *inner.current.lock() else {
            tracing::warn!(requested = %expr, "transition requested while stopped; ignored");
            inner.in_flight.store(false, Ordering::Release);
            return;
        };

        // Resolve the full target path before any exit hook runs, so the
        // machine never ends up without a valid current leaf.
        let target = match resolve(&tree, current, expr) {
            Ok(target) => target,
            Err(error) => {
                let from = tree.canonical_path(current);
                tracing::error!(requested = %expr, from = %from, %error, "transition target not found");
                inner.diagnostics.emit(DiagnosticEvent::NotFound {
                    requested: expr.to_string(),
                    from,
                });
                inner.in_flight.store(false, Ordering::Release);
                return;
            }
        };

        let old_chain = tree.canonical_chain(current);
        let new_chain = tree.canonical_chain(target);
        let common_depth = common_prefix_len(&old_chain, &new_chain);

        let old_path = tree.canonical_path(current);
        let new_path = tree.canonical_path(target);

        Self::exit_path(inner, &mut tree, &old_chain, common_depth);
        inner.diagnostics.emit(DiagnosticEvent::Exited {
            path: old_path.clone(),
        });

        *inner.current.lock() = Some(target);
        // Cleared before the enter hooks so a transition requested from
        // inside an on_enter is accepted rather than dropped.
        inner.in_flight.store(false, Ordering::Release);

        inner.diagnostics.emit(DiagnosticEvent::Entered {
            path: new_path.clone(),
        });
        Self::enter_path(inner, &mut tree, &new_chain, common_depth);

        let record = TransitionRecord {
            from: old_path,
            to: new_path,
            requested: expr.to_string(),
            timestamp: Utc::now(),
        };
        let mut log = inner.log.lock();
        *log = log.record(record);
    }

    /// Run `on_exit` then `install_handlers(false)` innermost node first,
    /// from the chain's leaf back to `common_depth`.
    fn exit_path(
        inner: &Arc<MachineInner>,
        tree: &mut StateTree,
        chain: &[NodeId],
        common_depth: usize,
    ) {
        let proxy = RequestProxy {
            inner: Arc::downgrade(inner),
        };
        for &id in chain[common_depth..].iter().rev() {
            let path = tree.canonical_path(id);
            let label = tree.node(id).label().to_string();
            tracing::debug!(path = %path, "exit");
            let ctx = StateContext::new(&path, &label, &proxy);
            let node = tree.node_mut(id);
            node.behavior_mut().on_exit(&ctx);
            node.behavior_mut().install_handlers(false, &ctx);
        }
    }

    /// Run `install_handlers(true)` then `on_enter` outermost node first,
    /// from `common_depth` to the chain's leaf.
    fn enter_path(
        inner: &Arc<MachineInner>,
        tree: &mut StateTree,
        chain: &[NodeId],
        common_depth: usize,
    ) {
        let proxy = RequestProxy {
            inner: Arc::downgrade(inner),
        };
        for &id in &chain[common_depth..] {
            let path = tree.canonical_path(id);
            let label = tree.node(id).label().to_string();
            tracing::debug!(path = %path, "enter");
            let ctx = StateContext::new(&path, &label, &proxy);
            let node = tree.node_mut(id);
            node.behavior_mut().install_handlers(true, &ctx);
            node.behavior_mut().on_enter(&ctx);
        }
    }
}

/// Length of the longest shared-by-identity prefix of two chains.
fn common_prefix_len(a: &[NodeId], b: &[NodeId]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Request channel handed to behavior hooks. Holds a weak reference so a
/// behavior stashing it never keeps the machine alive.
struct RequestProxy {
    inner: Weak<MachineInner>,
}

impl TransitionRequest for RequestProxy {
    fn request_transition(&self, expr: &str) {
        if let Some(inner) = self.inner.upgrade() {
            MachineInner::request(&inner, expr);
        }
    }
}

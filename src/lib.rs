//! Statepath: a hierarchical state machine with path-addressed transitions.
//!
//! A state tree is built once: composite states contain child states, and
//! exactly one leaf is "current" while the machine runs. Transitions are
//! requested with path expressions (`/wizard/confirm`, `../retry`, or the
//! [`NEXT_STATE`] sentinel) and applied on a single-threaded
//! [`Dispatcher`]: exit hooks run from the old leaf root-ward to the common
//! ancestor, enter hooks run from there leaf-ward to the new leaf.
//!
//! # Core Concepts
//!
//! - **Tree**: append-only arena of named states ([`StateTree`])
//! - **Behaviors**: per-state `on_enter`/`on_exit`/`install_handlers` hooks
//!   ([`StateBehavior`])
//! - **Resolution**: path expressions to target leaves ([`resolve`])
//! - **Coordination**: the in-flight guard and drop-newest backpressure
//!   ([`StateMachine`])
//!
//! # Example
//!
//! ```rust
//! use statepath::{NoopBehavior, StateMachine, StateTree, NEXT_STATE};
//! use statepath::dispatch::{Dispatcher, ThreadDispatcher};
//! use std::sync::Arc;
//!
//! let mut tree = StateTree::new();
//! let root = tree.root();
//! let wizard = tree.add_child(root, "wizard", "Setup wizard", NoopBehavior)?;
//! tree.add_child(wizard, "welcome", "Welcome page", NoopBehavior)?;
//! tree.add_child(wizard, "confirm", "Confirm page", NoopBehavior)?;
//!
//! let dispatcher = Arc::new(ThreadDispatcher::spawn());
//! let machine = StateMachine::builder(tree)
//!     .dispatcher(Arc::clone(&dispatcher) as Arc<dyn Dispatcher>)
//!     .build();
//!
//! machine.start();
//! assert_eq!(machine.current_path().as_deref(), Some("/wizard/welcome"));
//!
//! machine.request_transition(NEXT_STATE);
//! dispatcher.run_sync(Box::new(|| {}));
//! assert_eq!(machine.current_path().as_deref(), Some("/wizard/confirm"));
//!
//! machine.stop();
//! # Ok::<(), statepath::TreeError>(())
//! ```

pub mod core;
pub mod diagnostics;
pub mod dispatch;
pub mod machine;

// Re-export commonly used types
pub use self::core::{
    resolve, NodeId, NoopBehavior, PathError, StateBehavior, StateContext, StateNode, StateTree,
    TransitionLog, TransitionRecord, TreeError, NEXT_STATE,
};
pub use self::diagnostics::{DiagnosticEvent, Diagnostics, TracingDiagnostics};
pub use self::dispatch::{Dispatcher, ThreadDispatcher};
pub use self::machine::{MachineBuilder, StateMachine};

//! Builder for configuring a state machine.

use std::sync::Arc;

use crate::core::StateTree;
use crate::diagnostics::{Diagnostics, TracingDiagnostics};
use crate::dispatch::{Dispatcher, ThreadDispatcher};
use crate::machine::StateMachine;

/// Configures the collaborators of a [`StateMachine`].
///
/// Both collaborators have defaults: a freshly spawned
/// [`ThreadDispatcher`] and [`TracingDiagnostics`]. Tests typically inject
/// their own dispatcher (to drain the queue deterministically) and a
/// recording diagnostics sink.
pub struct MachineBuilder {
    tree: StateTree,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
}

impl MachineBuilder {
    /// Start building a machine over `tree`.
    pub fn new(tree: StateTree) -> Self {
        Self {
            tree,
            dispatcher: None,
            diagnostics: None,
        }
    }

    /// Use `dispatcher` as the machine's execution context.
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Send diagnostic events to `diagnostics`.
    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Build the machine. The machine starts stopped; call
    /// [`StateMachine::start`].
    pub fn build(self) -> StateMachine {
        let dispatcher = self
            .dispatcher
            .unwrap_or_else(|| Arc::new(ThreadDispatcher::spawn()));
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(TracingDiagnostics));
        StateMachine::from_inner(StateMachine::inner_parts(self.tree, dispatcher, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NoopBehavior, StateTree};

    #[test]
    fn defaults_produce_a_working_machine() {
        let mut tree = StateTree::new();
        let root = tree.root();
        tree.add_child(root, "only", "", NoopBehavior).unwrap();

        let machine = MachineBuilder::new(tree).build();
        assert!(!machine.is_running());

        machine.start();
        assert_eq!(machine.current_path().as_deref(), Some("/only"));
        machine.stop();
        assert!(!machine.is_running());
    }
}

//! Per-state behavior hooks.
//!
//! Every node in a state tree carries a `StateBehavior` implementation. The
//! machine invokes the hooks on its dispatcher thread as the current leaf
//! moves through the tree: `install_handlers(true)`/`on_enter` when a node
//! becomes current or an ancestor of current, `on_exit`/`install_handlers(false)`
//! when it stops being one.

/// Sink for transition requests issued from inside behavior hooks.
///
/// Behaviors never talk to the machine directly; they receive a
/// [`StateContext`] whose request channel is this trait. Tests can substitute
/// a recording implementation to exercise a behavior in isolation.
pub trait TransitionRequest {
    /// Ask the owning machine to transition to `expr`.
    ///
    /// Non-blocking. The request is applied later on the dispatcher thread,
    /// or dropped if another transition is already in flight.
    fn request_transition(&self, expr: &str);
}

/// Read-only view of a node handed to its behavior hooks.
///
/// Carries the node's canonical path and label, plus the channel for
/// requesting further transitions. The context borrows from the machine for
/// the duration of a single hook call; behaviors that need the path later
/// must copy it out.
pub struct StateContext<'a> {
    path: &'a str,
    label: &'a str,
    requests: &'a dyn TransitionRequest,
}

impl<'a> StateContext<'a> {
    /// Assemble a context. Called by the machine per hook invocation; tests
    /// may build one around a mock [`TransitionRequest`].
    pub fn new(path: &'a str, label: &'a str, requests: &'a dyn TransitionRequest) -> Self {
        Self {
            path,
            label,
            requests,
        }
    }

    /// Canonical path of the node the hook runs on (empty for the root).
    pub fn path(&self) -> &str {
        self.path
    }

    /// The node's opaque label, as passed to `add_child`.
    pub fn label(&self) -> &str {
        self.label
    }

    /// Request a transition from inside a hook.
    ///
    /// Legitimate only while the node is installed, which is exactly the
    /// interval its hooks can run. A request issued from `on_enter` is
    /// accepted: the machine clears its in-flight guard before the enter
    /// hooks fire.
    pub fn request_transition(&self, expr: &str) {
        self.requests.request_transition(expr);
    }
}

/// Overridable behavior of a single state.
///
/// All hooks default to no-ops, so concrete states override only what they
/// need. Hooks run on the dispatcher thread with the tree borrowed; use the
/// provided [`StateContext`] rather than calling back into the machine's
/// inspection methods.
///
/// # Example
///
/// ```rust
/// use statepath::core::{StateBehavior, StateContext};
///
/// struct Announcer;
///
/// impl StateBehavior for Announcer {
///     fn on_enter(&mut self, ctx: &StateContext<'_>) {
///         println!("entered {}", ctx.path());
///     }
/// }
/// ```
pub trait StateBehavior: Send {
    /// Invoked when the node becomes current or an ancestor of current,
    /// outermost node first, after `install_handlers(true)`.
    fn on_enter(&mut self, _ctx: &StateContext<'_>) {}

    /// Invoked when the node stops being current or an ancestor of current,
    /// innermost node first, before `install_handlers(false)`.
    fn on_exit(&mut self, _ctx: &StateContext<'_>) {}

    /// Brackets the interval the node is current or an ancestor of current.
    ///
    /// `installed` is `true` immediately before `on_enter` and `false`
    /// immediately after `on_exit`. Typical overrides attach and detach the
    /// input handlers the state listens with.
    fn install_handlers(&mut self, _installed: bool, _ctx: &StateContext<'_>) {}
}

/// Behavior with no overrides, for plain structural states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoopBehavior;

impl StateBehavior for NoopBehavior {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRequests {
        exprs: Mutex<Vec<String>>,
    }

    impl TransitionRequest for RecordingRequests {
        fn request_transition(&self, expr: &str) {
            self.exprs.lock().unwrap().push(expr.to_string());
        }
    }

    struct Advancer;

    impl StateBehavior for Advancer {
        fn on_enter(&mut self, ctx: &StateContext<'_>) {
            ctx.request_transition("../done");
        }
    }

    #[test]
    fn context_exposes_path_and_label() {
        let requests = RecordingRequests::default();
        let ctx = StateContext::new("/a/b", "label text", &requests);

        assert_eq!(ctx.path(), "/a/b");
        assert_eq!(ctx.label(), "label text");
    }

    #[test]
    fn context_routes_requests_to_sink() {
        let requests = RecordingRequests::default();
        let ctx = StateContext::new("/a", "", &requests);

        let mut behavior = Advancer;
        behavior.on_enter(&ctx);

        assert_eq!(*requests.exprs.lock().unwrap(), vec!["../done"]);
    }

    #[test]
    fn noop_behavior_hooks_do_nothing() {
        let requests = RecordingRequests::default();
        let ctx = StateContext::new("/a", "", &requests);

        let mut noop = NoopBehavior;
        noop.install_handlers(true, &ctx);
        noop.on_enter(&ctx);
        noop.on_exit(&ctx);
        noop.install_handlers(false, &ctx);

        assert!(requests.exprs.lock().unwrap().is_empty());
    }
}

//! Observational channel for state-machine activity.
//!
//! The machine reports canonical-path text at each enter/exit boundary and
//! at drop/failure events. Sinks are strictly observational: nothing they do
//! feeds back into control flow. The default sink forwards to `tracing`.

use serde::Serialize;

/// One observable machine event, in canonical-path terms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// A leaf (and any newly shared ancestors) became current.
    Entered {
        /// Canonical path of the new current leaf.
        path: String,
    },
    /// A leaf (and its no-longer-shared ancestors) stopped being current.
    Exited {
        /// Canonical path of the leaf that was current.
        path: String,
    },
    /// A request arrived while another transition was in flight and was
    /// discarded. Informational, not an error.
    Dropped {
        /// The discarded path expression.
        requested: String,
    },
    /// A requested path expression did not resolve; the transition was
    /// aborted with the tree unchanged.
    NotFound {
        /// The unresolvable path expression.
        requested: String,
        /// Canonical path of the leaf that stayed current.
        from: String,
    },
}

/// Sink for [`DiagnosticEvent`]s.
///
/// Implementations must not block or call back into the machine.
pub trait Diagnostics: Send + Sync {
    /// Receive one event.
    fn emit(&self, event: DiagnosticEvent);
}

/// Default sink: forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        match &event {
            DiagnosticEvent::Entered { path } => {
                tracing::info!(path = %path, "state in");
            }
            DiagnosticEvent::Exited { path } => {
                tracing::info!(path = %path, "state out");
            }
            DiagnosticEvent::Dropped { requested } => {
                tracing::info!(requested = %requested, "transition in flight; request dropped");
            }
            DiagnosticEvent::NotFound { requested, from } => {
                tracing::error!(requested = %requested, from = %from, "transition target not found");
            }
        }
    }
}

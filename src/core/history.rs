//! Applied-transition history.
//!
//! The machine appends one record per applied transition. The log is an
//! immutable value: `record` returns a new log, leaving the original
//! untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of one applied transition, in canonical-path terms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Canonical path of the leaf that was current before the transition.
    pub from: String,
    /// Canonical path of the leaf that became current.
    pub to: String,
    /// The path expression the transition was requested with.
    pub requested: String,
    /// When the transition was applied.
    pub timestamp: DateTime<Utc>,
}

/// Ordered log of applied transitions.
///
/// # Example
///
/// ```rust
/// use statepath::core::{TransitionLog, TransitionRecord};
/// use chrono::Utc;
///
/// let log = TransitionLog::new();
/// let log = log.record(TransitionRecord {
///     from: "/A/A1".to_string(),
///     to: "/A/A2".to_string(),
///     requested: "NEXTSTATE".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(log.leaf_paths(), vec!["/A/A1", "/A/A2"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionLog {
    transitions: Vec<TransitionRecord>,
}

impl TransitionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Append a record, returning a new log. The original is unchanged.
    pub fn record(&self, record: TransitionRecord) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(record);
        Self { transitions }
    }

    /// The recorded transitions in application order.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Number of applied transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Whether no transition has been applied yet.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// The sequence of current-leaf paths: the first record's origin, then
    /// each record's destination. Empty for an empty log.
    pub fn leaf_paths(&self) -> Vec<&str> {
        let mut paths = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.first() {
            paths.push(first.from.as_str());
        }
        for record in &self.transitions {
            paths.push(record.to.as_str());
        }
        paths
    }

    /// Wall-clock span between the first and last record, if any.
    pub fn duration(&self) -> Option<chrono::Duration> {
        let first = self.transitions.first()?;
        let last = self.transitions.last()?;
        Some(last.timestamp - first.timestamp)
    }
}

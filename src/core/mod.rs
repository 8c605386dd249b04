//! Core tree and resolution types.
//!
//! This module contains the structural heart of the machine:
//! - The node arena and tree (`StateTree`, `StateNode`, `NodeId`)
//! - Per-state behavior hooks (`StateBehavior`, `StateContext`)
//! - Path-expression resolution (`resolve`, `NEXT_STATE`)
//! - The applied-transition log (`TransitionLog`)
//!
//! Everything here is synchronous and single-threaded; the machine layer
//! serializes access onto its dispatcher.

mod behavior;
mod history;
mod path;
mod tree;

pub use behavior::{NoopBehavior, StateBehavior, StateContext, TransitionRequest};
pub use history::{TransitionLog, TransitionRecord};
pub use path::{resolve, PathError, NEXT_STATE};
pub use tree::{NodeId, StateNode, StateTree, TreeError};

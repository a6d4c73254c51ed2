//! Dependent selector resolution.
//!
//! A chain of ordered stages where each stage's options depend on the
//! selections of every stage before it. Changing a stage resets everything
//! downstream and re-fetches; reaching a concrete value at the last stage
//! fetches the result payload.
//!
//! Consumers supply an `OptionSource` (the remote API) and a list of `Stage`s,
//! then drive a `Resolver` with `select` and `settle`.

pub mod cache;
pub mod controller;
pub mod error;
pub mod scripted;
pub mod selection;
pub mod sequencer;
pub mod source;
pub mod stage;

pub use cache::{CacheEntry, OptionCache};
pub use controller::{FailedAt, Resolver, ResolverState};
pub use error::ResolverError;
pub use scripted::{Gate, Request, ScriptedSource};
pub use selection::SelectionState;
pub use sequencer::{Completion, FetchSequencer, RequestToken, Slot};
pub use source::OptionSource;
pub use stage::{AutoSelect, Selection, Stage};

//! The remote capability a resolver fetches from.

use anyhow::Result;
use async_trait::async_trait;

/// Supplies option lists and the terminal result for a selector chain.
///
/// Implemented by the HTTP adapters and by `ScriptedSource` (tests).
#[async_trait]
pub trait OptionSource: Send + Sync + 'static {
    /// Whatever the terminal fetch returns. Opaque to the resolver.
    type Payload: Send + 'static;

    /// Options for `stage`, given the concrete selections of stages `0..stage`.
    async fn fetch_options(&self, stage: usize, prefix: &[String]) -> Result<Vec<String>>;

    /// The result for a fully resolved chain (one value per stage).
    async fn fetch_result(&self, selections: &[String]) -> Result<Self::Payload>;
}

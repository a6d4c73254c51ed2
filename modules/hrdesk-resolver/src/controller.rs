//! The resolver state machine.
//!
//! All mutation happens synchronously in `select` (user input) and `apply`
//! (a finished fetch), so there is one logical thread of control. The only
//! race is out-of-order fetch completion, handled by the `FetchSequencer`.

use std::sync::Arc;

use crate::cache::OptionCache;
use crate::error::ResolverError;
use crate::selection::SelectionState;
use crate::sequencer::{Completion, FetchSequencer};
use crate::source::OptionSource;
use crate::stage::{Selection, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedAt {
    Stage(usize),
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    /// Nothing in flight and the chain is not fully resolved.
    Idle,
    FetchingOptions(usize),
    FetchingResult,
    /// The result payload is present.
    Ready,
    Failed(FailedAt),
}

pub struct Resolver<S: OptionSource> {
    stages: Vec<Stage>,
    selections: SelectionState,
    cache: OptionCache,
    sequencer: FetchSequencer<S>,
    state: ResolverState,
    payload: Option<S::Payload>,
    last_error: Option<ResolverError>,
}

impl<S: OptionSource> Resolver<S> {
    pub fn new(stages: Vec<Stage>, source: Arc<S>) -> Result<Self, ResolverError> {
        if stages.len() < 2 {
            return Err(ResolverError::TooFewStages(stages.len()));
        }

        Ok(Self {
            selections: SelectionState::new(stages.len()),
            stages,
            cache: OptionCache::new(),
            sequencer: FetchSequencer::new(source),
            state: ResolverState::Idle,
            payload: None,
            last_error: None,
        })
    }

    // --- Accessors ---

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    pub fn selections(&self) -> &SelectionState {
        &self.selections
    }

    pub fn selection(&self, stage: usize) -> Option<&Selection> {
        self.selections.get(stage)
    }

    pub fn cache(&self) -> &OptionCache {
        &self.cache
    }

    pub fn source(&self) -> &Arc<S> {
        self.sequencer.source()
    }

    /// Options currently offered for `stage`: the cached list for the present
    /// prefix. Empty while the prefix is incomplete, before the list arrives,
    /// or after its fetch failed.
    pub fn options(&self, stage: usize) -> &[String] {
        if self.state == ResolverState::Failed(FailedAt::Stage(stage)) {
            return &[];
        }
        let Some(prefix) = self.selections.prefix(stage) else {
            return &[];
        };
        self.cache
            .get(stage, &prefix)
            .map(|entry| entry.options.as_slice())
            .unwrap_or(&[])
    }

    pub fn payload(&self) -> Option<&S::Payload> {
        self.payload.as_ref()
    }

    pub fn last_error(&self) -> Option<&ResolverError> {
        self.last_error.as_ref()
    }

    pub fn is_terminal_resolved(&self) -> bool {
        self.selections.is_terminal_resolved()
    }

    pub fn in_flight(&self) -> usize {
        self.sequencer.in_flight()
    }

    // --- Input ---

    /// Reset every stage and fetch the options of stage 0.
    pub fn start(&mut self) {
        self.selections.reset_from(0);
        self.payload = None;
        self.last_error = None;
        self.sequencer.invalidate_from(0);
        self.sequencer.issue_options(0, Vec::new());
        self.state = ResolverState::FetchingOptions(0);
    }

    /// Apply a user selection at `stage`.
    ///
    /// Returns `Ok(false)` without side effects if the stage already holds
    /// `selection`. Otherwise later stages are reset, the result payload is
    /// cleared, in-flight fetches for this stage and everything after it
    /// become stale and the next fetch is issued. A refetch of this stage's
    /// own options that lands later never replaces the user's choice.
    pub fn select(&mut self, stage: usize, selection: Selection) -> Result<bool, ResolverError> {
        let len = self.stages.len();
        let Some(current) = self.selections.get(stage) else {
            return Err(ResolverError::StageOutOfRange { stage, len });
        };
        if *current == selection {
            return Ok(false);
        }

        let allowed = self.options(stage).to_vec();
        self.selections.set(stage, selection, &allowed)?;

        tracing::debug!(
            stage,
            name = %self.stages[stage].name,
            selection = %self.stages[stage].label(&self.selections.values()[stage]),
            "Selection changed"
        );

        self.payload = None;
        self.last_error = None;
        self.sequencer.invalidate_from(stage);
        self.advance_from(stage);
        Ok(true)
    }

    /// Re-issue the fetch that put the resolver into `Failed`. No-op otherwise.
    pub fn retry(&mut self) -> bool {
        match self.state {
            ResolverState::Failed(FailedAt::Stage(stage)) => {
                let Some(prefix) = self.selections.prefix(stage) else {
                    return false;
                };
                self.last_error = None;
                let token = self.sequencer.issue_options(stage, prefix);
                tracing::info!(stage, token = %token, "Retrying options fetch");
                self.state = ResolverState::FetchingOptions(stage);
                true
            }
            ResolverState::Failed(FailedAt::Result) => {
                let Some(selections) = self.selections.prefix(self.stages.len()) else {
                    return false;
                };
                self.last_error = None;
                let token = self.sequencer.issue_result(selections);
                tracing::info!(token = %token, "Retrying result fetch");
                self.state = ResolverState::FetchingResult;
                true
            }
            _ => false,
        }
    }

    // --- Completions ---

    /// Apply a finished fetch. Returns false if it was stale and ignored.
    pub fn apply(&mut self, completion: Completion<S::Payload>) -> bool {
        if !self.sequencer.accept(&completion) {
            tracing::debug!(
                slot = ?completion.slot(),
                token = %completion.token(),
                "Discarding stale response"
            );
            return false;
        }

        match completion {
            Completion::Options {
                stage,
                prefix,
                result: Ok(options),
                ..
            } => self.on_options(stage, prefix, options),
            Completion::Options {
                stage,
                prefix,
                result: Err(err),
                ..
            } => {
                tracing::warn!(
                    stage,
                    name = %self.stages[stage].name,
                    ?prefix,
                    error = %format!("{err:#}"),
                    "Options fetch failed"
                );
                self.selections.reset_from(stage);
                self.last_error = Some(ResolverError::OptionsFetchFailed {
                    stage,
                    prefix,
                    message: format!("{err:#}"),
                });
                self.state = ResolverState::Failed(FailedAt::Stage(stage));
            }
            Completion::Result {
                result: Ok(payload),
                selections,
                ..
            } => {
                tracing::info!(?selections, "Result ready");
                self.payload = Some(payload);
                self.state = ResolverState::Ready;
            }
            Completion::Result {
                result: Err(err),
                selections,
                ..
            } => {
                tracing::warn!(?selections, error = %format!("{err:#}"), "Result fetch failed");
                self.payload = None;
                self.last_error = Some(ResolverError::ResultFetchFailed {
                    selections,
                    message: format!("{err:#}"),
                });
                self.state = ResolverState::Failed(FailedAt::Result);
            }
        }
        true
    }

    /// Wait for the next fetch and apply it. `None` when nothing is in flight,
    /// otherwise whether the completion was applied.
    pub async fn pump(&mut self) -> Option<bool> {
        let completion = self.sequencer.next_completion().await?;
        Some(self.apply(completion))
    }

    /// Pump until no fetch is in flight. Returns the number applied.
    pub async fn settle(&mut self) -> usize {
        let mut applied = 0;
        while let Some(was_applied) = self.pump().await {
            if was_applied {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next fetch without applying it.
    pub async fn next_completion(&mut self) -> Option<Completion<S::Payload>> {
        self.sequencer.next_completion().await
    }

    // --- Internals ---

    fn on_options(&mut self, stage: usize, prefix: Vec<String>, options: Vec<String>) {
        let default = self.stages[stage].auto_select.pick(&options);
        tracing::debug!(
            stage,
            name = %self.stages[stage].name,
            count = options.len(),
            default = %default,
            "Options resolved"
        );

        if let Err(err) = self.selections.set(stage, default.clone(), &options) {
            tracing::warn!(stage, error = %err, "Default selection rejected");
            self.selections.reset_from(stage);
        }
        self.cache.put(stage, prefix, options, default);
        self.last_error = None;
        self.advance_from(stage);
    }

    /// Issue whatever `stage`'s current selection implies next.
    fn advance_from(&mut self, stage: usize) {
        let next = stage + 1;

        match self.selections.prefix(next) {
            Some(prefix) if next < self.stages.len() => {
                self.sequencer.issue_options(next, prefix);
                self.state = ResolverState::FetchingOptions(next);
            }
            Some(selections) => {
                self.sequencer.issue_result(selections);
                self.state = ResolverState::FetchingResult;
            }
            None => self.state = ResolverState::Idle,
        }
    }
}

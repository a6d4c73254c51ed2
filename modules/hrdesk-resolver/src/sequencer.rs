//! Issues fetches and decides which responses are still wanted.
//!
//! Every fetch gets a token from one monotonically increasing counter and
//! becomes the latest token for its slot. A response is applied only if its
//! token is still the latest for that slot; anything older is inert.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::FutureExt;
use tokio::task::JoinSet;

use crate::source::OptionSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a fetch resolves: one stage's option list, or the terminal result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Options(usize),
    Result,
}

impl Slot {
    /// The result slot sits after every stage.
    fn is_at_or_after(self, stage: usize) -> bool {
        match self {
            Slot::Options(s) => s >= stage,
            Slot::Result => true,
        }
    }
}

/// A finished fetch, current or not.
#[derive(Debug)]
pub enum Completion<P> {
    Options {
        token: RequestToken,
        stage: usize,
        prefix: Vec<String>,
        result: Result<Vec<String>>,
    },
    Result {
        token: RequestToken,
        selections: Vec<String>,
        result: Result<P>,
    },
}

impl<P> Completion<P> {
    pub fn token(&self) -> RequestToken {
        match self {
            Completion::Options { token, .. } | Completion::Result { token, .. } => *token,
        }
    }

    pub fn slot(&self) -> Slot {
        match self {
            Completion::Options { stage, .. } => Slot::Options(*stage),
            Completion::Result { .. } => Slot::Result,
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            Completion::Options { result, .. } => result.is_ok(),
            Completion::Result { result, .. } => result.is_ok(),
        }
    }
}

pub struct FetchSequencer<S: OptionSource> {
    source: Arc<S>,
    last_token: u64,
    latest: HashMap<Slot, RequestToken>,
    tasks: JoinSet<Completion<S::Payload>>,
}

impl<S: OptionSource> FetchSequencer<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            last_token: 0,
            latest: HashMap::new(),
            tasks: JoinSet::new(),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    fn mint(&mut self, slot: Slot) -> RequestToken {
        self.last_token += 1;
        let token = RequestToken(self.last_token);
        if let Some(previous) = self.latest.insert(slot, token) {
            tracing::debug!(?slot, superseded = %previous, token = %token, "Superseding in-flight fetch");
        }
        token
    }

    /// Start fetching the options of `stage`. Must be called inside a tokio runtime.
    pub fn issue_options(&mut self, stage: usize, prefix: Vec<String>) -> RequestToken {
        let token = self.mint(Slot::Options(stage));
        tracing::debug!(stage, token = %token, ?prefix, "Fetching options");

        let source = Arc::clone(&self.source);
        self.tasks.spawn(async move {
            let result = guarded(source.fetch_options(stage, &prefix)).await;
            Completion::Options {
                token,
                stage,
                prefix,
                result,
            }
        });

        token
    }

    /// Start fetching the terminal result. Must be called inside a tokio runtime.
    pub fn issue_result(&mut self, selections: Vec<String>) -> RequestToken {
        let token = self.mint(Slot::Result);
        tracing::debug!(token = %token, ?selections, "Fetching result");

        let source = Arc::clone(&self.source);
        self.tasks.spawn(async move {
            let result = guarded(source.fetch_result(&selections)).await;
            Completion::Result {
                token,
                selections,
                result,
            }
        });

        token
    }

    /// Retire the pending token of every slot from `stage` onward (the result
    /// slot included) without issuing anything. Their responses become stale.
    pub fn invalidate_from(&mut self, stage: usize) {
        self.latest.retain(|slot, token| {
            let keep = !slot.is_at_or_after(stage);
            if !keep {
                tracing::debug!(?slot, token = %token, "Retiring in-flight fetch");
            }
            keep
        });
    }

    pub fn is_current(&self, completion: &Completion<S::Payload>) -> bool {
        self.latest.get(&completion.slot()) == Some(&completion.token())
    }

    /// True if `completion` answers the latest request for its slot. The slot
    /// is then no longer pending; a false return means the caller must drop it.
    pub fn accept(&mut self, completion: &Completion<S::Payload>) -> bool {
        if self.is_current(completion) {
            self.latest.remove(&completion.slot());
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self, slot: Slot) -> bool {
        self.latest.contains_key(&slot)
    }

    pub fn latest(&self, slot: Slot) -> Option<RequestToken> {
        self.latest.get(&slot).copied()
    }

    /// Spawned fetches not yet collected, stale ones included.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for the next fetch to finish, in completion order.
    /// Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion<S::Payload>> {
        loop {
            match self.tasks.join_next().await? {
                Ok(completion) => return Some(completion),
                Err(err) => tracing::warn!(error = %err, "Fetch task did not complete"),
            }
        }
    }
}

/// A panicking source becomes a failed fetch instead of a lost one.
async fn guarded<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("fetch task panicked")),
    }
}

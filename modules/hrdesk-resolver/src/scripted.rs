//! In-memory `OptionSource` for tests.
//!
//! Responses are scripted per request, individual requests can be held back
//! to force out-of-order completion, and every call is logged for assertions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::source::OptionSource;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Request {
    Options { stage: usize, prefix: Vec<String> },
    Result { selections: Vec<String> },
}

impl Request {
    pub fn options(stage: usize, prefix: &[&str]) -> Self {
        Request::Options {
            stage,
            prefix: owned(prefix),
        }
    }

    pub fn result(selections: &[&str]) -> Self {
        Request::Result {
            selections: owned(selections),
        }
    }
}

#[derive(Debug, Clone)]
enum Reply<T> {
    Ok(T),
    Fail(String),
}

/// Holds one request until released. Releasing before the request arrives
/// lets it through immediately.
#[derive(Debug, Clone)]
pub struct Gate {
    notify: Arc<Notify>,
}

impl Gate {
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

pub struct ScriptedSource<P> {
    options: Mutex<HashMap<(usize, Vec<String>), Reply<Vec<String>>>>,
    results: Mutex<HashMap<Vec<String>, Reply<P>>>,
    gates: Mutex<HashMap<Request, Arc<Notify>>>,
    calls: Mutex<Vec<Request>>,
}

impl<P> Default for ScriptedSource<P> {
    fn default() -> Self {
        Self {
            options: Mutex::new(HashMap::new()),
            results: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl<P: Clone> ScriptedSource<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(self, stage: usize, prefix: &[&str], options: &[&str]) -> Self {
        self.set_options(stage, prefix, options);
        self
    }

    pub fn with_result(self, selections: &[&str], payload: P) -> Self {
        self.set_result(selections, payload);
        self
    }

    pub fn set_options(&self, stage: usize, prefix: &[&str], options: &[&str]) {
        lock(&self.options).insert((stage, owned(prefix)), Reply::Ok(owned(options)));
    }

    pub fn fail_options(&self, stage: usize, prefix: &[&str], message: &str) {
        lock(&self.options).insert((stage, owned(prefix)), Reply::Fail(message.to_string()));
    }

    pub fn set_result(&self, selections: &[&str], payload: P) {
        lock(&self.results).insert(owned(selections), Reply::Ok(payload));
    }

    pub fn fail_result(&self, selections: &[&str], message: &str) {
        lock(&self.results).insert(owned(selections), Reply::Fail(message.to_string()));
    }

    /// Hold the next call matching `request` until the gate is released.
    pub fn hold(&self, request: Request) -> Gate {
        let notify = Arc::new(Notify::new());
        lock(&self.gates).insert(request, Arc::clone(&notify));
        Gate { notify }
    }

    pub fn calls(&self) -> Vec<Request> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, request: &Request) -> usize {
        lock(&self.calls).iter().filter(|c| *c == request).count()
    }

    async fn arrive(&self, request: Request) {
        lock(&self.calls).push(request.clone());
        let gate = lock(&self.gates).remove(&request);
        if let Some(notify) = gate {
            notify.notified().await;
        }
    }
}

#[async_trait]
impl<P> OptionSource for ScriptedSource<P>
where
    P: Clone + Send + Sync + 'static,
{
    type Payload = P;

    async fn fetch_options(&self, stage: usize, prefix: &[String]) -> Result<Vec<String>> {
        self.arrive(Request::Options {
            stage,
            prefix: prefix.to_vec(),
        })
        .await;

        let reply = lock(&self.options).get(&(stage, prefix.to_vec())).cloned();
        match reply {
            Some(Reply::Ok(options)) => Ok(options),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted options for stage {stage} prefix {prefix:?}")),
        }
    }

    async fn fetch_result(&self, selections: &[String]) -> Result<P> {
        self.arrive(Request::Result {
            selections: selections.to_vec(),
        })
        .await;

        let reply = lock(&self.results).get(selections).cloned();
        match reply {
            Some(Reply::Ok(payload)) => Ok(payload),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted result for {selections:?}")),
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

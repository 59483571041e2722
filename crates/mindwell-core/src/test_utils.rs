//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ai::{ChatTransport, CompletionRequest};
use crate::error::CompletionError;

type Outcome = Result<String, CompletionError>;

/// Replays queued outcomes in order, then repeats `fallback` forever.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Outcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Err(CompletionError::Unknown("script exhausted".into())),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(outcome: Outcome) -> Self {
        Self {
            fallback: outcome,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send(&self, _api_key: &str, request: &CompletionRequest) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

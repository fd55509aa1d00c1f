//! Scripted transport for controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::SyncError;

use super::core::Transport;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Clone)]
enum Reply {
    Json(Value),
    Unreachable,
}

/// Answers each path from a per-path queue, falling back to a sticky reply.
/// Unscripted paths fail with a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    once: Mutex<HashMap<String, VecDeque<Reply>>>,
    sticky: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `value` every time `path` is hit.
    pub fn respond(&self, path: &str, value: Value) {
        self.sticky
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Json(value));
    }

    /// Reply with `value` the next time `path` is hit, ahead of any sticky reply.
    pub fn respond_once(&self, path: &str, value: Value) {
        self.once
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Reply::Json(value));
    }

    pub fn unreachable(&self, path: &str) {
        self.sticky
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Unreachable);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn answer(&self, method: &'static str, path: &str, body: Option<Value>) -> Result<Value, SyncError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
        });

        let queued = self
            .once
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front());
        let reply = queued.or_else(|| self.sticky.lock().unwrap().get(path).cloned());

        match reply {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Unreachable) => {
                Err(SyncError::Transport(format!("{path}: connection refused")))
            }
            None => Err(SyncError::Transport(format!("{path}: no scripted reply"))),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get_json(&self, path: &str) -> Result<Value, SyncError> {
        self.answer("GET", path, None)
    }

    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value, SyncError> {
        self.answer("POST", path, body)
    }
}

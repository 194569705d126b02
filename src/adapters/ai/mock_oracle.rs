//! Mock oracle for tests and local runs.
//!
//! Replies are scripted in order; once the script runs out the oracle
//! answers with its default sentence. Requests are recorded so tests can
//! assert on prompts and history replay.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::ports::{AiOracle, OracleError, OracleRequest};

/// Scripted AiOracle implementation.
pub struct MockOracle {
    script: Mutex<VecDeque<Result<String, OracleError>>>,
    default_reply: String,
    requests: Mutex<Vec<OracleRequest>>,
}

impl MockOracle {
    /// Creates a mock that always answers with `default_reply`.
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: default_reply.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues a scripted success.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.script
            .lock()
            .expect("mock script poisoned")
            .push_back(Ok(reply.into()));
    }

    /// Queues a scripted failure.
    pub fn push_error(&self, error: OracleError) {
        self.script
            .lock()
            .expect("mock script poisoned")
            .push_back(Err(error));
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().expect("mock requests poisoned").clone()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new("Certainly - how can I help?")
    }
}

#[async_trait]
impl AiOracle for MockOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        self.requests
            .lock()
            .expect("mock requests poisoned")
            .push(request);

        self.script
            .lock()
            .expect("mock script poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(self.default_reply.clone()))
    }
}

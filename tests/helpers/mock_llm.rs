//! Scripted language model

use std::collections::VecDeque;
use std::sync::Mutex;
use async_trait::async_trait;
use CampusFlow::models::ChatTurn;
use CampusFlow::services::CompletionClient;
use CampusFlow::utils::errors::{UpstreamError, UpstreamResult};

/// One completion request as the client saw it
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub history: Vec<ChatTurn>,
    pub message: String,
}

/// Completion client that answers from a queue of canned results
///
/// Once the queue is empty every call fails like an unreachable provider.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<UpstreamResult<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: UpstreamError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, system: &str, history: &[ChatTurn], message: &str) -> UpstreamResult<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.to_string(),
            history: history.to_vec(),
            message: message.to_string(),
        });

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UpstreamError::RequestFailed("connection refused".to_string())))
    }
}

//! In-memory answering service for testing and offline runs

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::qa::QaRequest;
use crate::traits::AnsweringService;
use crate::types::*;

/// Answers every question with a fixed reply and records what it was asked
#[derive(Debug, Clone)]
pub struct ScriptedAnsweringService {
    reply: Result<String, String>,
    requests: Arc<RwLock<Vec<QaRequest>>>,
}

impl ScriptedAnsweringService {
    /// A service that always answers with `answer`
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            reply: Ok(answer.into()),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// A service that always fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<QaRequest> {
        match self.requests.read() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Forget recorded requests
    pub fn clear(&self) {
        match self.requests.write() {
            Ok(mut requests) => requests.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Default for ScriptedAnsweringService {
    fn default() -> Self {
        Self::new("I cannot tell from the reconciliation data.")
    }
}

#[async_trait]
impl AnsweringService for ScriptedAnsweringService {
    async fn answer(&self, request: &QaRequest) -> ReconResult<String> {
        self.requests
            .write()
            .map_err(|_| ReconError::Answering("request log is poisoned".to_string()))?
            .push(request.clone());

        self.reply.clone().map_err(ReconError::Answering)
    }
}

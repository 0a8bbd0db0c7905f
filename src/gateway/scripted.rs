//! In-process gateway for unit tests.

use super::{Gateway, GatewayResponse, GenerationRequest, Usage};
use crate::error::GatewayError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = dyn Fn(&GenerationRequest) -> Result<Value, GatewayError> + Send + Sync;

/// Answers each request with a closure and records every request it saw
pub struct ScriptedGateway {
    responder: Box<Responder>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGateway {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<Value, GatewayError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replay answers in order; fails with a transport error once exhausted
    pub fn queue(answers: Vec<Result<Value, GatewayError>>) -> Self {
        let answers = Mutex::new(VecDeque::from(answers));
        Self::new(move |_| {
            answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Transport("script exhausted".to_string())))
        })
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn steps(&self) -> Vec<&'static str> {
        self.requests.lock().unwrap().iter().map(|r| r.step).collect()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn generate(&self, request: GenerationRequest) -> Result<GatewayResponse, GatewayError> {
        let result = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        result.map(|data| GatewayResponse {
            data,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
            },
        })
    }
}

//! Scripted transport for deterministic offline tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::ClientError;
use crate::transport::{HttpResponse, Transport};

/// Replays a fixed list of outcomes and records every requested URL.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, ClientError>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    /// Create a transport that returns `responses` in order.
    pub fn new(responses: Vec<Result<HttpResponse, ClientError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// URLs requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        self.requests.lock().unwrap().push(url.to_owned());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("script exhausted".to_owned())))
    }
}

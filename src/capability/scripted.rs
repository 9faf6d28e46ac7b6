//! Scripted capability for deterministic tests and offline runs.
//!
//! Replays a queue of canned replies in order and records every request so
//! tests can assert on prompts and call counts.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::capability::traits::{Completion, CompletionRequest};
use crate::error::{Result, TriageError};

/// One canned capability reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    Text(String),
    Unavailable,
    Error(String),
}

impl ScriptedReply {
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedReply::Text(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        ScriptedReply::Error(message.into())
    }
}

/// Capability that replays scripted replies.
///
/// With `repeat` set the last reply is reused once the queue runs dry;
/// otherwise an exhausted script is a capability error.
#[derive(Debug, Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    repeat: Option<ScriptedReply>,
}

impl ScriptedCompletion {
    /// Replay the given replies in order.
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            repeat: None,
        }
    }

    /// Answer every call with the same text.
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            repeat: Some(ScriptedReply::Text(text.into())),
            ..Default::default()
        }
    }

    /// Fail every call with a capability error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            repeat: Some(ScriptedReply::Error(message.into())),
            ..Default::default()
        }
    }

    /// Report every call as unavailable.
    pub fn unavailable() -> Self {
        Self {
            repeat: Some(ScriptedReply::Unavailable),
            ..Default::default()
        }
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Copies of every request received, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        let queued = self
            .replies
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        queued.or_else(|| self.repeat.clone())
    }
}

impl Completion for ScriptedCompletion {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match self.next_reply() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Unavailable) => Err(TriageError::CapabilityUnavailable),
            Some(ScriptedReply::Error(message)) => Err(TriageError::capability(message)),
            None => Err(TriageError::capability("scripted replies exhausted")),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        !matches!(self.repeat, Some(ScriptedReply::Unavailable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> CompletionRequest {
        CompletionRequest::new("sys", "user")
    }

    #[test]
    fn test_replays_in_order_then_exhausts() {
        let cap = ScriptedCompletion::new(vec![
            ScriptedReply::text("first"),
            ScriptedReply::error("boom"),
        ]);

        assert_eq!(cap.complete(&req()).unwrap(), "first");
        assert!(matches!(
            cap.complete(&req()),
            Err(TriageError::Capability { .. })
        ));
        let err = cap.complete(&req()).unwrap_err();
        assert!(err.to_string().contains("exhausted"));
        assert_eq!(cap.call_count(), 3);
    }

    #[test]
    fn test_always_repeats() {
        let cap = ScriptedCompletion::always("ДА");
        for _ in 0..3 {
            assert_eq!(cap.complete(&req()).unwrap(), "ДА");
        }
    }

    #[test]
    fn test_unavailable() {
        let cap = ScriptedCompletion::unavailable();
        assert!(!cap.is_available());
        assert!(matches!(
            cap.complete(&req()),
            Err(TriageError::CapabilityUnavailable)
        ));
    }

    #[test]
    fn test_records_requests() {
        let cap = ScriptedCompletion::failing("down");
        let _ = cap.complete(&CompletionRequest::new("a", "b").temperature(0.1));
        let requests = cap.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_prompt, "b");
    }
}

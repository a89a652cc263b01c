//! Test doubles for session tests

use async_trait::async_trait;
use ncuacg_chat_backend::{BackendError, BackendResult, ChatBackend, ChatReply, ChatRequest};
use ncuacg_chat_core::storage::KeyValueStore;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

pub(crate) enum Step {
    Ready(BackendResult<ChatReply>),
    Wait(oneshot::Receiver<BackendResult<ChatReply>>),
}

impl Step {
    pub(crate) fn reply(reply: ChatReply) -> Self {
        Step::Ready(Ok(reply))
    }

    pub(crate) fn fail(err: BackendError) -> Self {
        Step::Ready(Err(err))
    }
}

/// Answers each request with the next queued step
pub(crate) struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A backend whose single reply is held until the sender fires
    pub(crate) fn gated() -> (Arc<Self>, oneshot::Sender<BackendResult<ChatReply>>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(vec![Step::Wait(rx)]), tx)
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Yield until `count` requests have reached the backend
    pub(crate) async fn wait_for_requests(&self, count: usize) {
        for _ in 0..1000 {
            if self.request_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!(
            "expected {} requests, saw {}",
            count,
            self.request_count()
        );
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send(&self, request: ChatRequest) -> BackendResult<ChatReply> {
        self.requests.lock().push(request);
        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Ready(result)) => result,
            Some(Step::Wait(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(BackendError::Config("script sender dropped".into()))),
            None => Err(BackendError::Config("script exhausted".into())),
        }
    }
}

/// A store whose every operation fails, like an unwritable state directory
pub(crate) struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> ncuacg_chat_core::Result<Option<String>> {
        Err(ncuacg_chat_core::Error::storage(key, "permission denied"))
    }

    fn set(&self, key: &str, _value: &str) -> ncuacg_chat_core::Result<()> {
        Err(ncuacg_chat_core::Error::storage(key, "permission denied"))
    }

    fn remove(&self, key: &str) -> ncuacg_chat_core::Result<()> {
        Err(ncuacg_chat_core::Error::storage(key, "permission denied"))
    }

    fn clear(&self) -> ncuacg_chat_core::Result<()> {
        Err(ncuacg_chat_core::Error::storage("*", "permission denied"))
    }
}

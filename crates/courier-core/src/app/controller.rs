//! Controller - request の送信と response の待ち合わせ
//!
//! # フロー
//! 1. `IdGenerator` で in-flight 中に重複しない id を払い出す
//! 2. pending map に oneshot を登録してから worker に送信
//! 3. router タスクが response を受信し、`id` で oneshot に振り分ける
//!
//! response の到着順は送信順と一致しないことがあるため、
//! 対応付けは `id` のみに依存します。timeout と cancel はありません。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::channel::ControllerEndpoint;
use crate::domain::{
    CallbackError, CallbackId, CallbackMessage, CallbackName, CallbackObject, Response,
};
use crate::ports::{IdGenerator, SequentialIdGenerator};
use crate::typed::{Callback, CodecError, codec};

type PendingMap = Arc<Mutex<HashMap<CallbackId, oneshot::Sender<Response>>>>;

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("callback id {0} is already in flight")]
    DuplicateId(CallbackId),

    #[error("worker channel closed")]
    ChannelClosed,

    #[error("callback failed: {0}")]
    Remote(#[from] CallbackError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub struct Controller {
    requests: mpsc::Sender<CallbackMessage>,
    pending: PendingMap,
    ids: Box<dyn IdGenerator>,
}

/// A sent request awaiting its response.
#[derive(Debug)]
#[must_use = "a pending call does nothing unless awaited"]
pub struct PendingCall {
    id: CallbackId,
    rx: oneshot::Receiver<Response>,
}

impl PendingCall {
    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Wait for the response. Resolves with `ChannelClosed` if the worker
    /// goes away first.
    pub async fn wait(self) -> Result<Response, CallError> {
        self.rx.await.map_err(|_| CallError::ChannelClosed)
    }
}

impl Controller {
    /// Start routing responses from `endpoint`. Ids are allocated from 1.
    pub fn spawn(endpoint: ControllerEndpoint) -> Self {
        Self::with_id_generator(endpoint, SequentialIdGenerator::new())
    }

    pub fn with_id_generator(
        endpoint: ControllerEndpoint,
        ids: impl IdGenerator + 'static,
    ) -> Self {
        let ControllerEndpoint {
            requests,
            responses,
        } = endpoint;
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        tokio::spawn(route_responses(responses, Arc::clone(&pending)));
        Self {
            requests,
            pending,
            ids: Box::new(ids),
        }
    }

    /// Allocate a fresh id for a hand-built `CallbackMessage`.
    pub fn next_id(&self) -> CallbackId {
        self.ids.next_id()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Send a request. Its id must not collide with an outstanding request.
    ///
    /// The id is registered only once channel capacity is secured, so
    /// dropping this future while it waits leaves nothing behind.
    pub async fn send(&self, msg: CallbackMessage) -> Result<PendingCall, CallError> {
        let id = msg.id;
        if lock(&self.pending).contains_key(&id) {
            return Err(CallError::DuplicateId(id));
        }

        let permit = self
            .requests
            .reserve()
            .await
            .map_err(|_| CallError::ChannelClosed)?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = lock(&self.pending);
            // checked again: another send may have taken the id while we waited
            if pending.contains_key(&id) {
                return Err(CallError::DuplicateId(id));
            }
            pending.insert(id, tx);
        }

        debug!(%id, callback = %msg.callback, "sending callback");
        permit.send(msg);

        Ok(PendingCall { id, rx })
    }

    /// Invoke `callback(message)` on the worker and wait for the result.
    pub async fn call_raw(
        &self,
        callback: impl Into<CallbackName>,
        message: Value,
    ) -> Result<Value, CallError> {
        let msg = CallbackMessage::new(self.next_id(), callback, message);
        let response = self.send(msg).await?.wait().await?;
        Ok(response.into_result()?)
    }

    /// Typed variant of [`Controller::call_raw`].
    pub async fn call<C>(&self, input: C::Input) -> Result<C::Output, CallError>
    where
        C: Callback,
        C::Input: Serialize,
        C::Output: DeserializeOwned,
    {
        let message = codec::encode_payload(&input)?;
        let result = self.call_raw(C::NAME, message).await?;
        Ok(codec::decode_payload(result)?)
    }
}

async fn route_responses(mut responses: mpsc::Receiver<Response>, pending: PendingMap) {
    while let Some(response) = responses.recv().await {
        let id = response.id();
        let waiter = lock(&pending).remove(&id);
        match waiter {
            Some(tx) => {
                if tx.send(response).is_err() {
                    debug!(%id, "caller stopped waiting; response dropped");
                }
            }
            None => {
                warn!(%id, callback = %response.callback(), "response for unknown id dropped");
            }
        }
    }

    // worker is gone: dropping the senders wakes every waiter with ChannelClosed
    let orphaned = lock(&pending).drain().count();
    if orphaned > 0 {
        warn!(orphaned, "worker channel closed with calls in flight");
    }
}

fn lock(pending: &PendingMap) -> MutexGuard<'_, HashMap<CallbackId, oneshot::Sender<Response>>> {
    // the map stays consistent even if a holder panicked
    pending.lock().unwrap_or_else(|e| e.into_inner())
}

//! The single bidirectional channel between a controller and a worker.
//!
//! Built from two bounded mpsc queues, one per direction. Messages are moved
//! across, never shared.

use tokio::sync::mpsc;

use crate::domain::{CallbackMessage, Response};

/// Controller side: sends requests, receives responses.
pub struct ControllerEndpoint {
    pub(crate) requests: mpsc::Sender<CallbackMessage>,
    pub(crate) responses: mpsc::Receiver<Response>,
}

/// Worker side: receives requests, sends responses.
pub struct WorkerEndpoint {
    pub(crate) requests: mpsc::Receiver<CallbackMessage>,
    pub(crate) responses: mpsc::Sender<Response>,
}

/// Create a connected pair. `capacity` bounds each direction and must be > 0.
pub fn channel(capacity: usize) -> (ControllerEndpoint, WorkerEndpoint) {
    let (req_tx, req_rx) = mpsc::channel(capacity);
    let (resp_tx, resp_rx) = mpsc::channel(capacity);
    (
        ControllerEndpoint::new(req_tx, resp_rx),
        WorkerEndpoint::new(req_rx, resp_tx),
    )
}

impl ControllerEndpoint {
    pub fn new(
        requests: mpsc::Sender<CallbackMessage>,
        responses: mpsc::Receiver<Response>,
    ) -> Self {
        Self {
            requests,
            responses,
        }
    }

    pub fn into_parts(self) -> (mpsc::Sender<CallbackMessage>, mpsc::Receiver<Response>) {
        (self.requests, self.responses)
    }
}

impl WorkerEndpoint {
    /// Wrap externally fed queues, e.g. a process transport reading stdin.
    pub fn new(
        requests: mpsc::Receiver<CallbackMessage>,
        responses: mpsc::Sender<Response>,
    ) -> Self {
        Self {
            requests,
            responses,
        }
    }

    pub fn into_parts(self) -> (mpsc::Receiver<CallbackMessage>, mpsc::Sender<Response>) {
        (self.requests, self.responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CallbackId, CallbackObject};
    use serde_json::json;

    #[tokio::test]
    async fn messages_flow_both_ways() {
        let (controller, worker) = channel(4);
        let (req_tx, mut resp_rx) = controller.into_parts();
        let (mut req_rx, resp_tx) = worker.into_parts();

        req_tx
            .send(CallbackMessage::new(CallbackId::new(1), "echo", json!("hi")))
            .await
            .unwrap();
        let req = req_rx.recv().await.unwrap();
        assert_eq!(req.id, CallbackId::new(1));

        resp_tx
            .send(Response::success(req.id, req.callback, req.message))
            .await
            .unwrap();
        let resp = resp_rx.recv().await.unwrap();
        assert_eq!(resp.id(), CallbackId::new(1));
        assert_eq!(resp.into_result().unwrap(), json!("hi"));
    }
}

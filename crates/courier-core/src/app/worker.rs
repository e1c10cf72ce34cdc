use std::any::Any;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::channel::WorkerEndpoint;
use crate::domain::{CallbackError, CallbackMessage, Response};
use crate::observability::{WorkerStats, WorkerStatsSnapshot};
use crate::typed::CallbackRegistry;

/// Worker executes named callbacks on behalf of a controller.
///
/// Every received `CallbackMessage` yields exactly one `Response` with the
/// same id. Failures (including panics) are captured as data and never
/// escape into the worker's own execution context.
pub struct Worker {
    registry: Arc<CallbackRegistry>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    pub fn new(registry: Arc<CallbackRegistry>) -> Self {
        Self {
            registry,
            stats: Arc::new(WorkerStats::new()),
        }
    }

    pub fn stats(&self) -> WorkerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Handle one request.
    pub async fn on_receive(&self, msg: CallbackMessage) -> Response {
        self.stats.record_received();
        let CallbackMessage {
            id,
            callback,
            message,
        } = msg;
        debug!(%id, %callback, "callback received");

        match self.invoke(callback.as_str(), message).await {
            Ok(result) => {
                self.stats.record_succeeded();
                debug!(%id, %callback, "callback succeeded");
                Response::success(id, callback, result)
            }
            Err(error) => {
                self.stats.record_failed();
                debug!(%id, %callback, kind = %error.kind, error = %error.message, "callback failed");
                Response::failure(id, callback, error)
            }
        }
    }

    async fn invoke(&self, name: &str, input: Value) -> Result<Value, CallbackError> {
        let handler = self
            .registry
            .get(name)
            .ok_or_else(|| CallbackError::not_registered(name))?;

        // separate task so a panicking callback only takes down itself
        let joined = tokio::spawn(async move { handler.call_dyn(input).await }).await;
        match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                let reason = panic_message(e.into_panic());
                warn!(callback = name, %reason, "callback panicked");
                Err(CallbackError::panicked(reason))
            }
            Err(e) => Err(CallbackError::invocation(e.to_string())),
        }
    }

    /// Run the receive loop on a tokio task.
    ///
    /// Each request is handled on its own task, so responses may be sent in a
    /// different order than the requests arrived. The loop ends when the
    /// request side of the channel closes or shutdown is requested; requests
    /// already accepted are answered before it returns.
    ///
    /// Dropping the returned handle also stops the loop.
    pub fn spawn(self, endpoint: WorkerEndpoint) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::clone(&self.stats);
        let join = tokio::spawn(run_loop(Arc::new(self), endpoint, shutdown_rx));
        WorkerHandle {
            shutdown_tx,
            join,
            stats,
        }
    }
}

/// Handle to a spawned worker loop.
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
    stats: Arc<WorkerStats>,
}

impl WorkerHandle {
    pub fn stats(&self) -> WorkerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop accepting new requests. In-flight callbacks still complete and
    /// their responses are still sent.
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        self.join().await;
    }

    /// Wait for the loop to end on its own (request channel closed).
    pub async fn join(self) {
        let Self {
            shutdown_tx, join, ..
        } = self;
        if let Err(e) = join.await {
            warn!(error = %e, "worker loop terminated abnormally");
        }
        drop(shutdown_tx);
    }
}

async fn run_loop(
    worker: Arc<Worker>,
    endpoint: WorkerEndpoint,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let WorkerEndpoint {
        mut requests,
        responses,
    } = endpoint;
    let mut in_flight = JoinSet::new();

    info!(callbacks = ?worker.registry.registered_names(), "worker started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    // handle dropped
                    break;
                }
            }
            msg = requests.recv() => {
                let Some(msg) = msg else {
                    debug!("request channel closed");
                    break;
                };
                let worker = Arc::clone(&worker);
                let responses = responses.clone();
                in_flight.spawn(async move {
                    let response = worker.on_receive(msg).await;
                    if responses.send(response).await.is_err() {
                        debug!("controller gone; response dropped");
                    }
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "response task failed");
                }
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "response task failed");
        }
    }

    let stats = worker.stats.snapshot();
    info!(
        received = stats.received,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "worker stopped"
    );
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "callback panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::channel::channel;
    use crate::domain::{CallbackId, CallbackObject, ErrorKind};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn registry() -> CallbackRegistry {
        let mut reg = CallbackRegistry::new();
        reg.register_fn("double", |n: i64| async move { Ok::<_, CallbackError>(n * 2) })
            .unwrap();
        reg.register_fn("fail", |reason: String| async move {
            Err::<Value, _>(CallbackError::invocation(reason))
        })
        .unwrap();
        reg.register_fn("boom", |_: Value| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<Value, CallbackError>(Value::Null)
        })
        .unwrap();
        reg
    }

    fn worker() -> Worker {
        Worker::new(Arc::new(registry()))
    }

    fn request(id: u64, callback: &str, message: Value) -> CallbackMessage {
        CallbackMessage::new(CallbackId::new(id), callback, message)
    }

    #[tokio::test]
    async fn success_produces_result_with_same_id() {
        let w = worker();
        let response = w.on_receive(request(7, "double", json!(21))).await;

        assert_eq!(
            response,
            Response::success(CallbackId::new(7), "double", json!(42))
        );
    }

    #[tokio::test]
    async fn failure_preserves_error_detail() {
        let w = worker();
        let response = w.on_receive(request(8, "fail", json!("disk full"))).await;

        assert_eq!(response.id(), CallbackId::new(8));
        assert_eq!(response.callback().as_str(), "fail");
        assert_eq!(
            response.into_result().unwrap_err(),
            CallbackError::invocation("disk full")
        );
    }

    #[tokio::test]
    async fn unknown_callback_is_reported_not_dropped() {
        let w = worker();
        let response = w.on_receive(request(9, "nope", json!(null))).await;

        assert_eq!(response.id(), CallbackId::new(9));
        let err = response.into_result().unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotRegistered);
    }

    #[tokio::test]
    async fn bad_input_is_reported() {
        let w = worker();
        let response = w.on_receive(request(10, "double", json!("twenty"))).await;
        assert_eq!(response.into_result().unwrap_err().kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn panic_is_captured_and_worker_survives() {
        let w = worker();

        let response = w.on_receive(request(11, "boom", json!(null))).await;
        let err = response.into_result().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Panicked);
        assert_eq!(err.message, "kaboom");

        let response = w.on_receive(request(12, "double", json!(1))).await;
        assert!(response.is_success());

        let stats = w.stats();
        assert_eq!(stats.received, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn no_memoization_across_ids() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut reg = CallbackRegistry::new();
        let counter = Arc::clone(&calls);
        reg.register_fn("count", move |_: Value| {
            let counter = Arc::clone(&counter);
            async move { Ok::<_, CallbackError>(counter.fetch_add(1, Ordering::SeqCst) + 1) }
        })
        .unwrap();
        let w = Worker::new(Arc::new(reg));

        let first = w.on_receive(request(1, "count", json!(null))).await;
        let second = w.on_receive(request(2, "count", json!(null))).await;

        assert_eq!(first.into_result().unwrap(), json!(1));
        assert_eq!(second.into_result().unwrap(), json!(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn spawned_worker_answers_out_of_order() {
        let gate = Arc::new(Notify::new());
        let mut reg = registry();
        let waiter = Arc::clone(&gate);
        reg.register_fn("slow", move |v: Value| {
            let waiter = Arc::clone(&waiter);
            async move {
                waiter.notified().await;
                Ok::<_, CallbackError>(v)
            }
        })
        .unwrap();

        let (controller_end, worker_end) = channel(8);
        let handle = Worker::new(Arc::new(reg)).spawn(worker_end);
        let (req_tx, mut resp_rx) = controller_end.into_parts();

        req_tx.send(request(1, "slow", json!("late"))).await.unwrap();
        req_tx.send(request(2, "double", json!(5))).await.unwrap();

        let first = resp_rx.recv().await.unwrap();
        assert_eq!(first.id(), CallbackId::new(2));
        assert_eq!(first.into_result().unwrap(), json!(10));

        gate.notify_one();
        let second = resp_rx.recv().await.unwrap();
        assert_eq!(second.id(), CallbackId::new(1));
        assert_eq!(second.into_result().unwrap(), json!("late"));

        drop(req_tx);
        handle.join().await;
    }

    #[tokio::test]
    async fn shutdown_drains_in_flight_requests() {
        let (controller_end, worker_end) = channel(8);
        let handle = worker().spawn(worker_end);
        let (req_tx, mut resp_rx) = controller_end.into_parts();

        req_tx.send(request(1, "double", json!(2))).await.unwrap();
        let response = resp_rx.recv().await.unwrap();
        assert!(response.is_success());

        assert_eq!(handle.stats().received, 1);
        handle.shutdown_and_join().await;

        // loop has exited and dropped its side of the channel
        assert!(resp_rx.recv().await.is_none());
    }
}

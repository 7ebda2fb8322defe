//! IngestionOrchestrator: gateway -> queue -> classifier -> store

use std::sync::Arc;
use std::time::Duration;

use async_channel::{bounded, Receiver, Sender};
use classifier::RoadClassifier;
use contracts::{
    ClassifiedRecord, IngestionConfig, MessageCallback, MessageGateway, PersistenceGateway,
    RawMessage,
};
use observability::MetricsSummary;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};
use crate::handler::{MessageHandler, MessageOutcome};
use crate::queue::{enqueue_blocking, enqueue_message};

/// Default bound on waiting for a worker to drain during `stop()`
const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

struct RunningPipeline<P> {
    raw_tx: Sender<RawMessage>,
    classify_task: JoinHandle<MessageHandler>,
    persist_task: JoinHandle<P>,
}

/// Workers that outlived the drain timeout, kept so their components can be
/// reclaimed once they finish
struct StalledWorkers<P> {
    classify: Option<JoinHandle<MessageHandler>>,
    persist: Option<JoinHandle<P>>,
}

impl<P> Default for StalledWorkers<P> {
    fn default() -> Self {
        Self {
            classify: None,
            persist: None,
        }
    }
}

/// Wires a message gateway to the classifier and a persistence gateway
///
/// Two workers run while started:
/// - classify: drains the raw queue, owns the classifier
/// - persist: drains the record queue, owns the store
///
/// Both components are handed back on `stop()`, so the orchestrator can be
/// restarted without losing window state. A worker that is still draining
/// when the timeout expires keeps its component until it finishes; `start()`
/// picks it up if it has, `shutdown()` waits for it.
pub struct IngestionOrchestrator<G, P>
where
    G: MessageGateway,
    P: PersistenceGateway + Send + 'static,
{
    gateway: G,
    store: Option<P>,
    handler: Option<MessageHandler>,
    config: IngestionConfig,
    metrics: Arc<IngestionMetrics>,
    drain_timeout: Duration,
    running: Option<RunningPipeline<P>>,
    stalled: StalledWorkers<P>,
}

impl<G, P> IngestionOrchestrator<G, P>
where
    G: MessageGateway,
    P: PersistenceGateway + Send + 'static,
{
    pub fn new(gateway: G, store: P, classifier: RoadClassifier, config: IngestionConfig) -> Self {
        let metrics = Arc::new(IngestionMetrics::new());
        Self {
            gateway,
            store: Some(store),
            handler: Some(MessageHandler::new(classifier, metrics.clone())),
            config,
            metrics,
            drain_timeout: WORKER_SHUTDOWN_TIMEOUT,
            running: None,
            stalled: StalledWorkers::default(),
        }
    }

    /// Override how long `stop()` waits for each worker to drain
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Connect the gateway if needed and begin delivery
    ///
    /// Calling `start()` on a running orchestrator is a no-op.
    ///
    /// # Errors
    /// - `IngestionError::Transport` when the gateway cannot connect or start
    /// - `IngestionError::ComponentLost` when a worker from the previous run
    ///   has not finished draining, or panicked
    #[instrument(name = "orchestrator_start", skip(self), fields(gateway = %self.gateway.name()))]
    pub async fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            debug!("orchestrator already running");
            return Ok(());
        }

        self.reclaim_stalled(false).await;
        let components_ready = self.handler.is_some() && self.store.is_some();
        if !components_ready {
            return Err(IngestionError::ComponentLost {
                component: if self.handler.is_none() {
                    "classifier"
                } else {
                    "store"
                },
            });
        }

        if !self.gateway.is_connected() {
            let gateway = &mut self.gateway;
            off_executor(|| gateway.connect())?;
        }

        let (Some(handler), Some(store)) = (self.handler.take(), self.store.take()) else {
            return Err(IngestionError::ComponentLost {
                component: "classifier",
            });
        };

        let (raw_tx, raw_rx) = bounded(self.config.queue_capacity);
        let (record_tx, record_rx) = mpsc::channel(self.config.record_queue_capacity);

        let classify_task = tokio::spawn(classify_worker(
            handler,
            raw_rx.clone(),
            record_tx,
            self.metrics.clone(),
        ));
        let persist_task = tokio::spawn(persist_worker(store, record_rx, self.metrics.clone()));

        let callback = self.message_callback(raw_tx.clone(), raw_rx);
        let running = RunningPipeline {
            raw_tx,
            classify_task,
            persist_task,
        };

        if let Err(e) = self.gateway.start(callback) {
            error!(error = %e, "gateway failed to start delivery");
            running.raw_tx.close();
            let gateway = &mut self.gateway;
            off_executor(|| gateway.stop());
            self.join_workers(running).await;
            return Err(e.into());
        }

        self.running = Some(running);
        info!(
            queue_capacity = self.config.queue_capacity,
            drop_policy = ?self.config.drop_policy,
            backpressure = self.gateway.backpressure(),
            "ingestion started"
        );
        Ok(())
    }

    /// Halt delivery and release the gateway
    ///
    /// The raw queue is closed first, so a gateway blocked on a full queue
    /// is released. Messages already queued are drained before the workers
    /// exit. Safe to call when never started, and more than once.
    #[instrument(name = "orchestrator_stop", skip(self), fields(gateway = %self.gateway.name()))]
    pub async fn stop(&mut self) {
        let running = self.running.take();
        if let Some(running) = &running {
            running.raw_tx.close();
        }

        let gateway = &mut self.gateway;
        off_executor(|| gateway.stop());

        let Some(running) = running else {
            return;
        };
        self.join_workers(running).await;
        info!(stats = ?self.metrics.snapshot(), "ingestion stopped");
    }

    /// Stop, wait for every worker to finish, and close the store
    pub async fn shutdown(mut self) {
        self.stop().await;
        self.reclaim_stalled(true).await;
        match self.store.as_mut() {
            Some(store) => store.close().await,
            None => warn!("store was lost, not closed"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Store, when not lent to a running worker
    pub fn store(&self) -> Option<&P> {
        self.store.as_ref()
    }

    /// Classifier, when not lent to a running worker
    pub fn classifier(&self) -> Option<&RoadClassifier> {
        self.handler.as_ref().map(MessageHandler::classifier)
    }

    /// Road-state summary, available while stopped
    pub fn summary(&self) -> Option<MetricsSummary> {
        self.handler.as_ref().map(MessageHandler::summary)
    }

    fn message_callback(
        &self,
        tx: Sender<RawMessage>,
        evict: Receiver<RawMessage>,
    ) -> MessageCallback {
        let metrics = self.metrics.clone();
        let drop_policy = self.config.drop_policy;
        let backpressure = self.gateway.backpressure();
        Arc::new(move |message: RawMessage| {
            metrics.record_received();
            observability::record_message_received(&message.topic);
            if backpressure {
                enqueue_blocking(&tx, message, &metrics);
            } else {
                enqueue_message(&tx, &evict, message, &metrics, drop_policy);
            }
        })
    }

    async fn join_workers(&mut self, running: RunningPipeline<P>) {
        running.raw_tx.close();

        let mut classify_task = running.classify_task;
        match timeout(self.drain_timeout, &mut classify_task).await {
            Ok(Ok(handler)) => self.handler = Some(handler),
            Ok(Err(e)) => error!(error = ?e, "classify worker panicked"),
            Err(_) => {
                warn!(timeout = ?self.drain_timeout, "classify worker still draining");
                self.stalled.classify = Some(classify_task);
            }
        }

        let mut persist_task = running.persist_task;
        match timeout(self.drain_timeout, &mut persist_task).await {
            Ok(Ok(store)) => self.store = Some(store),
            Ok(Err(e)) => error!(error = ?e, "persist worker panicked"),
            Err(_) => {
                warn!(timeout = ?self.drain_timeout, "persist worker still draining");
                self.stalled.persist = Some(persist_task);
            }
        }
    }

    /// Take back components from workers that outlived `stop()`
    ///
    /// With `wait`, blocks until they finish; otherwise only finished
    /// workers are collected.
    async fn reclaim_stalled(&mut self, wait: bool) {
        if let Some(task) = self.stalled.classify.take() {
            if wait || task.is_finished() {
                match task.await {
                    Ok(handler) => {
                        debug!("classify worker reclaimed");
                        self.handler = Some(handler);
                    }
                    Err(e) => error!(error = ?e, "classify worker panicked"),
                }
            } else {
                self.stalled.classify = Some(task);
            }
        }

        if let Some(task) = self.stalled.persist.take() {
            if wait || task.is_finished() {
                match task.await {
                    Ok(store) => {
                        debug!("persist worker reclaimed");
                        self.store = Some(store);
                    }
                    Err(e) => error!(error = ?e, "persist worker panicked"),
                }
            } else {
                self.stalled.persist = Some(task);
            }
        }
    }
}

/// Run a blocking gateway call without starving the runtime
///
/// On a multi-threaded runtime the current worker hands its other tasks off
/// first. A current-thread runtime has nowhere to move them, so the call runs
/// inline.
fn off_executor<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

async fn classify_worker(
    mut handler: MessageHandler,
    rx: Receiver<RawMessage>,
    record_tx: mpsc::Sender<ClassifiedRecord>,
    metrics: Arc<IngestionMetrics>,
) -> MessageHandler {
    debug!("classify worker started");

    while let Ok(message) = rx.recv().await {
        metrics.update_queue_len(rx.len());
        observability::record_queue_len(rx.len());

        if let MessageOutcome::Classified(record) = handler.handle(&message) {
            debug!(
                road_state = %record.road_state,
                z = record.sample.vertical(),
                "record classified"
            );
            if record_tx.send(record).await.is_err() {
                warn!("persist worker gone, stopping classification");
                break;
            }
        }
    }

    debug!("classify worker stopped");
    handler
}

async fn persist_worker<P: PersistenceGateway>(
    mut store: P,
    mut rx: mpsc::Receiver<ClassifiedRecord>,
    metrics: Arc<IngestionMetrics>,
) -> P {
    debug!(store = %store.name(), "persist worker started");

    while let Some(record) = rx.recv().await {
        let saved = store.save(&record).await;
        metrics.record_saved(saved);
        observability::record_record_saved(store.name(), saved);

        if !saved {
            error!(
                store = %store.name(),
                road_state = %record.road_state,
                timestamp = %contracts::timestamp::format(&record.sample.timestamp),
                "hub is not available, record dropped"
            );
        }
    }

    debug!(store = %store.name(), "persist worker stopped");
    store
}

//! Raw message queue between gateway worker and classifier
//!
//! Live gateways go through [`enqueue_message`], which never blocks and
//! applies the drop policy. Gateways that support backpressure go through
//! [`enqueue_blocking`] and wait for room instead.

use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use contracts::{DropPolicy, RawMessage};
use tracing::{debug, trace, warn};

use crate::config::IngestionMetrics;

/// Full-queue warnings are emitted for the first drop and then every Nth
const DROP_WARN_EVERY: u64 = 1000;

/// Enqueue a message, applying the drop policy when the queue is full
///
/// `evict` is a receiver on the same queue, used by `DropOldest` to make room.
#[inline]
pub fn enqueue_message(
    tx: &Sender<RawMessage>,
    evict: &Receiver<RawMessage>,
    message: RawMessage,
    metrics: &Arc<IngestionMetrics>,
    drop_policy: DropPolicy,
) {
    match tx.try_send(message) {
        Ok(()) => {
            trace!("message queued");
        }
        Err(TrySendError::Full(message)) => {
            let dropped = metrics.record_dropped();
            observability::record_message_dropped();
            if dropped == 1 || dropped % DROP_WARN_EVERY == 0 {
                warn!(
                    dropped,
                    capacity = tx.capacity(),
                    policy = ?drop_policy,
                    "ingestion queue full, dropping messages"
                );
            }
            match drop_policy {
                DropPolicy::DropNewest => {
                    trace!(topic = %message.topic, "queue full, message dropped (newest)");
                }
                DropPolicy::DropOldest => {
                    let _ = evict.try_recv();
                    if tx.try_send(message).is_err() {
                        trace!("queue still full after eviction, message dropped");
                    } else {
                        trace!("queue full, oldest message evicted");
                    }
                }
            }
        }
        Err(TrySendError::Closed(message)) => {
            debug!(topic = %message.topic, "ingestion queue closed, message discarded");
        }
    }
    metrics.update_queue_len(tx.len());
}

/// Enqueue a message, blocking the calling thread until there is room
///
/// Must only be called from a gateway's own thread, never from a runtime
/// worker. Returns `false` once the queue is closed.
pub fn enqueue_blocking(
    tx: &Sender<RawMessage>,
    message: RawMessage,
    metrics: &Arc<IngestionMetrics>,
) -> bool {
    let queued = match tx.send_blocking(message) {
        Ok(()) => true,
        Err(e) => {
            debug!(topic = %e.0.topic, "ingestion queue closed, message discarded");
            false
        }
    };
    metrics.update_queue_len(tx.len());
    queued
}

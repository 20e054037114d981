//! Enqueue with backpressure policy

use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use contracts::{DropPolicy, MessageTap, RawMessage};
use metrics::counter;
use tracing::{trace, warn};

use crate::config::IngestionMetrics;
use crate::error::TransportError;

/// Producer half of the ingestion queue
///
/// Holds a receiver clone purely to evict the oldest queued message under
/// [`DropPolicy::DropOldest`]; it never consumes otherwise.
#[derive(Clone)]
pub(crate) struct QueueSender {
    tx: Sender<RawMessage>,
    evictor: Receiver<RawMessage>,
    metrics: Arc<IngestionMetrics>,
    drop_policy: DropPolicy,
    taps: Vec<Arc<dyn MessageTap>>,
}

impl QueueSender {
    pub(crate) fn new(
        tx: Sender<RawMessage>,
        evictor: Receiver<RawMessage>,
        metrics: Arc<IngestionMetrics>,
        drop_policy: DropPolicy,
        taps: Vec<Arc<dyn MessageTap>>,
    ) -> Self {
        Self {
            tx,
            evictor,
            metrics,
            drop_policy,
            taps,
        }
    }

    /// Enqueue without blocking the transport
    ///
    /// Taps observe the message first, whatever the queue does with it.
    /// Returns false when the message (or an older one) had to be dropped.
    pub(crate) fn send(&self, message: RawMessage, source_name: &str) -> bool {
        self.metrics.record_received();
        for tap in &self.taps {
            tap.observe(&message);
        }

        let delivered = match self.tx.try_send(message) {
            Ok(()) => {
                trace!(source = %source_name, "message queued");
                true
            }
            Err(TrySendError::Full(message)) => {
                self.record_drop(source_name);
                match self.drop_policy {
                    DropPolicy::DropNewest => {
                        trace!(source = %source_name, topic = %message.topic, "message dropped (newest)");
                    }
                    DropPolicy::DropOldest => {
                        // Evict one, then retry once; losing the race to another
                        // producer drops the new message as well.
                        let _ = self.evictor.try_recv();
                        if self.tx.try_send(message).is_err() {
                            self.record_drop(source_name);
                        }
                        trace!(source = %source_name, "oldest queued message evicted");
                    }
                }
                false
            }
            Err(TrySendError::Closed(_)) => {
                let err = TransportError::ChannelClosed {
                    source_name: source_name.to_string(),
                };
                warn!(error = %err, "message discarded");
                false
            }
        };

        self.metrics.update_queue_len(self.tx.len());
        delivered
    }

    fn record_drop(&self, source_name: &str) {
        self.metrics.record_dropped();
        counter!("mine_monitor_messages_dropped_total", "source" => source_name.to_string())
            .increment(1);
    }
}

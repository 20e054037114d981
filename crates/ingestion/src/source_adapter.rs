//! Source adapter
//!
//! Bridges a `MessageSource` to the shared ingestion queue, applying the
//! adapter's own backpressure policy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_channel::{Receiver, Sender};
use contracts::{MessageCallback, MessageSource, MessageTap, RawMessage, TransportStateCell};
use tracing::debug;

use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::send::QueueSender;

/// Registered message source plus its delivery settings
pub(crate) struct SourceAdapter {
    source: Box<dyn MessageSource>,
    config: BackpressureConfig,
    listening: Arc<AtomicBool>,
}

impl SourceAdapter {
    pub(crate) fn new(source: Box<dyn MessageSource>, config: BackpressureConfig) -> Self {
        Self {
            source,
            config,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.source.name()
    }

    pub(crate) fn start(
        &self,
        tx: Sender<RawMessage>,
        evictor: Receiver<RawMessage>,
        metrics: Arc<IngestionMetrics>,
        taps: Vec<Arc<dyn MessageTap>>,
        state: TransportStateCell,
    ) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let name = self.source.name().to_string();
        let listening = self.listening.clone();
        let queue = QueueSender::new(tx, evictor, metrics, self.config.drop_policy, taps);

        debug!(source = %name, drop_policy = ?self.config.drop_policy, "starting source adapter");

        let callback: MessageCallback = Arc::new(move |message| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }
            queue.send(message, &name);
        });

        self.source.start(callback, state);
    }

    pub(crate) fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(source = %self.source.name(), "stopping source adapter");
            self.source.stop();
        }
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

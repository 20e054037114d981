//! Ingestion Pipeline main entry

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{MessageSource, MessageTap, RawMessage, TransportState, TransportStateCell};
use tracing::{debug, info, instrument};

use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::source_adapter::SourceAdapter;

/// Ingestion Pipeline
///
/// Manages message sources and funnels them into one bounded queue that a
/// single consumer drains in arrival order.
pub struct IngestionPipeline {
    /// Registered sources, in registration order
    adapters: Vec<SourceAdapter>,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Queue sender (cloned into every adapter)
    tx: Sender<RawMessage>,

    /// Queue receiver, handed out once
    rx: Option<Receiver<RawMessage>>,

    /// Receiver clone used only for drop-oldest eviction
    evictor: Receiver<RawMessage>,

    /// Observers of every inbound message, ahead of the queue
    taps: Vec<Arc<dyn MessageTap>>,

    /// Connection state shared with the presentation layer
    transport_state: TransportStateCell,

    /// Default backpressure configuration
    default_config: BackpressureConfig,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline
    ///
    /// # Arguments
    /// * `channel_capacity` - Queue capacity
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_config(BackpressureConfig {
            channel_capacity,
            ..Default::default()
        })
    }

    /// Create with custom backpressure configuration
    pub fn with_config(config: BackpressureConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity.max(1));

        Self {
            adapters: Vec::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            evictor: rx.clone(),
            tx,
            rx: Some(rx),
            taps: Vec::new(),
            transport_state: TransportStateCell::new(TransportState::Disconnected),
            default_config: config,
        }
    }

    /// Register a message source
    ///
    /// # Arguments
    /// * `source` - Broker or simulated source
    /// * `config` - Optional per-source backpressure override
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source, config),
        fields(source = %source.name())
    )]
    pub fn register_source(
        &mut self,
        source: Box<dyn MessageSource>,
        config: Option<BackpressureConfig>,
    ) {
        let adapter =
            SourceAdapter::new(source, config.unwrap_or_else(|| self.default_config.clone()));
        debug!(source = %adapter.name(), "registered message source");
        self.adapters.push(adapter);
    }

    /// Attach an observer that sees every inbound message before the
    /// backpressure policy runs, including messages later dropped
    ///
    /// Sources already started keep the taps they were started with.
    pub fn add_tap(&mut self, tap: Arc<dyn MessageTap>) {
        self.taps.push(tap);
    }

    /// Start all registered sources
    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.adapters.len(), "starting all message sources");
        for adapter in self.adapters.iter().filter(|a| !a.is_listening()) {
            adapter.start(
                self.tx.clone(),
                self.evictor.clone(),
                self.metrics.clone(),
                self.taps.clone(),
                self.transport_state.clone(),
            );
        }
    }

    /// Stop all sources
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.adapters.len(), "stopping all message sources");
        for adapter in self.adapters.iter().filter(|a| a.is_listening()) {
            adapter.stop();
        }
        self.transport_state.set(TransportState::Disconnected);
    }

    /// Stop all sources and close the queue
    ///
    /// The consumer still receives everything already queued, then its
    /// `recv()` fails and it exits.
    pub fn shutdown(&self) {
        self.stop_all();
        self.tx.close();
    }

    /// Get queue receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<RawMessage>> {
        self.rx.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Connection state handle for read-only consumers
    pub fn transport_state(&self) -> TransportStateCell {
        self.transport_state.clone()
    }

    /// Get registered source count
    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    /// Check if the named source is listening
    pub fn is_source_listening(&self, name: &str) -> bool {
        self.adapters
            .iter()
            .any(|a| a.name() == name && a.is_listening())
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

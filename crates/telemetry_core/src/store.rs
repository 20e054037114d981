//! Per-sensor store: `SensorId → SeriesBuffer`
//!
//! One `RwLock` guards the whole map. An append holds the write lock for
//! its full insert/sort/truncate sequence, readers copy out under the read
//! lock, so no reader ever sees a half-applied append.

use std::collections::HashMap;

use contracts::{PageResult, SensorId, SensorReading};
use parking_lot::RwLock;

use crate::buffer::{AppendOutcome, BufferStats, SeriesBuffer};

#[derive(Debug)]
pub struct SensorStore {
    buffers: RwLock<HashMap<SensorId, SeriesBuffer>>,
    series_capacity: usize,
}

impl SensorStore {
    pub fn new(series_capacity: usize) -> Self {
        Self {
            buffers: RwLock::new(HashMap::new()),
            series_capacity,
        }
    }

    /// Append a reading, creating the sensor's buffer on first sight
    pub fn append(&self, reading: SensorReading) -> AppendOutcome {
        let mut buffers = self.buffers.write();
        buffers
            .entry(reading.sensor_id.clone())
            .or_insert_with(|| SeriesBuffer::new(self.series_capacity))
            .push(reading)
    }

    /// Owned copy of a sensor's series; empty for an unknown sensor
    pub fn snapshot(&self, sensor_id: &str) -> Vec<SensorReading> {
        self.with_series(sensor_id, <[SensorReading]>::to_vec)
    }

    pub fn page(&self, sensor_id: &str, page_index: usize, page_size: usize) -> PageResult {
        self.with_series(sensor_id, |readings| {
            PageResult::from_slice(readings, page_index, page_size)
        })
    }

    /// Known sensors, sorted
    pub fn sensor_ids(&self) -> Vec<SensorId> {
        let mut ids: Vec<SensorId> = self.buffers.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn buffer_stats(&self, sensor_id: &str) -> Option<BufferStats> {
        self.buffers.read().get(sensor_id).map(SeriesBuffer::stats)
    }

    pub fn sensor_count(&self) -> usize {
        self.buffers.read().len()
    }

    pub fn series_capacity(&self) -> usize {
        self.series_capacity
    }

    /// Run `f` over a sensor's buffer under the read lock
    pub(crate) fn with_buffer<R>(
        &self,
        sensor_id: &str,
        f: impl FnOnce(&SeriesBuffer) -> R,
    ) -> Option<R> {
        self.buffers.read().get(sensor_id).map(f)
    }

    /// Run `f` over a sensor's readings under the read lock
    pub(crate) fn with_series<R>(
        &self,
        sensor_id: &str,
        f: impl FnOnce(&[SensorReading]) -> R,
    ) -> R {
        let buffers = self.buffers.read();
        let readings = buffers
            .get(sensor_id)
            .map(SeriesBuffer::readings)
            .unwrap_or_default();
        f(readings)
    }
}

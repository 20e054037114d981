//! Per-sensor series buffer with timestamp ordering.
//!
//! Readings are kept in a contiguous `Vec`, ascending by timestamp, so
//! paging and chart sampling are plain slice operations. Capacity is
//! enforced by dropping from the front, which is always the oldest reading.

use std::fmt;

use contracts::SensorReading;
use serde::Serialize;

/// What happened to a single append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// The reading was older than the newest one already buffered
    pub out_of_order: bool,
    /// Readings dropped from the front to stay within capacity
    pub evicted: usize,
    /// Buffer length after the append
    pub len: usize,
}

/// Counters of one buffer, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    pub len: usize,
    pub capacity: usize,
    pub out_of_order: u64,
    pub evicted: u64,
}

/// Bounded, timestamp-ordered series of one sensor
pub struct SeriesBuffer {
    readings: Vec<SensorReading>,
    capacity: usize,
    out_of_order_count: u64,
    evicted_count: u64,
}

impl fmt::Debug for SeriesBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesBuffer")
            .field("len", &self.readings.len())
            .field("capacity", &self.capacity)
            .field("out_of_order", &self.out_of_order_count)
            .field("evicted", &self.evicted_count)
            .finish()
    }
}

impl SeriesBuffer {
    /// Create an empty buffer; a zero capacity is raised to 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: Vec::with_capacity(capacity),
            capacity,
            out_of_order_count: 0,
            evicted_count: 0,
        }
    }

    /// Insert a reading, keeping ascending timestamp order
    ///
    /// Equivalent to push followed by a stable sort: a reading lands after
    /// every buffered reading with an equal timestamp. When over capacity
    /// the oldest readings are dropped, which may be the new one itself.
    pub fn push(&mut self, reading: SensorReading) -> AppendOutcome {
        let out_of_order = self
            .readings
            .last()
            .is_some_and(|newest| reading.timestamp < newest.timestamp);

        if out_of_order {
            self.out_of_order_count += 1;
            let at = self
                .readings
                .partition_point(|r| r.timestamp <= reading.timestamp);
            self.readings.insert(at, reading);
        } else {
            self.readings.push(reading);
        }

        let evicted = self.readings.len().saturating_sub(self.capacity);
        if evicted > 0 {
            self.readings.drain(..evicted);
            self.evicted_count += evicted as u64;
        }

        AppendOutcome {
            out_of_order,
            evicted,
            len: self.readings.len(),
        }
    }

    /// Buffered readings, oldest first
    #[inline]
    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest reading, if any
    pub fn latest(&self) -> Option<&SensorReading> {
        self.readings.last()
    }

    pub fn stats(&self) -> BufferStats {
        BufferStats {
            len: self.readings.len(),
            capacity: self.capacity,
            out_of_order: self.out_of_order_count,
            evicted: self.evicted_count,
        }
    }
}

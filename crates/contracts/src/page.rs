//! PageResult - paged table data for the presentation layer

use serde::Serialize;

use crate::SensorReading;

/// One page of a sensor's series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageResult {
    /// Readings on this page, ascending by timestamp
    pub items: Vec<SensorReading>,

    /// Zero-based page index that was requested
    pub page_index: usize,

    /// Requested page size
    pub page_size: usize,

    /// `ceil(len / page_size)`, 0 for an empty series
    pub total_pages: usize,
}

impl PageResult {
    /// Slice `readings` into the requested page
    ///
    /// Out-of-range pages and a zero page size yield an empty page, never an error.
    pub fn from_slice(readings: &[SensorReading], page_index: usize, page_size: usize) -> Self {
        if page_size == 0 {
            return Self {
                items: Vec::new(),
                page_index,
                page_size,
                total_pages: 0,
            };
        }

        let total_pages = readings.len().div_ceil(page_size);
        let items = page_index
            .checked_mul(page_size)
            .and_then(|start| readings.get(start..))
            .map(|rest| rest.iter().take(page_size).cloned().collect())
            .unwrap_or_default();

        Self {
            items,
            page_index,
            page_size,
            total_pages,
        }
    }

    /// Whether this page carries no readings
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

//! Monitor run statistics.

use std::time::Duration;

use contracts::DeviceStatus;
use ingestion::MetricsSnapshot;
use observability::ThroughputSummary;
use telemetry_core::CoreStatsSnapshot;

/// Statistics from a monitor run
#[derive(Debug, Clone, Default)]
pub struct MonitorStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Core counters at shutdown
    pub core: CoreStatsSnapshot,

    /// Transport queue counters at shutdown
    pub ingestion: MetricsSnapshot,

    /// Distinct sensors seen
    pub sensors: usize,

    /// Device status when the run ended
    pub final_status: DeviceStatus,

    /// Per-refresh throughput
    pub throughput: ThroughputSummary,
}

impl MonitorStats {
    /// Stored readings per second over the whole run
    pub fn readings_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.core.readings_stored as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of received messages rejected by the parser, in percent
    pub fn rejection_rate(&self) -> f64 {
        if self.core.messages_received > 0 {
            self.core.rejected() as f64 / self.core.messages_received as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Monitor Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Final status: {}", self.final_status);
        println!("   ├─ Sensors: {}", self.sensors);
        println!("   └─ Readings/s: {:.2}", self.readings_per_sec());

        println!("\nTransport");
        println!("   ├─ Messages received: {}", self.ingestion.messages_received);
        println!("   └─ Dropped (queue full): {}", self.ingestion.messages_dropped);

        println!("\nCore");
        println!("   ├─ Readings stored: {}", self.core.readings_stored);
        println!(
            "   ├─ Rejected: {} ({:.2}%)",
            self.core.rejected(),
            self.rejection_rate()
        );
        println!("   │   ├─ malformed: {}", self.core.rejected_malformed);
        println!("   │   ├─ missing identity: {}", self.core.rejected_missing_identity);
        println!("   │   └─ invalid timestamp: {}", self.core.rejected_invalid_timestamp);
        println!("   └─ Status transitions: {}", self.core.status_transitions);

        println!("\nThroughput");
        for line in self.throughput.to_string().lines() {
            println!("   {}", line);
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let stats = MonitorStats {
            duration: Duration::from_secs(4),
            core: CoreStatsSnapshot {
                messages_received: 10,
                readings_stored: 8,
                rejected_malformed: 2,
                ..Default::default()
            },
            ..Default::default()
        };

        assert!((stats.readings_per_sec() - 2.0).abs() < 1e-10);
        assert!((stats.rejection_rate() - 20.0).abs() < 1e-10);
        assert_eq!(MonitorStats::default().readings_per_sec(), 0.0);
    }
}

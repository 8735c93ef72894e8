//! Destination reachability sweep.
//!
//! Probes every registered destination, active or not, and writes the
//! outcome into its last-known-status field. Best-effort and
//! non-atomic: a probe failure never stops the sweep, and concurrent
//! admin edits interleave (last writer wins on the status field).

use promocast_core::error::Result;
use promocast_core::traits::{Storage, Transport};

/// Tally of one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub reachable: usize,
    pub failed: usize,
}

/// Probe all destinations and record per-destination status.
pub async fn run_sweep(storage: &dyn Storage, transport: &dyn Transport) -> Result<SweepReport> {
    let destinations = storage.list_destinations().await?;
    let mut report = SweepReport::default();

    for dest in &destinations {
        let status = match transport.probe(&dest.chat_id).await {
            Ok(label) => {
                report.reachable += 1;
                format!("OK ({label})")
            }
            Err(e) => {
                report.failed += 1;
                format!("error: {e}")
            }
        };
        if let Err(e) = storage.set_destination_status(dest.id, &status).await {
            tracing::warn!("failed to record status for {}: {e}", dest.chat_id);
        }
    }

    tracing::info!(
        "reachability sweep done: {} reachable, {} failed",
        report.reachable,
        report.failed
    );
    Ok(report)
}

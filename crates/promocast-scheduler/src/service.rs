//! Administrative facade over the engine, consumed by the (external)
//! admin UI. Form handling, uploads, and CSV parsing stay out there;
//! this layer speaks typed records only.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use promocast_core::error::{PromoError, Result};
use promocast_core::traits::{AssetStore, Storage, Transport};
use promocast_core::types::{
    BroadcastConfig, DashboardSnapshot, Destination, ImportReport, NewDestination, RunState,
};

use crate::cycle::{BroadcastCycle, CycleOutcome};
use crate::engine::IntervalScheduler;
use crate::spintax;
use crate::sweep::{run_sweep, SweepReport};

pub struct BroadcastService {
    storage: Arc<dyn Storage>,
    transport: Arc<dyn Transport>,
    assets: Arc<dyn AssetStore>,
    scheduler: Arc<IntervalScheduler>,
}

impl BroadcastService {
    pub fn new(
        storage: Arc<dyn Storage>,
        transport: Arc<dyn Transport>,
        assets: Arc<dyn AssetStore>,
        scheduler: Arc<IntervalScheduler>,
    ) -> Self {
        Self {
            storage,
            transport,
            assets,
            scheduler,
        }
    }

    /// Aggregate view for the dashboard: today's success count, the
    /// five most recent ledger rows, and the current registry/config.
    pub async fn dashboard_snapshot(&self) -> Result<DashboardSnapshot> {
        dashboard_snapshot(self.storage.as_ref()).await
    }

    /// Apply an administrative configuration update. Invalid bounds
    /// reject the whole update; the scheduler is re-armed only when
    /// the bounds actually changed.
    pub async fn update_configuration(
        &self,
        message: &str,
        photo: &str,
        lower: u32,
        upper: u32,
        preview_id: &str,
    ) -> Result<()> {
        BroadcastConfig::validate_bounds(lower, upper)?;
        let current = self.storage.load_config().await?;
        let bounds_changed = current.interval_min != lower || current.interval_max != upper;

        let updated = BroadcastConfig {
            message: message.to_string(),
            photo: photo.to_string(),
            interval_min: lower,
            interval_max: upper,
            run_state: current.run_state,
            preview_id: preview_id.to_string(),
        };
        self.storage.save_config(&updated).await?;

        if bounds_changed {
            self.scheduler.reconfigure(lower, upper)?;
        }
        Ok(())
    }

    /// Persist the run state and pause/resume the timer to match.
    /// The change gates the next fire, never an in-flight cycle.
    pub async fn set_run_state(&self, state: RunState) -> Result<()> {
        let mut config = self.storage.load_config().await?;
        config.run_state = state;
        self.storage.save_config(&config).await?;
        match state {
            RunState::Running => self.scheduler.resume(),
            RunState::Paused => self.scheduler.pause(),
        }
        Ok(())
    }

    /// Send one expanded message directly to a destination, bypassing
    /// the activity ledger.
    pub async fn trigger_preview(
        &self,
        chat_id: &str,
        template: &str,
        photo: Option<&str>,
    ) -> Result<()> {
        if chat_id.is_empty() || template.is_empty() {
            return Err(PromoError::ConfigurationIncomplete(
                "preview needs a destination and a template".into(),
            ));
        }
        let text = spintax::expand(template);
        match photo.filter(|p| !p.is_empty()) {
            Some(reference) => {
                let path = self.assets.resolve(reference)?;
                self.transport.send_photo(chat_id, &path, &text).await
            }
            None => self.transport.send_text(chat_id, &text).await,
        }
    }

    pub async fn add_destination(&self, dest: &NewDestination) -> Result<Destination> {
        self.storage.insert_destination(dest).await
    }

    pub async fn remove_destination(&self, id: i64) -> Result<bool> {
        self.storage.delete_destination(id).await
    }

    pub async fn set_destination_active(&self, id: i64, active: bool) -> Result<()> {
        self.storage.set_destination_active(id, active).await
    }

    pub async fn list_destinations(&self) -> Result<Vec<Destination>> {
        self.storage.list_destinations().await
    }

    /// Batch import. Duplicates are skipped, everything else is
    /// inserted; the report carries both counts.
    pub async fn import_destinations(&self, batch: &[NewDestination]) -> Result<ImportReport> {
        let mut report = ImportReport::default();
        for dest in batch {
            match self.storage.insert_destination(dest).await {
                Ok(_) => report.imported += 1,
                Err(PromoError::DuplicateDestination(_)) => report.skipped += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Probe every destination and record reachability.
    pub async fn run_reachability_sweep(&self) -> Result<SweepReport> {
        run_sweep(self.storage.as_ref(), self.transport.as_ref()).await
    }

    /// Fire one broadcast cycle on demand, outside the timer.
    pub async fn broadcast_now(&self) -> CycleOutcome {
        BroadcastCycle::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.transport),
            Arc::clone(&self.assets),
        )
        .run()
        .await
    }
}

/// Build the dashboard view from storage alone. Also usable without a
/// running scheduler (one-shot status queries).
pub async fn dashboard_snapshot(storage: &dyn Storage) -> Result<DashboardSnapshot> {
    let config = storage.load_config().await?;
    let destinations = storage.list_destinations().await?;
    let recent_logs = storage.recent_activity(5).await?;
    let sent_today = storage.sent_since(local_midnight_utc()).await?;
    Ok(DashboardSnapshot {
        sent_today,
        recent_logs,
        room_count: destinations.len(),
        config,
        destinations,
    })
}

/// Start of the current local day, in UTC, for the sent-today
/// aggregate.
fn local_midnight_utc() -> DateTime<Utc> {
    Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc::now() - chrono::Duration::hours(24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_midnight_is_in_the_past_day() {
        let midnight = local_midnight_utc();
        let now = Utc::now();
        assert!(midnight <= now);
        assert!(now - midnight <= chrono::Duration::hours(26));
    }
}

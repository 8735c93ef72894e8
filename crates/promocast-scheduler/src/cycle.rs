//! One broadcast attempt: read state, expand, fan out, record.
//!
//! Error propagation: setup failures (missing template, no active
//! destinations, store trouble) abort the cycle into a single failure
//! record. Per-destination delivery failures are logged and swallowed;
//! the fan-out continues and the recorded count is unaffected.

use std::path::PathBuf;
use std::sync::Arc;

use promocast_core::error::{PromoError, Result};
use promocast_core::traits::{AssetStore, Storage, Transport};
use promocast_core::types::{RunState, ACTIVITY_SUCCESS_PREFIX};

use crate::spintax;

/// What a fired cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Run state was paused: nothing sent, nothing recorded.
    Skipped,
    /// Fan-out ran to completion over this many active destinations.
    Completed { destinations: usize },
    /// Setup failed; one failure record was appended.
    Failed(String),
}

pub struct BroadcastCycle {
    storage: Arc<dyn Storage>,
    transport: Arc<dyn Transport>,
    assets: Arc<dyn AssetStore>,
}

impl BroadcastCycle {
    pub fn new(
        storage: Arc<dyn Storage>,
        transport: Arc<dyn Transport>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            storage,
            transport,
            assets,
        }
    }

    /// Execute exactly one broadcast attempt. Appends exactly one
    /// activity record unless the cycle is a paused skip.
    pub async fn run(&self) -> CycleOutcome {
        match self.try_run().await {
            Ok(outcome) => outcome,
            Err(e) => {
                let detail = format!("broadcast failed: {e}");
                tracing::warn!("{detail}");
                if let Err(log_err) = self.storage.append_activity(&detail).await {
                    tracing::error!("failed to record cycle failure: {log_err}");
                }
                CycleOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_run(&self) -> Result<CycleOutcome> {
        let config = self.storage.load_config().await?;
        if config.run_state != RunState::Running {
            tracing::debug!("run state is paused; skipping broadcast");
            return Ok(CycleOutcome::Skipped);
        }

        let active = self.storage.active_destinations().await?;
        if config.message.is_empty() {
            return Err(PromoError::ConfigurationIncomplete(
                "message template is empty".into(),
            ));
        }
        if active.is_empty() {
            return Err(PromoError::ConfigurationIncomplete(
                "no active destinations".into(),
            ));
        }

        let photo = self.resolve_photo(&config.photo);
        let count = active.len();

        for dest in &active {
            // Each destination gets its own expansion of the template
            let text = spintax::expand(&config.message);
            let sent = match &photo {
                Some(path) => self.transport.send_photo(&dest.chat_id, path, &text).await,
                None => self.transport.send_text(&dest.chat_id, &text).await,
            };
            if let Err(e) = sent {
                tracing::warn!("delivery to {} failed: {e}", dest.chat_id);
            }
        }

        let detail = format!("{ACTIVITY_SUCCESS_PREFIX} to {count} active destinations");
        if let Err(e) = self.storage.append_activity(&detail).await {
            tracing::error!("failed to record cycle outcome: {e}");
        }
        tracing::info!("{detail}");
        Ok(CycleOutcome::Completed { destinations: count })
    }

    /// An unresolvable image reference downgrades to text-only, it
    /// does not fail the cycle.
    fn resolve_photo(&self, reference: &str) -> Option<PathBuf> {
        if reference.is_empty() {
            return None;
        }
        match self.assets.resolve(reference) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("image {reference} unavailable, sending text-only: {e}");
                None
            }
        }
    }
}

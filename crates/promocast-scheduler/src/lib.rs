//! # Promocast Scheduler
//!
//! The broadcast scheduling and fan-out engine.
//!
//! ## Architecture
//! ```text
//! IntervalScheduler (tokio loop, uniform redraw after every fire)
//!   └── fires → BroadcastCycle
//!                 ├── read config + active destinations (Storage)
//!                 ├── expand spin-syntax template per destination
//!                 ├── deliver via Transport (photo or text)
//!                 └── append one ActivityRecord
//!
//! BroadcastService (facade for the admin UI)
//!   ├── dashboard snapshot
//!   ├── configuration update → re-arm scheduler on bounds change
//!   ├── run-state toggle → pause/resume scheduler
//!   ├── preview send (bypasses the ledger)
//!   └── destination admin + reachability sweep
//! ```

pub mod cycle;
pub mod engine;
pub mod service;
pub mod spintax;
pub mod sweep;

pub use cycle::{BroadcastCycle, CycleOutcome};
pub use engine::{IntervalScheduler, SchedulerState};
pub use service::{dashboard_snapshot, BroadcastService};
pub use sweep::{run_sweep, SweepReport};

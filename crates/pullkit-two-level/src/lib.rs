//! Two-stage ("two-level") refresh layer for the Pullkit engine seam.
//!
//! An ordinary pull-to-refresh engine fires once a single threshold is
//! crossed. This crate layers a second commitment stage on top: the first
//! threshold only arms a *hint* (the header pauses, optionally auto-scrolls
//! there and waits), and only the second, farther threshold commits the real
//! asynchronous refresh. See [`TwoLevelCoordinator`] for the entry point.

pub mod coordinator;
pub mod flags;
pub mod header;
pub mod hint;
pub mod threshold;

pub use coordinator::{
    TwoLevelConfig, TwoLevelCoordinator, DEFAULT_BACK_TO_KEEP_DURATION_MS,
    DEFAULT_CLOSE_TWO_LEVEL_DURATION_MS,
};
pub use flags::GateFlags;
pub use header::{TwoLevelHeaderView, TwoLevelListener};
pub use hint::DeferredScrollBack;
pub use threshold::{
    TwoLevelThresholds, DEFAULT_COMMIT_RATIO, DEFAULT_HINT_RATIO, DEFAULT_KEEP_RATIO,
};

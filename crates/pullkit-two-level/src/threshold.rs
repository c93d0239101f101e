//! Threshold geometry for the two-stage refresh.
//!
//! Three ratios of the measured header height derive three offsets:
//!
//! - the *hint offset*, where the header pauses to suggest the deeper stage,
//! - the *commit offset*, past which a drag or release commits the two-level
//!   refresh,
//! - the *keep offset*, where the header parks while that refresh runs.
//!
//! Offsets are recomputed from the indicator's current header height on every
//! call, never cached, so a late header measurement is picked up
//! transparently. An unmeasured header (height <= 0) disables every stage.

use std::cell::Cell;

use pullkit_core::SharedIndicator;

/// Default hint ratio: pause at one header height.
pub const DEFAULT_HINT_RATIO: f32 = 1.0;

/// Default commit ratio: commit at twice the header height.
pub const DEFAULT_COMMIT_RATIO: f32 = 2.0;

/// Default keep ratio. Must stay <= the commit ratio to have a visible
/// effect; that relationship is the caller's responsibility and is not
/// validated here.
pub const DEFAULT_KEEP_RATIO: f32 = 1.0;

/// Ratio-derived threshold offsets over a shared indicator.
pub struct TwoLevelThresholds {
    indicator: SharedIndicator,
    hint_ratio: Cell<f32>,
    commit_ratio: Cell<f32>,
    keep_ratio: Cell<f32>,
}

impl TwoLevelThresholds {
    pub fn new(indicator: SharedIndicator) -> Self {
        Self {
            indicator,
            hint_ratio: Cell::new(DEFAULT_HINT_RATIO),
            commit_ratio: Cell::new(DEFAULT_COMMIT_RATIO),
            keep_ratio: Cell::new(DEFAULT_KEEP_RATIO),
        }
    }

    /// Sets the hint position as a multiple of the header height.
    /// A ratio of `0` disables the hint stage.
    pub fn set_hint_ratio(&self, ratio: f32) {
        self.hint_ratio.set(ratio);
    }

    /// Sets the commit position as a multiple of the header height.
    pub fn set_commit_ratio(&self, ratio: f32) {
        self.commit_ratio.set(ratio);
    }

    /// Sets the parking position during a two-level refresh as a multiple of
    /// the header height. Values above the commit ratio silently have no
    /// visible effect.
    pub fn set_keep_ratio(&self, ratio: f32) {
        self.keep_ratio.set(ratio);
    }

    pub(crate) fn indicator(&self) -> &SharedIndicator {
        &self.indicator
    }

    fn derive(&self, ratio: f32) -> f32 {
        let height = self.indicator.header_height();
        if height <= 0.0 {
            return 0.0;
        }
        (ratio * height).max(0.0)
    }

    /// Offset of the hint stage; `0` means the stage is disabled.
    pub fn hint_offset(&self) -> f32 {
        self.derive(self.hint_ratio.get())
    }

    /// Offset of the commit line; `0` means the stage is disabled.
    pub fn commit_offset(&self) -> f32 {
        self.derive(self.commit_ratio.get())
    }

    /// Offset the header parks at while a two-level refresh runs.
    pub fn keep_offset(&self) -> f32 {
        self.derive(self.keep_ratio.get())
    }

    /// Whether `offset` has reached the commit line. Always false while the
    /// commit stage is disabled.
    pub fn crossed_commit_line(&self, offset: f32) -> bool {
        let commit = self.commit_offset();
        commit > 0.0 && offset >= commit
    }

    /// `offset` as a fraction of the commit offset, normalized into `(0, 1]`.
    ///
    /// Values at or below zero and values past the commit line both map to
    /// `1`, which also covers a header height or ratio that collapsed to
    /// zero after the gesture started.
    pub fn percent_of_commit(&self, offset: f32) -> f32 {
        let commit = self.commit_offset();
        if commit <= 0.0 {
            return 1.0;
        }
        let percent = offset / commit;
        if percent <= 0.0 || percent > 1.0 {
            1.0
        } else {
            percent
        }
    }
}

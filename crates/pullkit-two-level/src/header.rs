//! Capability traits for two-level-aware collaborators.

use pullkit_core::RefreshListener;

use crate::threshold::TwoLevelThresholds;

/// A header view that can present the deeper two-level stage.
///
/// Attached explicitly with
/// [`TwoLevelCoordinator::set_header_view`](crate::TwoLevelCoordinator::set_header_view);
/// a two-level refresh can only commit while one is attached.
pub trait TwoLevelHeaderView {
    /// A two-level refresh has been committed and is starting. Called exactly
    /// once per commit, with the thresholds the header may use to lay itself
    /// out.
    fn on_two_level_refresh_begin(&self, thresholds: &TwoLevelThresholds);
}

/// Refresh listener extended with the two-level commit notification.
pub trait TwoLevelListener: RefreshListener {
    /// A two-level refresh has started.
    fn on_two_level_refreshing(&self);
}

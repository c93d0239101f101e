//! The seam between the base pull-to-release engine and layered extensions.
//!
//! The base engine owns touch dispatch, layout, and the offset animation.
//! Extensions (such as a two-stage refresh layer) plug in through two traits:
//!
//! - [`RefreshEngine`] is what the engine provides: scroll commands, lifecycle
//!   primitives, and configuration queries.
//! - [`EngineExtension`] is what the engine calls at each decision point.
//!   Every hook can either take over ([`HookOutcome::Handled`]) or let the
//!   engine run its stock behavior ([`HookOutcome::Delegate`]). All hooks
//!   default to delegating, so an extension only implements the points it
//!   cares about.

use web_time::Instant;

use crate::status::{Mode, MovingSide, RefreshStatus};

/// Result of an extension hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookOutcome {
    /// The extension fully handled this event; the engine skips its default.
    Handled,
    /// The engine should run its default behavior.
    Delegate,
}

/// Primitives the base engine exposes to extensions.
///
/// Extensions never mutate the engine's offset or animation state directly;
/// they request changes through these methods and the engine applies them on
/// its own schedule.
pub trait RefreshEngine {
    /// Current time on the engine's clock.
    fn now(&self) -> Instant;

    fn status(&self) -> RefreshStatus;

    /// Switches the lifecycle status. Extensions use this to arm `Prepare`
    /// when starting a programmatic sequence.
    fn set_status(&self, status: RefreshStatus);

    fn mode(&self) -> Mode;

    /// Marks which side the current action is moving.
    fn set_moving_side(&self, side: MovingSide);

    /// Tells the header view a refresh is about to be prepared.
    fn notify_header_prepare(&self);

    /// Animates (or jumps, when `duration_ms == 0`) the header to `offset`.
    fn scroll_to(&self, offset: f32, duration_ms: u64);

    /// Animates the header back to the start position.
    fn scroll_back_to_start(&self, duration_ms: u64);

    /// Commits a refresh. `committed` distinguishes a user/threshold-driven
    /// trigger from an engine-internal automatic one.
    fn trigger_refresh(&self, committed: bool);

    /// The engine's stock commit-attempt logic.
    fn attempt_refresh(&self);

    /// The engine's stock release handling.
    fn attempt_release(&self);

    /// The engine's stock completion path. `use_scroll` selects whether the
    /// engine also animates the header home.
    fn finish_completion(&self, use_scroll: bool, notify_views: bool);

    /// Requests a full reset of the gesture and lifecycle state.
    fn request_reset(&self);

    fn is_refresh_disabled(&self) -> bool;

    fn is_pull_to_refresh_enabled(&self) -> bool;

    /// Whether the current action was started programmatically rather than
    /// by a touch gesture.
    fn is_auto_refresh(&self) -> bool;

    /// Whether a completed refresh may chain straight into the next one.
    fn is_next_refresh_at_once_enabled(&self) -> bool;

    /// Whether the engine keeps the refresh indicator pinned while a refresh
    /// runs.
    fn is_keep_header_enabled(&self) -> bool;

    /// Duration of the engine's standard close-header animation.
    fn close_header_duration(&self) -> u64;
}

/// Extension points the engine calls at each decision site.
///
/// The call order for a touch gesture is: `on_touch_down` before any other
/// gesture logic for that event, then `on_position_update` per offset change,
/// then `on_finger_up`, then `on_release`. Programmatic positioning goes
/// through `on_auto_action`; commits funnel through `on_commit_attempt`; a
/// committed refresh reaches `on_begin_refresh` exactly once.
#[allow(unused_variables)]
pub trait EngineExtension {
    /// Called while the engine positions the header for an automatic action.
    fn on_auto_action(&self, engine: &dyn RefreshEngine) -> HookOutcome {
        HookOutcome::Delegate
    }

    /// Called on every header offset change, before the engine's own
    /// position bookkeeping. Returning `Handled` skips that bookkeeping.
    fn on_position_update(&self, engine: &dyn RefreshEngine, change: f32) -> HookOutcome {
        HookOutcome::Delegate
    }

    /// Called when the finger lifts, before the engine's release handling.
    fn on_finger_up(&self, engine: &dyn RefreshEngine) -> HookOutcome {
        HookOutcome::Delegate
    }

    /// Called when the gesture resolves into a release.
    fn on_release(&self, engine: &dyn RefreshEngine) -> HookOutcome {
        HookOutcome::Delegate
    }

    /// Called whenever the engine is about to commit a refresh.
    fn on_commit_attempt(&self, engine: &dyn RefreshEngine) -> HookOutcome {
        HookOutcome::Delegate
    }

    /// Called for commit attempts made while the header is still moving.
    fn on_commit_attempt_while_moved(&self, engine: &dyn RefreshEngine) -> HookOutcome {
        HookOutcome::Delegate
    }

    /// Called once per committed refresh, when the refreshing status begins.
    fn on_begin_refresh(&self, engine: &dyn RefreshEngine, notify: bool) -> HookOutcome {
        HookOutcome::Delegate
    }

    /// Called when the running refresh reports completion.
    fn on_completion(&self, engine: &dyn RefreshEngine, notify_views: bool) -> HookOutcome {
        HookOutcome::Delegate
    }

    /// Called for a touch-down before any other gesture logic for that event.
    fn on_touch_down(&self, engine: &dyn RefreshEngine) {}

    /// When true, the engine consumes touch events instead of forwarding
    /// them to descendant content.
    fn force_touch_interception(&self) -> bool {
        false
    }

    /// Admission check for the engine's automatic-refresh entry point.
    fn allow_auto_refresh(&self) -> bool {
        true
    }

    /// Admission check for the engine's automatic-load-more entry point.
    fn allow_auto_load_more(&self) -> bool {
        true
    }

    /// Called when the engine resets mid-flight (before its own teardown).
    fn on_reset(&self) {}

    /// Called after the engine has fully reset back to `Init`.
    fn on_reset_notified(&self) {}
}

/// An extension that delegates everything; useful as a placeholder.
pub struct NoExtension;

impl EngineExtension for NoExtension {}

//! Two-stage refresh coordinator.
//!
//! Layers a second commitment stage on top of a pull-to-release engine:
//! crossing the first threshold only arms the hint stage, and only crossing
//! the second, farther threshold (by drag, or by release past it) commits
//! the real refresh. The coordinator implements [`EngineExtension`], so the
//! engine consults it at every decision site; it reconciles touch-driven
//! dragging, the engine's automatic actions, and the programmatic hint
//! sequence while guaranteeing a refresh fires at most once per gesture.
//!
//! On completion of a two-level refresh the scroll-back duration is scaled by
//! how far the header still stands relative to the commit offset, so a
//! shallower residual offset returns proportionally faster.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pullkit_core::{
    EngineExtension, HookOutcome, Mode, RefreshEngine, RefreshStatus, SharedIndicator,
};
use web_time::{Duration, Instant};

use crate::flags::GateFlags;
use crate::header::{TwoLevelHeaderView, TwoLevelListener};
use crate::hint::{DeferredScrollBack, HintSequence};
use crate::threshold::TwoLevelThresholds;

/// Default duration for scrolling back to the keep offset when the engine
/// pins the refresh indicator, in milliseconds.
pub const DEFAULT_BACK_TO_KEEP_DURATION_MS: u64 = 500;

/// Default duration for closing the header after a two-level refresh, in
/// milliseconds.
pub const DEFAULT_CLOSE_TWO_LEVEL_DURATION_MS: u64 = 500;

/// Construction-time configuration, mirroring the host's styled settings.
#[derive(Clone, Copy, Debug)]
pub struct TwoLevelConfig {
    /// Whether two-level refresh starts enabled. Off unless the host opts in.
    pub enabled: bool,
    pub back_to_keep_duration_ms: u64,
    pub close_duration_ms: u64,
}

impl Default for TwoLevelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            back_to_keep_duration_ms: DEFAULT_BACK_TO_KEEP_DURATION_MS,
            close_duration_ms: DEFAULT_CLOSE_TWO_LEVEL_DURATION_MS,
        }
    }
}

struct CoordinatorInner {
    thresholds: TwoLevelThresholds,
    flags: GateFlags,
    hint: HintSequence,
    back_to_keep_ms: Cell<u64>,
    close_two_level_ms: Cell<u64>,
    /// Timestamp of the current committed refresh, for host diagnostics.
    loading_started: Cell<Option<Instant>>,
    header_view: RefCell<Option<Rc<dyn TwoLevelHeaderView>>>,
    listener: RefCell<Option<Rc<dyn TwoLevelListener>>>,
}

/// Cheap-to-clone handle over the coordinator state.
///
/// Install it on the engine as its [`EngineExtension`] and keep a clone for
/// the host-facing configuration surface.
#[derive(Clone)]
pub struct TwoLevelCoordinator {
    inner: Rc<CoordinatorInner>,
}

impl TwoLevelCoordinator {
    /// Creates a coordinator with two-level refresh enabled and default
    /// durations.
    pub fn new(indicator: SharedIndicator) -> Self {
        Self::with_config(
            indicator,
            TwoLevelConfig {
                enabled: true,
                ..TwoLevelConfig::default()
            },
        )
    }

    pub fn with_config(indicator: SharedIndicator, config: TwoLevelConfig) -> Self {
        let flags = GateFlags::new();
        flags.set_disabled(!config.enabled);
        Self {
            inner: Rc::new(CoordinatorInner {
                thresholds: TwoLevelThresholds::new(indicator),
                flags,
                hint: HintSequence::new(),
                back_to_keep_ms: Cell::new(config.back_to_keep_duration_ms),
                close_two_level_ms: Cell::new(config.close_duration_ms),
                loading_started: Cell::new(None),
                header_view: RefCell::new(None),
                listener: RefCell::new(None),
            }),
        }
    }

    /// The threshold geometry; exposed for header views and hosts that lay
    /// out against the derived offsets.
    pub fn thresholds(&self) -> &TwoLevelThresholds {
        &self.inner.thresholds
    }

    /// Sets the hint position as a multiple of the header height.
    pub fn set_hint_ratio(&self, ratio: f32) {
        self.inner.thresholds.set_hint_ratio(ratio);
    }

    /// Sets the commit position as a multiple of the header height.
    pub fn set_commit_ratio(&self, ratio: f32) {
        self.inner.thresholds.set_commit_ratio(ratio);
    }

    /// Sets the parking position during a two-level refresh as a multiple of
    /// the header height.
    pub fn set_keep_ratio(&self, ratio: f32) {
        self.inner.thresholds.set_keep_ratio(ratio);
    }

    pub fn set_back_to_keep_duration(&self, duration_ms: u64) {
        self.inner.back_to_keep_ms.set(duration_ms);
    }

    pub fn set_close_duration(&self, duration_ms: u64) {
        self.inner.close_two_level_ms.set(duration_ms);
    }

    pub fn is_two_level_disabled(&self) -> bool {
        self.inner.flags.is_disabled()
    }

    /// Enables or disables the two-level stage.
    ///
    /// Disabling while a two-level refresh is in flight synchronously resets
    /// the whole gesture (pending scroll/timer cancelled, trigger flag
    /// cleared) before returning, so "disabled implies not triggered" never
    /// observably breaks.
    pub fn set_two_level_disabled(&self, engine: &dyn RefreshEngine, disabled: bool) {
        if disabled {
            let was_refreshing = self.is_two_level_refreshing(engine);
            self.inner.flags.set_disabled(true);
            if was_refreshing {
                log::debug!("two-level disabled mid-refresh, resetting gesture");
                engine.request_reset();
                self.inner.hint.cancel_pending();
                self.inner.flags.clear_triggered();
            }
        } else {
            self.inner.flags.set_disabled(false);
        }
    }

    /// Attaches the two-level-capable header view. Commits are gated on one
    /// being attached.
    pub fn set_header_view(&self, view: Rc<dyn TwoLevelHeaderView>) {
        *self.inner.header_view.borrow_mut() = Some(view);
    }

    pub fn set_listener(&self, listener: Rc<dyn TwoLevelListener>) {
        *self.inner.listener.borrow_mut() = Some(listener);
    }

    /// Whether the current gesture has committed to a two-level refresh.
    pub fn is_committed(&self) -> bool {
        self.inner.flags.is_triggered()
    }

    /// Whether a committed two-level refresh is currently running.
    pub fn is_two_level_refreshing(&self, engine: &dyn RefreshEngine) -> bool {
        engine.status() == RefreshStatus::Refreshing && self.inner.flags.is_triggered()
    }

    /// When the current committed refresh began, if one is running.
    pub fn loading_started_at(&self) -> Option<Instant> {
        self.inner.loading_started.get()
    }

    /// Starts the hint sequence with smooth scrolling, no stay, interruptible.
    pub fn begin_hint_sequence(&self, engine: &dyn RefreshEngine) -> bool {
        self.begin_hint_sequence_with(engine, true, Duration::ZERO, true)
    }

    /// Starts the hint sequence, choosing smooth vs. instantaneous scrolling.
    pub fn begin_hint_sequence_smooth(
        &self,
        engine: &dyn RefreshEngine,
        smooth_scroll: bool,
    ) -> bool {
        self.begin_hint_sequence_with(engine, smooth_scroll, Duration::ZERO, true)
    }

    /// Starts the hint sequence and stays at the hint offset for
    /// `stay_duration` before returning to the top.
    pub fn begin_hint_sequence_stay(
        &self,
        engine: &dyn RefreshEngine,
        stay_duration: Duration,
    ) -> bool {
        self.begin_hint_sequence_with(engine, true, stay_duration, true)
    }

    /// Starts the hint sequence. The only entry point to the programmatic
    /// flow; the lower-arity forms all funnel here.
    ///
    /// Returns false, with no state change, unless the engine is idle and
    /// in default mode. A `stay_duration` of zero stays until the user
    /// releases; `interruptible = false` forces touch interception so the
    /// sequence cannot be cancelled mid-flight.
    pub fn begin_hint_sequence_with(
        &self,
        engine: &dyn RefreshEngine,
        smooth_scroll: bool,
        stay_duration: Duration,
        interruptible: bool,
    ) -> bool {
        self.inner.hint.begin(
            engine,
            &self.inner.thresholds,
            smooth_scroll,
            stay_duration,
            interruptible,
        )
    }

    /// Fires the pending return-to-top if its stay has elapsed. The host
    /// event loop calls this when the [`next_deadline`](Self::next_deadline)
    /// wake-up passes; returns whether anything fired.
    pub fn tick(&self, now: Instant, engine: &dyn RefreshEngine) -> bool {
        self.inner.hint.fire_due(now, engine)
    }

    /// When the host loop should wake up next for the pending return-to-top.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.hint.timer().next_deadline()
    }

    /// A pollable handle to the deferred return-to-top, for hosts that track
    /// timers centrally.
    pub fn deferred_scroll_back(&self) -> DeferredScrollBack {
        self.inner.hint.timer().clone()
    }

    /// Whether every precondition for committing a two-level refresh holds:
    /// base refresh enabled, a two-level header attached, the stage not
    /// disabled, and the header the side being moved.
    fn can_commit_two_level(&self, engine: &dyn RefreshEngine) -> bool {
        !engine.is_refresh_disabled()
            && self.inner.header_view.borrow().is_some()
            && !self.inner.flags.is_disabled()
            && self.inner.thresholds.indicator().is_moving_header()
    }

    fn crossed_commit_line_now(&self) -> bool {
        let offset = self.inner.thresholds.indicator().current_offset();
        self.inner.thresholds.crossed_commit_line(offset)
    }

    /// Runs a commit attempt through the gate, falling back to the engine's
    /// stock commit logic when the gate does not take it.
    fn commit_attempt(&self, engine: &dyn RefreshEngine) {
        if self.on_commit_attempt(engine) == HookOutcome::Delegate {
            engine.attempt_refresh();
        }
    }

    /// Release resolution shared by the finger-up shortcut and the release
    /// hook. `Delegate` means the engine should run its stock release.
    fn release_outcome(&self, engine: &dyn RefreshEngine) -> HookOutcome {
        if engine.mode() != Mode::Default {
            return HookOutcome::Delegate;
        }
        if self.inner.hint.stay_duration() > Duration::ZERO {
            // Park at the hint: no refresh now, return home on the timer.
            self.inner.hint.disable_smooth_scroll();
            self.inner.hint.schedule_return(engine.now());
            return HookOutcome::Handled;
        }
        self.commit_attempt(engine);
        if !self.inner.flags.is_disabled()
            && self.inner.thresholds.indicator().is_moving_header()
            && self.is_two_level_refreshing(engine)
            && self.crossed_commit_line_now()
        {
            let duration_ms = if engine.is_keep_header_enabled() {
                self.inner.back_to_keep_ms.get()
            } else {
                self.inner.close_two_level_ms.get()
            };
            engine.scroll_to(self.inner.thresholds.keep_offset(), duration_ms);
            return HookOutcome::Handled;
        }
        HookOutcome::Delegate
    }
}

impl EngineExtension for TwoLevelCoordinator {
    fn on_auto_action(&self, engine: &dyn RefreshEngine) -> HookOutcome {
        self.inner
            .hint
            .takeover_if_pending(engine, &self.inner.thresholds)
    }

    fn on_position_update(&self, engine: &dyn RefreshEngine, _change: f32) -> HookOutcome {
        if engine.mode() == Mode::Default
            && self.can_commit_two_level(engine)
            && (engine.status() == RefreshStatus::Prepare
                || (engine.status() == RefreshStatus::Complete
                    && engine.is_next_refresh_at_once_enabled()))
            && self.inner.thresholds.indicator().has_touched()
            && !engine.is_auto_refresh()
            && engine.is_pull_to_refresh_enabled()
            && self.crossed_commit_line_now()
        {
            // Commit right away; the engine then continues its own position
            // bookkeeping for this update.
            self.commit_attempt(engine);
        }
        HookOutcome::Delegate
    }

    fn on_finger_up(&self, engine: &dyn RefreshEngine) -> HookOutcome {
        if engine.mode() == Mode::Default
            && self.can_commit_two_level(engine)
            && self.crossed_commit_line_now()
            && engine.status() == RefreshStatus::Prepare
        {
            // Past the commit line: resolve as a release immediately instead
            // of waiting for the engine's ordinary finger-up completion.
            if self.release_outcome(engine) == HookOutcome::Delegate {
                engine.attempt_release();
            }
            return HookOutcome::Handled;
        }
        HookOutcome::Delegate
    }

    fn on_release(&self, engine: &dyn RefreshEngine) -> HookOutcome {
        self.release_outcome(engine)
    }

    fn on_commit_attempt(&self, engine: &dyn RefreshEngine) -> HookOutcome {
        if self.inner.hint.is_filtering_auto_events() {
            // A programmatic sequence is in authoritative control.
            return HookOutcome::Handled;
        }
        if engine.mode() == Mode::Default
            && self.can_commit_two_level(engine)
            && engine.status() == RefreshStatus::Prepare
            && self.crossed_commit_line_now()
        {
            self.inner.flags.set_triggered();
            engine.trigger_refresh(true);
            return HookOutcome::Handled;
        }
        HookOutcome::Delegate
    }

    fn on_commit_attempt_while_moved(&self, _engine: &dyn RefreshEngine) -> HookOutcome {
        if self.inner.hint.is_filtering_auto_events() {
            return HookOutcome::Handled;
        }
        HookOutcome::Delegate
    }

    fn on_begin_refresh(&self, engine: &dyn RefreshEngine, _notify: bool) -> HookOutcome {
        if engine.mode() == Mode::Default
            && self.can_commit_two_level(engine)
            && self.is_two_level_refreshing(engine)
            && self.crossed_commit_line_now()
        {
            self.inner.loading_started.set(Some(engine.now()));
            // Clone the callbacks out so re-entrant attachment during a
            // notification cannot trip the borrow.
            let header = self.inner.header_view.borrow().clone();
            if let Some(header) = header {
                header.on_two_level_refresh_begin(&self.inner.thresholds);
            }
            let listener = self.inner.listener.borrow().clone();
            if let Some(listener) = listener {
                listener.on_two_level_refreshing();
            }
            return HookOutcome::Handled;
        }
        HookOutcome::Delegate
    }

    fn on_completion(&self, engine: &dyn RefreshEngine, notify_views: bool) -> HookOutcome {
        if self.inner.flags.take_triggered() {
            // The scroll-back is ours: run the stock completion without it,
            // then return home over a duration scaled by the residual offset.
            engine.finish_completion(false, notify_views);
            let percent = self
                .inner
                .thresholds
                .percent_of_commit(self.inner.thresholds.indicator().current_offset());
            let duration_ms =
                (self.inner.close_two_level_ms.get() as f32 * percent).round() as u64;
            engine.scroll_back_to_start(duration_ms);
            return HookOutcome::Handled;
        }
        HookOutcome::Delegate
    }

    fn on_touch_down(&self, _engine: &dyn RefreshEngine) {
        self.inner.hint.handle_touch_down();
    }

    fn force_touch_interception(&self) -> bool {
        !self.inner.hint.is_interruptible()
    }

    fn allow_auto_refresh(&self) -> bool {
        !self.inner.hint.is_filtering_auto_events()
    }

    fn allow_auto_load_more(&self) -> bool {
        !self.inner.hint.is_filtering_auto_events()
    }

    fn on_reset(&self) {
        self.inner.hint.cancel_pending();
    }

    fn on_reset_notified(&self) {
        self.inner.hint.reset();
        self.inner.flags.clear_triggered();
        self.inner.loading_started.set(None);
    }
}

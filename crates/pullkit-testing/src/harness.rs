//! Deterministic pull-to-release engine for exercising extensions.
//!
//! [`TestEngine`] implements [`RefreshEngine`] over a real
//! [`IndicatorModel`] and dispatches the installed [`EngineExtension`] hooks
//! in the same order a production engine would: touch-down preamble before
//! any other gesture logic, position updates per offset change, finger-up,
//! then release; programmatic scrolls that land while no finger is down
//! resolve as a release, the way a scroll checker finishing an automatic
//! action does. Animations are instantaneous: `scroll_to` jumps and records
//! the requested `(target, duration)` pair for assertions.
//!
//! Time comes from a [`ManualClock`] the test advances explicitly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pullkit_core::{
    EngineExtension, HookOutcome, IndicatorModel, Mode, MovingSide, NoExtension, RefreshEngine,
    RefreshStatus, SharedIndicator, DEFAULT_CLOSE_HEADER_DURATION_MS, START_OFFSET,
};
use pullkit_two_level::{TwoLevelHeaderView, TwoLevelListener, TwoLevelThresholds};
use web_time::{Duration, Instant};

/// A clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    inner: Rc<ManualClockInner>,
}

struct ManualClockInner {
    epoch: Instant,
    elapsed: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ManualClockInner {
                epoch: Instant::now(),
                elapsed: Cell::new(Duration::ZERO),
            }),
        }
    }

    pub fn now(&self) -> Instant {
        self.inner.epoch + self.inner.elapsed.get()
    }

    pub fn advance(&self, by: Duration) {
        self.inner.elapsed.set(self.inner.elapsed.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

/// One recorded `scroll_to` request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollCall {
    pub target: f32,
    pub duration_ms: u64,
}

/// Scripted engine with recorded primitives.
pub struct TestEngine {
    clock: ManualClock,
    indicator: SharedIndicator,
    extension: RefCell<Rc<dyn EngineExtension>>,
    status: Cell<RefreshStatus>,
    mode: Cell<Mode>,
    touch_active: Cell<bool>,
    // Engine configuration toggles.
    refresh_disabled: Cell<bool>,
    pull_to_refresh_enabled: Cell<bool>,
    auto_refresh_active: Cell<bool>,
    next_refresh_at_once: Cell<bool>,
    keep_header: Cell<bool>,
    close_header_ms: Cell<u64>,
    // Recorded primitive calls.
    scrolls: RefCell<Vec<ScrollCall>>,
    triggers: RefCell<Vec<bool>>,
    completions: RefCell<Vec<(bool, bool)>>,
    header_prepares: Cell<u32>,
    base_refresh_begun: Cell<u32>,
    base_commit_attempts: Cell<u32>,
    base_releases: Cell<u32>,
    base_finger_ups: Cell<u32>,
    base_auto_actions: Cell<u32>,
    moved_commit_attempts: Cell<u32>,
    resets: Cell<u32>,
}

impl TestEngine {
    pub fn new(clock: ManualClock) -> Rc<Self> {
        Rc::new(Self {
            clock,
            indicator: IndicatorModel::new(),
            extension: RefCell::new(Rc::new(NoExtension)),
            status: Cell::new(RefreshStatus::Init),
            mode: Cell::new(Mode::Default),
            touch_active: Cell::new(false),
            refresh_disabled: Cell::new(false),
            pull_to_refresh_enabled: Cell::new(true),
            auto_refresh_active: Cell::new(false),
            next_refresh_at_once: Cell::new(false),
            keep_header: Cell::new(true),
            close_header_ms: Cell::new(DEFAULT_CLOSE_HEADER_DURATION_MS),
            scrolls: RefCell::new(Vec::new()),
            triggers: RefCell::new(Vec::new()),
            completions: RefCell::new(Vec::new()),
            header_prepares: Cell::new(0),
            base_refresh_begun: Cell::new(0),
            base_commit_attempts: Cell::new(0),
            base_releases: Cell::new(0),
            base_finger_ups: Cell::new(0),
            base_auto_actions: Cell::new(0),
            moved_commit_attempts: Cell::new(0),
            resets: Cell::new(0),
        })
    }

    pub fn install(&self, extension: Rc<dyn EngineExtension>) {
        *self.extension.borrow_mut() = extension;
    }

    fn extension(&self) -> Rc<dyn EngineExtension> {
        self.extension.borrow().clone()
    }

    pub fn indicator(&self) -> &SharedIndicator {
        &self.indicator
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.set(mode);
    }

    pub fn set_refresh_disabled(&self, disabled: bool) {
        self.refresh_disabled.set(disabled);
    }

    pub fn set_keep_header(&self, keep: bool) {
        self.keep_header.set(keep);
    }

    pub fn set_next_refresh_at_once(&self, enabled: bool) {
        self.next_refresh_at_once.set(enabled);
    }

    pub fn set_auto_refresh_active(&self, active: bool) {
        self.auto_refresh_active.set(active);
    }

    pub fn set_pull_to_refresh_enabled(&self, enabled: bool) {
        self.pull_to_refresh_enabled.set(enabled);
    }

    // ── Gesture drivers ────────────────────────────────────────────────

    /// Dispatches a touch-down: extension preamble first, then the engine's
    /// own touch bookkeeping.
    pub fn touch_down(&self) {
        self.extension().on_touch_down(self);
        self.touch_active.set(true);
        self.indicator.begin_touch(self.clock.now());
    }

    /// Drags the header to `offset` and runs the position-update pass.
    pub fn drag_to(&self, offset: f32) {
        let change = offset - self.indicator.current_offset();
        if offset > START_OFFSET {
            self.indicator.set_moving_side(MovingSide::Header);
            if self.status.get() == RefreshStatus::Init {
                self.status.set(RefreshStatus::Prepare);
            }
        }
        self.indicator.set_current_offset(offset);
        self.indicator.record_touch(self.clock.now(), offset);
        if self.extension().on_position_update(self, change) == HookOutcome::Delegate
            && self.extension().on_commit_attempt_while_moved(self) == HookOutcome::Delegate
        {
            self.moved_commit_attempts
                .set(self.moved_commit_attempts.get() + 1);
        }
    }

    /// Lifts the finger and runs finger-up / release handling.
    pub fn finger_up(&self) {
        self.touch_active.set(false);
        if self.extension().on_finger_up(self) == HookOutcome::Delegate {
            self.base_finger_ups.set(self.base_finger_ups.get() + 1);
            self.release_chain();
        }
    }

    /// Signals the running refresh has finished its work.
    pub fn complete(&self, notify_views: bool) {
        self.status.set(RefreshStatus::Complete);
        if self.extension().on_completion(self, notify_views) == HookOutcome::Delegate {
            self.finish_completion(true, notify_views);
        }
    }

    /// One automatic-action positioning pass, as the layout loop runs them.
    pub fn auto_action_pass(&self) {
        if self.extension().on_auto_action(self) == HookOutcome::Delegate {
            self.perform_auto_action();
        }
    }

    /// The engine's automatic-refresh entry point; admission-checked.
    pub fn auto_refresh(&self) -> bool {
        self.extension().allow_auto_refresh()
    }

    /// The engine's automatic-load-more entry point; admission-checked.
    pub fn auto_load_more(&self) -> bool {
        self.extension().allow_auto_load_more()
    }

    /// Whether touch events are being consumed rather than forwarded.
    pub fn is_touch_intercepted(&self) -> bool {
        self.extension().force_touch_interception()
    }

    fn perform_auto_action(&self) {
        self.base_auto_actions.set(self.base_auto_actions.get() + 1);
    }

    fn release_chain(&self) {
        if self.extension().on_release(self) == HookOutcome::Delegate {
            self.base_release();
        }
    }

    fn commit_chain(&self) {
        if self.extension().on_commit_attempt(self) == HookOutcome::Delegate {
            self.attempt_refresh();
        }
    }

    fn base_release(&self) {
        self.base_releases.set(self.base_releases.get() + 1);
        self.commit_chain();
        if self.status.get() == RefreshStatus::Refreshing && self.keep_header.get() {
            self.scroll_to(self.indicator.header_height(), self.close_header_ms.get());
        } else {
            self.scroll_back_to_start(self.close_header_ms.get());
        }
    }

    fn natural_reset(&self) {
        self.resets.set(self.resets.get() + 1);
        self.status.set(RefreshStatus::Init);
        self.indicator.reset();
        self.auto_refresh_active.set(false);
        self.extension().on_reset_notified();
    }

    fn maybe_reset(&self) {
        if !self.touch_active.get()
            && self.indicator.current_offset() <= START_OFFSET
            && matches!(
                self.status.get(),
                RefreshStatus::Prepare | RefreshStatus::Complete
            )
        {
            self.natural_reset();
        }
    }

    // ── Recorded-state accessors ───────────────────────────────────────

    pub fn status_now(&self) -> RefreshStatus {
        self.status.get()
    }

    pub fn scrolls(&self) -> Vec<ScrollCall> {
        self.scrolls.borrow().clone()
    }

    pub fn last_scroll(&self) -> Option<ScrollCall> {
        self.scrolls.borrow().last().copied()
    }

    /// `committed` flags of every `trigger_refresh` call, in order.
    pub fn triggers(&self) -> Vec<bool> {
        self.triggers.borrow().clone()
    }

    /// `(use_scroll, notify_views)` of every stock completion, in order.
    pub fn completions(&self) -> Vec<(bool, bool)> {
        self.completions.borrow().clone()
    }

    pub fn header_prepares(&self) -> u32 {
        self.header_prepares.get()
    }

    pub fn base_refresh_begun(&self) -> u32 {
        self.base_refresh_begun.get()
    }

    pub fn base_commit_attempts(&self) -> u32 {
        self.base_commit_attempts.get()
    }

    pub fn base_releases(&self) -> u32 {
        self.base_releases.get()
    }

    pub fn base_finger_ups(&self) -> u32 {
        self.base_finger_ups.get()
    }

    pub fn base_auto_actions(&self) -> u32 {
        self.base_auto_actions.get()
    }

    /// Stock commit-while-moving passes that were allowed through.
    pub fn moved_commit_attempts(&self) -> u32 {
        self.moved_commit_attempts.get()
    }

    pub fn resets(&self) -> u32 {
        self.resets.get()
    }
}

impl RefreshEngine for TestEngine {
    fn now(&self) -> Instant {
        self.clock.now()
    }

    fn status(&self) -> RefreshStatus {
        self.status.get()
    }

    fn set_status(&self, status: RefreshStatus) {
        self.status.set(status);
    }

    fn mode(&self) -> Mode {
        self.mode.get()
    }

    fn set_moving_side(&self, side: MovingSide) {
        self.indicator.set_moving_side(side);
    }

    fn notify_header_prepare(&self) {
        self.header_prepares.set(self.header_prepares.get() + 1);
    }

    fn scroll_to(&self, offset: f32, duration_ms: u64) {
        self.scrolls.borrow_mut().push(ScrollCall {
            target: offset,
            duration_ms,
        });
        self.indicator.set_current_offset(offset);
        if offset > START_OFFSET
            && !self.touch_active.get()
            && self.status.get() == RefreshStatus::Prepare
        {
            // An automatic scroll finished with no finger down: the scroll
            // checker resolves it as a release.
            self.release_chain();
        }
        self.maybe_reset();
    }

    fn scroll_back_to_start(&self, duration_ms: u64) {
        self.scroll_to(START_OFFSET, duration_ms);
    }

    fn trigger_refresh(&self, committed: bool) {
        self.triggers.borrow_mut().push(committed);
        self.status.set(RefreshStatus::Refreshing);
        if self.extension().on_begin_refresh(self, true) == HookOutcome::Delegate {
            self.base_refresh_begun.set(self.base_refresh_begun.get() + 1);
        }
    }

    fn attempt_refresh(&self) {
        self.base_commit_attempts
            .set(self.base_commit_attempts.get() + 1);
        let height = self.indicator.header_height();
        if self.status.get() == RefreshStatus::Prepare
            && height > 0.0
            && self.indicator.current_offset() >= height
            && self.indicator.is_moving_header()
        {
            self.trigger_refresh(false);
        }
    }

    fn attempt_release(&self) {
        self.release_chain();
    }

    fn finish_completion(&self, use_scroll: bool, notify_views: bool) {
        self.completions.borrow_mut().push((use_scroll, notify_views));
        if use_scroll {
            self.scroll_back_to_start(self.close_header_ms.get());
        }
    }

    fn request_reset(&self) {
        self.extension().on_reset();
        self.indicator.set_current_offset(START_OFFSET);
        self.natural_reset();
    }

    fn is_refresh_disabled(&self) -> bool {
        self.refresh_disabled.get()
    }

    fn is_pull_to_refresh_enabled(&self) -> bool {
        self.pull_to_refresh_enabled.get()
    }

    fn is_auto_refresh(&self) -> bool {
        self.auto_refresh_active.get()
    }

    fn is_next_refresh_at_once_enabled(&self) -> bool {
        self.next_refresh_at_once.get()
    }

    fn is_keep_header_enabled(&self) -> bool {
        self.keep_header.get()
    }

    fn close_header_duration(&self) -> u64 {
        self.close_header_ms.get()
    }
}

/// Listener fake counting both notification kinds.
#[derive(Default)]
pub struct RecordingListener {
    pub refreshing: Cell<u32>,
    pub two_level_refreshing: Cell<u32>,
}

impl pullkit_core::RefreshListener for RecordingListener {
    fn on_refreshing(&self) {
        self.refreshing.set(self.refreshing.get() + 1);
    }
}

impl TwoLevelListener for RecordingListener {
    fn on_two_level_refreshing(&self) {
        self.two_level_refreshing.set(self.two_level_refreshing.get() + 1);
    }
}

/// Header-view fake counting begin notifications.
#[derive(Default)]
pub struct RecordingHeaderView {
    pub begun: Cell<u32>,
}

impl TwoLevelHeaderView for RecordingHeaderView {
    fn on_two_level_refresh_begin(&self, _thresholds: &TwoLevelThresholds) {
        self.begun.set(self.begun.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new();
        let before = clock.now();
        assert_eq!(clock.now(), before);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), before + Duration::from_millis(250));
    }

    #[test]
    fn bare_engine_runs_an_ordinary_refresh_cycle() {
        let engine = TestEngine::new(ManualClock::new());
        engine.indicator().set_header_height(100.0);

        engine.touch_down();
        engine.drag_to(120.0);
        assert_eq!(engine.status_now(), RefreshStatus::Prepare);

        engine.finger_up();
        assert_eq!(engine.triggers(), vec![false]);
        assert_eq!(engine.status_now(), RefreshStatus::Refreshing);
        assert_eq!(engine.base_refresh_begun(), 1);

        engine.complete(true);
        assert_eq!(engine.status_now(), RefreshStatus::Init);
        assert_eq!(engine.resets(), 1);
    }

    #[test]
    fn shallow_drag_release_closes_without_refreshing() {
        let engine = TestEngine::new(ManualClock::new());
        engine.indicator().set_header_height(100.0);

        engine.touch_down();
        engine.drag_to(40.0);
        engine.finger_up();

        assert!(engine.triggers().is_empty());
        assert_eq!(engine.last_scroll().unwrap().target, 0.0);
        assert_eq!(engine.status_now(), RefreshStatus::Init);
    }
}

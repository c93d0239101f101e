//! Programmatic hint sequence: arm, scroll to the hint offset, optionally
//! stay, then either hand back to ordinary dragging or return to the top.
//!
//! The sequence owns exactly one cancellable deferred action, the
//! "return to top after stay" one-shot. The host event loop drives it the
//! same way it drives any timed UI work: ask [`HintSequence::next_deadline`]
//! for the wake-up time and call `fire_due` (via the coordinator's `tick`)
//! once that time passes. Firing after a reset is harmless: the pending entry
//! holds only a `Weak` gesture token whose `Rc` side is dropped on reset, so
//! a late fire upgrades to nothing.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use pullkit_core::{HookOutcome, Mode, RefreshEngine, RefreshStatus};
use web_time::{Duration, Instant};

use crate::threshold::TwoLevelThresholds;

/// Liveness token for the current stay gesture. Holding the `Rc` keeps the
/// scheduled return valid; dropping it invalidates any pending fire.
pub(crate) struct StayToken;

struct Pending {
    due: Instant,
    gesture: Weak<StayToken>,
}

/// The single deferred "scroll back to top" one-shot.
///
/// A cheap `Clone` handle over shared state, so the host loop can poll the
/// deadline while the coordinator retains cancellation authority.
#[derive(Clone, Default)]
pub struct DeferredScrollBack {
    slot: Rc<RefCell<Option<Pending>>>,
}

impl DeferredScrollBack {
    /// Schedules the one-shot, replacing any previous pending entry.
    fn schedule(&self, due: Instant, gesture: Weak<StayToken>) {
        *self.slot.borrow_mut() = Some(Pending { due, gesture });
    }

    /// Cancels the pending entry. Idempotent: cancelling an already-cancelled
    /// or already-fired one-shot is a no-op.
    pub fn cancel(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn is_scheduled(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// When the host loop should wake up next, if anything is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slot.borrow().as_ref().map(|pending| pending.due)
    }

    /// Removes the entry if it is due. Returns true only when the entry was
    /// due *and* its gesture token is still alive; a fire that lost the race
    /// against a reset consumes the entry without effect.
    fn take_due(&self, now: Instant) -> bool {
        let mut slot = self.slot.borrow_mut();
        match slot.as_ref() {
            Some(pending) if now >= pending.due => {
                let alive = pending.gesture.upgrade().is_some();
                *slot = None;
                alive
            }
            _ => false,
        }
    }
}

/// Transient state of the programmatic hint flow.
///
/// Created once per coordinator; fields are armed by `begin` and fully
/// cleared by `reset`, matching the gesture lifecycle.
pub(crate) struct HintSequence {
    /// While set, the engine's automatic refresh/load-more entry points are
    /// suppressed: this sequence is in authoritative control of the header.
    filter_auto_events: Cell<bool>,
    /// When false, touch interception is forced on so the user cannot cancel
    /// the sequence mid-flight.
    interruptible: Cell<bool>,
    /// How long to hold the header at the hint offset after release; zero
    /// means "stay until the user releases".
    stay_duration: Cell<Duration>,
    /// Whether the scroll-to-hint has been issued for this sequence.
    auto_triggered: Cell<bool>,
    smooth_scroll: Cell<bool>,
    timer: DeferredScrollBack,
    gesture: RefCell<Option<Rc<StayToken>>>,
}

impl HintSequence {
    pub(crate) fn new() -> Self {
        Self {
            filter_auto_events: Cell::new(false),
            interruptible: Cell::new(true),
            stay_duration: Cell::new(Duration::ZERO),
            auto_triggered: Cell::new(false),
            smooth_scroll: Cell::new(false),
            timer: DeferredScrollBack::default(),
            gesture: RefCell::new(None),
        }
    }

    pub(crate) fn is_filtering_auto_events(&self) -> bool {
        self.filter_auto_events.get()
    }

    pub(crate) fn is_interruptible(&self) -> bool {
        self.interruptible.get()
    }

    pub(crate) fn stay_duration(&self) -> Duration {
        self.stay_duration.get()
    }

    pub(crate) fn disable_smooth_scroll(&self) {
        self.smooth_scroll.set(false);
    }

    pub(crate) fn timer(&self) -> &DeferredScrollBack {
        &self.timer
    }

    /// Starts the programmatic hint flow.
    ///
    /// Rejected (returning false, no state change) unless the engine is idle
    /// and in default mode. On success the engine is armed into `Prepare`,
    /// the header is notified, and, when the hint stage is enabled, the
    /// header is scrolled to the hint offset. With the hint stage disabled
    /// (ratio 0 or header not yet measured) positioning is left to the
    /// ordinary machinery and picked up by `takeover_if_pending` later.
    pub(crate) fn begin(
        &self,
        engine: &dyn RefreshEngine,
        thresholds: &TwoLevelThresholds,
        smooth_scroll: bool,
        stay_duration: Duration,
        interruptible: bool,
    ) -> bool {
        if engine.status() != RefreshStatus::Init || engine.mode() != Mode::Default {
            return false;
        }
        log::debug!(
            "begin hint sequence: smooth_scroll={smooth_scroll} stay={stay_duration:?} \
             interruptible={interruptible}"
        );
        engine.set_status(RefreshStatus::Prepare);
        self.filter_auto_events.set(true);
        self.stay_duration.set(stay_duration);
        self.interruptible.set(interruptible);
        self.smooth_scroll.set(smooth_scroll);
        engine.notify_header_prepare();
        engine.set_moving_side(pullkit_core::MovingSide::Header);
        let hint = thresholds.hint_offset();
        if hint <= 0.0 {
            self.auto_triggered.set(false);
        } else {
            self.auto_triggered.set(true);
            engine.scroll_to(hint, self.hint_scroll_duration(engine));
        }
        true
    }

    fn hint_scroll_duration(&self, engine: &dyn RefreshEngine) -> u64 {
        if self.smooth_scroll.get() {
            engine.close_header_duration()
        } else {
            0
        }
    }

    /// Auto-action positioning pass: once the header has a measured height,
    /// an armed-but-not-yet-triggered sequence takes over and scrolls to the
    /// hint offset. Passes it does not consume delegate to the engine.
    pub(crate) fn takeover_if_pending(
        &self,
        engine: &dyn RefreshEngine,
        thresholds: &TwoLevelThresholds,
    ) -> HookOutcome {
        if self.filter_auto_events.get()
            && !self.auto_triggered.get()
            && engine.status() == RefreshStatus::Prepare
            && engine.mode() == Mode::Default
            && thresholds.indicator().is_moving_header()
        {
            if thresholds.indicator().header_height() <= 0.0 {
                // Not measured yet; keep waiting, the next pass retries.
                return HookOutcome::Handled;
            }
            let hint = thresholds.hint_offset();
            if hint > 0.0 {
                self.filter_auto_events.set(true);
                self.auto_triggered.set(true);
                engine.scroll_to(hint, self.hint_scroll_duration(engine));
                return HookOutcome::Handled;
            }
        }
        HookOutcome::Delegate
    }

    /// Touch-down interrupt: hands control back to ordinary dragging.
    ///
    /// Runs before any other gesture logic for the event, so a stale return
    /// timer can never fire after the user has resumed dragging. No-op while
    /// the sequence is not interruptible.
    pub(crate) fn handle_touch_down(&self) {
        if !self.interruptible.get() {
            return;
        }
        self.filter_auto_events.set(false);
        self.stay_duration.set(Duration::ZERO);
        self.cancel_pending();
    }

    /// Schedules the single return-to-top one-shot after the stay duration.
    pub(crate) fn schedule_return(&self, now: Instant) {
        let token = Rc::new(StayToken);
        self.timer.schedule(now + self.stay_duration.get(), Rc::downgrade(&token));
        *self.gesture.borrow_mut() = Some(token);
    }

    /// Fires the pending return if due; returns whether it acted.
    pub(crate) fn fire_due(&self, now: Instant, engine: &dyn RefreshEngine) -> bool {
        if !self.timer.take_due(now) {
            return false;
        }
        log::debug!("stay elapsed, returning header to top");
        self.gesture.borrow_mut().take();
        engine.scroll_back_to_start(engine.close_header_duration());
        true
    }

    /// Cancels the pending return and invalidates its gesture token.
    pub(crate) fn cancel_pending(&self) {
        self.timer.cancel();
        self.gesture.borrow_mut().take();
    }

    /// Clears every transient field back to its idle value.
    pub(crate) fn reset(&self) {
        self.cancel_pending();
        self.filter_auto_events.set(false);
        self.interruptible.set(true);
        self.stay_duration.set(Duration::ZERO);
        self.auto_triggered.set(false);
        self.smooth_scroll.set(false);
    }
}

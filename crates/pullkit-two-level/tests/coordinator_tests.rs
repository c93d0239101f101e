//! End-to-end gesture scenarios for the two-level coordinator, driven
//! through the deterministic engine harness.

use std::rc::Rc;

use pullkit_core::{Mode, RefreshStatus};
use pullkit_testing::{ManualClock, RecordingHeaderView, RecordingListener, TestEngine};
use pullkit_two_level::TwoLevelCoordinator;
use web_time::Duration;

struct Fixture {
    clock: ManualClock,
    engine: Rc<TestEngine>,
    coordinator: TwoLevelCoordinator,
    header: Rc<RecordingHeaderView>,
    listener: Rc<RecordingListener>,
}

/// Engine + coordinator wired together, header measured at 200 px.
fn fixture() -> Fixture {
    let clock = ManualClock::new();
    let engine = TestEngine::new(clock.clone());
    let coordinator = TwoLevelCoordinator::new(engine.indicator().clone());
    let header = Rc::new(RecordingHeaderView::default());
    let listener = Rc::new(RecordingListener::default());
    coordinator.set_header_view(header.clone());
    coordinator.set_listener(listener.clone());
    engine.install(Rc::new(coordinator.clone()));
    engine.indicator().set_header_height(200.0);
    Fixture {
        clock,
        engine,
        coordinator,
        header,
        listener,
    }
}

fn commit_by_drag(f: &Fixture) {
    f.coordinator.set_commit_ratio(1.0);
    f.engine.touch_down();
    f.engine.drag_to(150.0);
    f.engine.drag_to(200.0);
}

#[test]
fn hint_sequence_scrolls_to_hint_and_returns_after_stay() {
    let f = fixture();
    f.coordinator.set_hint_ratio(0.5);

    let started = f.coordinator.begin_hint_sequence_with(
        &*f.engine,
        true,
        Duration::from_millis(300),
        true,
    );
    assert!(started);
    assert_eq!(f.engine.status_now(), RefreshStatus::Prepare);
    assert_eq!(f.engine.header_prepares(), 1);

    // Scrolled to the hint offset with the engine's close duration.
    let first = f.engine.scrolls()[0];
    assert_eq!(first.target, 100.0);
    assert_eq!(first.duration_ms, 500);
    assert!(f.coordinator.next_deadline().is_some());

    // Not due yet.
    f.clock.advance(Duration::from_millis(299));
    assert!(!f.coordinator.tick(f.clock.now(), &*f.engine));

    // Stay elapses: header returns to the top and the gesture resets.
    f.clock.advance(Duration::from_millis(1));
    assert!(f.coordinator.tick(f.clock.now(), &*f.engine));
    let last = f.engine.last_scroll().unwrap();
    assert_eq!(last.target, 0.0);
    assert_eq!(last.duration_ms, 500);
    assert_eq!(f.engine.resets(), 1);
    assert_eq!(f.engine.status_now(), RefreshStatus::Init);
    assert!(f.coordinator.next_deadline().is_none());
}

#[test]
fn touch_down_during_stay_cancels_timer_and_resumes_dragging() {
    let f = fixture();
    f.coordinator.set_hint_ratio(0.5);
    assert!(f.coordinator.begin_hint_sequence_with(
        &*f.engine,
        true,
        Duration::from_millis(300),
        true,
    ));
    assert!(!f.engine.auto_refresh(), "hint sequence owns the header");

    f.clock.advance(Duration::from_millis(100));
    f.engine.touch_down();

    // The pending return is gone and auto events flow again.
    assert!(f.coordinator.next_deadline().is_none());
    assert!(f.engine.auto_refresh());
    assert!(f.engine.auto_load_more());

    // The old deadline passing fires nothing.
    f.clock.advance(Duration::from_millis(500));
    assert!(!f.coordinator.tick(f.clock.now(), &*f.engine));

    // Ordinary dragging continues from the hint offset.
    assert_eq!(f.engine.indicator().current_offset(), 100.0);
    f.engine.drag_to(120.0);
    assert_eq!(f.engine.indicator().current_offset(), 120.0);
    assert_eq!(f.engine.last_scroll().unwrap().target, 100.0);
}

#[test]
fn dragging_across_commit_line_commits_exactly_once() {
    let f = fixture();
    commit_by_drag(&f);

    assert_eq!(f.engine.status_now(), RefreshStatus::Refreshing);
    assert_eq!(f.engine.triggers(), vec![true]);
    assert!(f.coordinator.is_two_level_refreshing(&*f.engine));
    assert!(f.coordinator.loading_started_at().is_some());
    assert_eq!(f.header.begun.get(), 1);
    assert_eq!(f.listener.two_level_refreshing.get(), 1);
    assert_eq!(f.engine.base_refresh_begun(), 0);

    // Position updates keep reporting the line crossed; nothing re-fires.
    f.engine.drag_to(220.0);
    f.engine.drag_to(260.0);
    assert_eq!(f.engine.triggers(), vec![true]);
    assert_eq!(f.header.begun.get(), 1);
    assert_eq!(f.listener.two_level_refreshing.get(), 1);
}

#[test]
fn release_parks_header_at_keep_offset_with_back_to_keep_duration() {
    let f = fixture();
    f.coordinator.set_keep_ratio(0.75);
    f.coordinator.set_back_to_keep_duration(700);
    commit_by_drag(&f);
    f.engine.finger_up();

    let last = f.engine.last_scroll().unwrap();
    assert_eq!(last.target, 150.0);
    assert_eq!(last.duration_ms, 700);
    assert_eq!(f.engine.status_now(), RefreshStatus::Refreshing);
}

#[test]
fn release_uses_close_duration_when_engine_does_not_keep_header() {
    let f = fixture();
    f.engine.set_keep_header(false);
    f.coordinator.set_back_to_keep_duration(700);
    f.coordinator.set_close_duration(300);
    commit_by_drag(&f);
    f.engine.finger_up();

    let last = f.engine.last_scroll().unwrap();
    assert_eq!(last.target, 200.0);
    assert_eq!(last.duration_ms, 300);
}

#[test]
fn completion_scroll_back_duration_scales_with_residual_offset() {
    let f = fixture();
    commit_by_drag(&f);
    f.engine.finger_up();

    // The header drifted back to a quarter of the commit offset.
    f.engine.indicator().set_current_offset(50.0);
    f.engine.complete(true);

    // Stock completion ran without its own scroll-back.
    assert_eq!(f.engine.completions(), vec![(false, true)]);
    let last = f.engine.last_scroll().unwrap();
    assert_eq!(last.target, 0.0);
    assert_eq!(last.duration_ms, 125); // 500 ms close duration x 0.25
    assert_eq!(f.engine.status_now(), RefreshStatus::Init);
    assert!(!f.coordinator.is_two_level_refreshing(&*f.engine));
    assert!(f.coordinator.loading_started_at().is_none());
}

#[test]
fn begin_hint_sequence_rejected_outside_idle_default() {
    let f = fixture();
    commit_by_drag(&f);
    assert_eq!(f.engine.status_now(), RefreshStatus::Refreshing);
    let prepares = f.engine.header_prepares();

    assert!(!f.coordinator.begin_hint_sequence(&*f.engine));
    assert_eq!(f.engine.status_now(), RefreshStatus::Refreshing);
    assert_eq!(f.engine.header_prepares(), prepares);

    let g = fixture();
    g.engine.set_mode(Mode::Scale);
    assert!(!g.coordinator.begin_hint_sequence(&*g.engine));
    assert_eq!(g.engine.status_now(), RefreshStatus::Init);
    assert_eq!(g.engine.header_prepares(), 0);
}

#[test]
fn disabling_mid_refresh_resets_synchronously() {
    let f = fixture();
    commit_by_drag(&f);
    assert!(f.coordinator.is_two_level_refreshing(&*f.engine));

    f.coordinator.set_two_level_disabled(&*f.engine, true);

    assert!(f.coordinator.is_two_level_disabled());
    assert!(!f.coordinator.is_two_level_refreshing(&*f.engine));
    assert_eq!(f.engine.status_now(), RefreshStatus::Init);
    assert_eq!(f.engine.resets(), 1);
    assert!(f.coordinator.next_deadline().is_none());

    // A later gesture past the line falls back to the ordinary refresh.
    f.engine.touch_down();
    f.engine.drag_to(250.0);
    f.engine.finger_up();
    assert_eq!(f.engine.triggers(), vec![true, false]);
    assert_eq!(f.engine.base_refresh_begun(), 1);
    assert_eq!(f.header.begun.get(), 1);
}

#[test]
fn disabling_while_idle_only_flips_the_flag() {
    let f = fixture();
    f.coordinator.set_two_level_disabled(&*f.engine, true);
    assert!(f.coordinator.is_two_level_disabled());
    assert_eq!(f.engine.resets(), 0);

    f.coordinator.set_two_level_disabled(&*f.engine, false);
    assert!(!f.coordinator.is_two_level_disabled());
}

#[test]
fn hint_with_unmeasured_header_waits_for_layout() {
    let clock = ManualClock::new();
    let engine = TestEngine::new(clock.clone());
    let coordinator = TwoLevelCoordinator::new(engine.indicator().clone());
    coordinator.set_header_view(Rc::new(RecordingHeaderView::default()));
    engine.install(Rc::new(coordinator.clone()));

    // Header not measured yet: the sequence arms but issues no scroll.
    assert!(coordinator.begin_hint_sequence(&*engine));
    assert!(engine.scrolls().is_empty());
    assert_eq!(engine.status_now(), RefreshStatus::Prepare);

    // Positioning passes are consumed while waiting for measurement.
    engine.auto_action_pass();
    assert_eq!(engine.base_auto_actions(), 0);
    assert!(engine.scrolls().is_empty());

    // Measurement lands; the next pass takes over and scrolls to the hint,
    // which (stay zero, no touch) rolls back home and resets.
    engine.indicator().set_header_height(200.0);
    engine.auto_action_pass();
    let scrolls = engine.scrolls();
    assert_eq!(scrolls[0].target, 200.0);
    assert_eq!(scrolls[0].duration_ms, 500);
    assert_eq!(scrolls[1].target, 0.0);
    assert_eq!(engine.status_now(), RefreshStatus::Init);
    assert_eq!(engine.base_auto_actions(), 0);
}

#[test]
fn zero_hint_ratio_disables_the_hint_stage() {
    let f = fixture();
    f.coordinator.set_hint_ratio(0.0);
    assert!(f.coordinator.begin_hint_sequence(&*f.engine));
    // No hint scroll; positioning is left to the ordinary machinery.
    assert!(f.engine.scrolls().is_empty());
    f.engine.auto_action_pass();
    assert!(f.engine.scrolls().is_empty());
    assert_eq!(f.engine.base_auto_actions(), 1);
}

#[test]
fn non_interruptible_sequence_forces_interception_and_survives_touch() {
    let f = fixture();
    f.coordinator.set_hint_ratio(0.5);
    assert!(f.coordinator.begin_hint_sequence_with(
        &*f.engine,
        false,
        Duration::from_millis(300),
        false,
    ));
    // Instantaneous scroll was requested.
    assert_eq!(f.engine.scrolls()[0].duration_ms, 0);
    assert!(f.engine.is_touch_intercepted());

    f.engine.touch_down();
    // Touch could not interrupt: the return is still pending and auto
    // events are still filtered.
    assert!(f.coordinator.next_deadline().is_some());
    assert!(!f.engine.auto_refresh());

    f.clock.advance(Duration::from_millis(300));
    assert!(f.coordinator.tick(f.clock.now(), &*f.engine));
    assert_eq!(f.engine.last_scroll().unwrap().target, 0.0);
}

#[test]
fn finger_up_past_commit_line_resolves_release_immediately() {
    let f = fixture();
    f.coordinator.set_commit_ratio(1.0);
    // Keep the position-update gate closed so the commit can only happen
    // through the finger-up shortcut.
    f.engine.set_pull_to_refresh_enabled(false);

    f.engine.touch_down();
    f.engine.drag_to(250.0);
    assert!(f.engine.triggers().is_empty());
    assert_eq!(f.engine.status_now(), RefreshStatus::Prepare);

    f.engine.finger_up();
    assert_eq!(f.engine.triggers(), vec![true]);
    assert_eq!(f.engine.base_finger_ups(), 0, "stock finger-up bypassed");
    assert_eq!(f.engine.last_scroll().unwrap().target, 200.0);
}

#[test]
fn shallow_release_falls_through_to_ordinary_refresh() {
    let f = fixture();
    // Default commit ratio (2.0) puts the line at 400; 250 only crosses the
    // engine's own single-level threshold.
    f.engine.touch_down();
    f.engine.drag_to(250.0);
    f.engine.finger_up();

    assert_eq!(f.engine.triggers(), vec![false]);
    assert_eq!(f.engine.base_refresh_begun(), 1);
    assert_eq!(f.listener.two_level_refreshing.get(), 0);
    assert_eq!(f.header.begun.get(), 0);

    f.engine.complete(true);
    // Ordinary completion keeps its own scroll-back.
    assert_eq!(f.engine.completions(), vec![(true, true)]);
    assert_eq!(f.engine.status_now(), RefreshStatus::Init);
}

#[test]
fn reset_restores_every_transient_field() {
    let f = fixture();
    f.coordinator.set_hint_ratio(0.5);
    assert!(f.coordinator.begin_hint_sequence_with(
        &*f.engine,
        true,
        Duration::from_millis(200),
        false,
    ));
    assert!(f.engine.is_touch_intercepted());
    assert!(!f.engine.auto_refresh());

    f.clock.advance(Duration::from_millis(200));
    assert!(f.coordinator.tick(f.clock.now(), &*f.engine));

    // Back to idle: interception off, auto events admitted, no deadline.
    assert_eq!(f.engine.status_now(), RefreshStatus::Init);
    assert!(!f.engine.is_touch_intercepted());
    assert!(f.engine.auto_refresh());
    assert!(f.coordinator.next_deadline().is_none());
}

#[test]
fn moving_commit_passes_are_filtered_while_sequence_owns_the_header() {
    let f = fixture();
    f.coordinator.set_hint_ratio(0.5);
    assert!(f.coordinator.begin_hint_sequence_with(
        &*f.engine,
        true,
        Duration::from_millis(300),
        false,
    ));

    // Touch cannot interrupt, so the filter stays up while dragging.
    f.engine.touch_down();
    f.engine.drag_to(110.0);
    f.engine.drag_to(130.0);
    assert_eq!(f.engine.moved_commit_attempts(), 0);

    // After the stay resolves and the gesture resets, passes flow again.
    f.engine.finger_up();
    f.clock.advance(Duration::from_millis(300));
    f.coordinator.tick(f.clock.now(), &*f.engine);
    f.engine.touch_down();
    f.engine.drag_to(50.0);
    assert_eq!(f.engine.moved_commit_attempts(), 1);
}

#[test]
fn commit_requires_an_attached_two_level_header() {
    let clock = ManualClock::new();
    let engine = TestEngine::new(clock.clone());
    let coordinator = TwoLevelCoordinator::new(engine.indicator().clone());
    engine.install(Rc::new(coordinator.clone()));
    engine.indicator().set_header_height(200.0);
    coordinator.set_commit_ratio(1.0);

    engine.touch_down();
    engine.drag_to(200.0);
    // No header view attached: the gate never opens.
    assert!(engine.triggers().is_empty());
    assert_eq!(engine.status_now(), RefreshStatus::Prepare);
}

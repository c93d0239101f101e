//! Gesture indicator data model.
//!
//! The base engine measures the header, tracks the pointer, and translates
//! both into a single header offset. [`IndicatorModel`] is the shared view of
//! that bookkeeping: layered extensions read it to evaluate thresholds, the
//! engine writes it as the gesture progresses.
//!
//! Touch history is kept as a small bounded ring of timestamped samples so
//! extensions can inspect recent movement without the engine re-dispatching
//! events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;
use web_time::Instant;

use crate::status::MovingSide;

/// Number of touch samples retained per gesture.
pub const TOUCH_HISTORY_SIZE: usize = 20;

/// A single timestamped touch sample.
#[derive(Clone, Copy, Debug)]
pub struct TouchSample {
    /// When the sample was recorded.
    pub at: Instant,
    /// Header offset at that moment.
    pub offset: f32,
}

/// Shared handle to an [`IndicatorModel`].
pub type SharedIndicator = Rc<IndicatorModel>;

/// Mutable gesture state shared between the engine and its extensions.
///
/// Single-threaded; all fields use interior mutability so the model can be
/// shared as `Rc<IndicatorModel>` and mutated through `&self`.
pub struct IndicatorModel {
    /// Measured header height in pixels; `0` until the first layout pass.
    header_height: Cell<f32>,
    current_offset: Cell<f32>,
    last_offset: Cell<f32>,
    moving_side: Cell<MovingSide>,
    /// Whether the current gesture has seen a touch-down.
    touched: Cell<bool>,
    samples: RefCell<SmallVec<[TouchSample; TOUCH_HISTORY_SIZE]>>,
}

impl IndicatorModel {
    pub fn new() -> SharedIndicator {
        Rc::new(Self {
            header_height: Cell::new(0.0),
            current_offset: Cell::new(0.0),
            last_offset: Cell::new(0.0),
            moving_side: Cell::new(MovingSide::Content),
            touched: Cell::new(false),
            samples: RefCell::new(SmallVec::new()),
        })
    }

    /// Measured header height; `<= 0` means "not yet measured".
    pub fn header_height(&self) -> f32 {
        self.header_height.get()
    }

    pub fn set_header_height(&self, height: f32) {
        if height < 0.0 {
            log::warn!("negative header height {height}, treated as unmeasured");
        }
        self.header_height.set(height);
    }

    /// Current header offset from the start position.
    pub fn current_offset(&self) -> f32 {
        self.current_offset.get()
    }

    /// Offset before the most recent position update.
    pub fn last_offset(&self) -> f32 {
        self.last_offset.get()
    }

    pub fn set_current_offset(&self, offset: f32) {
        self.last_offset.set(self.current_offset.get());
        self.current_offset.set(offset);
    }

    pub fn moving_side(&self) -> MovingSide {
        self.moving_side.get()
    }

    pub fn set_moving_side(&self, side: MovingSide) {
        self.moving_side.set(side);
    }

    pub fn is_moving_header(&self) -> bool {
        self.moving_side.get() == MovingSide::Header
    }

    /// Whether the current gesture has seen a touch-down event.
    pub fn has_touched(&self) -> bool {
        self.touched.get()
    }

    /// Records a touch-down and starts a fresh sample ring.
    pub fn begin_touch(&self, at: Instant) {
        self.touched.set(true);
        let mut samples = self.samples.borrow_mut();
        samples.clear();
        samples.push(TouchSample {
            at,
            offset: self.current_offset.get(),
        });
    }

    /// Records a touch movement sample, evicting the oldest past capacity.
    pub fn record_touch(&self, at: Instant, offset: f32) {
        let mut samples = self.samples.borrow_mut();
        if samples.len() == TOUCH_HISTORY_SIZE {
            samples.remove(0);
        }
        samples.push(TouchSample { at, offset });
    }

    /// Snapshot of the retained touch samples, oldest first.
    pub fn touch_history(&self) -> SmallVec<[TouchSample; TOUCH_HISTORY_SIZE]> {
        self.samples.borrow().clone()
    }

    /// Clears per-gesture state. Header height survives; it belongs to layout.
    pub fn reset(&self) {
        self.touched.set(false);
        self.moving_side.set(MovingSide::Content);
        self.samples.borrow_mut().clear();
    }
}

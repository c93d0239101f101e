//! Testing utilities and harness for Pullkit.
//!
//! Provides a deterministic, scripted [`TestEngine`] that stands in for the
//! base pull-to-release engine, a [`ManualClock`], and recording fakes for
//! the two-level listener and header view. Intended as a dev-dependency of
//! the layer crates.

pub mod harness;

pub use harness::{ManualClock, RecordingHeaderView, RecordingListener, ScrollCall, TestEngine};

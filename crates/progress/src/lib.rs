#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Progress records for in-flight uploads
//!
//! A [`ProgressRecord`] is written by the context receiving an upload and
//! read by any number of pollers. Every access goes through the record's own
//! lock, so readers always see a consistent view. Derived figures such as the
//! completion fraction, the remaining time, and the transfer rate are
//! computed on demand.

mod clock;
mod rate;
mod record;
mod snapshot;

pub use clock::{span, Clock, ManualClock, SystemClock};
pub use rate::{RateEstimator, RateInput, DEFAULT_RATE_WINDOW};
pub use record::{ProgressRecord, RecordState, SharedRecord};
pub use snapshot::RecordSnapshot;

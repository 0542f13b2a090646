//! Occurrence engine behind every calendar view.
//!
//!  - [date_math] holds calendar-day arithmetic and month grid generation.
//!  - [recurrence] decides whether one task is active on one date.
//!  - [resolver] applies that decision to whole task collections.
//!
//! Everything here is pure and synchronous. Task records are passed in by the caller through
//! [resolver::Schedulable], nothing is read from storage.

pub mod date_math;
pub mod recurrence;
pub mod resolver;

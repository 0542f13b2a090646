//! Planner for one-off and repeating tasks that works entirely from a terminal.
//! Repetitions are never stored. Every view resolves which tasks occur on a day from the task's
//! anchor date and its recurrence rule.
//!

pub mod calendar;
pub mod cli;
pub mod storage;
pub mod utils;

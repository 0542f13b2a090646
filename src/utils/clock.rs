use chrono::{DateTime, Local};

/// Represents an entity responsible for providing the current moment across the application.
/// Relative dates such as "tomorrow" are resolved against it, which keeps them testable.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

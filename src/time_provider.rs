
use chrono::{Local, NaiveDateTime};

#[cfg(test)]
use mockall::automock;

///
/// Wall-clock source for snapshot naming and retention age.
/// Snapshot names follow the operator's calendar, so this is local time.
///
#[cfg_attr(test, automock)]
pub trait TimeProvider : Send + Sync {
    fn naive_local_now(&self) -> NaiveDateTime;
}

pub struct CoreTimeProvider;
impl CoreTimeProvider {
    pub fn new() -> Self {
        Self
    }
}
impl TimeProvider for CoreTimeProvider {
    fn naive_local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

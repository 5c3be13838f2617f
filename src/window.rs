use bitvec::prelude::*;

use crate::shared::time::{Duration, Time};

/// A time-of-day interval `[from, to)` plus the set of calendar services
/// active inside it. Immutable once constructed.
///
/// The window filters trips before they ever enter the worker data: a trip
/// qualifies when its service is active, its first-stop arrival is before
/// `to` and its last-stop departure is at or after `from`.
#[derive(Debug, Clone)]
pub struct TimeWindow {
    from: Time,
    to: Time,
    services: BitVec<usize, Lsb0>,
}

impl TimeWindow {
    /// Builds a window over the given service codes. `service_count` is the
    /// size of the model's service universe.
    pub fn new(from: Time, to: Time, service_count: usize, active: &[u16]) -> Self {
        let mut services = bitvec!(usize, Lsb0; 0; service_count);
        for code in active {
            services.set(*code as usize, true);
        }
        Self { from, to, services }
    }

    pub const fn from_time(&self) -> Time {
        self.from
    }

    pub const fn to_time(&self) -> Time {
        self.to
    }

    pub fn duration(&self) -> Duration {
        self.to - self.from
    }

    /// Number of whole departure minutes inside the window.
    pub fn minutes(&self) -> u32 {
        self.duration().as_seconds() / 60
    }

    pub fn includes_service(&self, service: u16) -> bool {
        self.services
            .get(service as usize)
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    /// Window filter for a trip given its first-stop arrival and last-stop
    /// departure.
    pub fn overlaps(&self, first_arrival: Time, last_departure: Time) -> bool {
        first_arrival < self.to && last_departure >= self.from
    }
}

#[test]
fn includes_service_test() {
    let window = TimeWindow::new(Time::from_seconds(0), Time::from_seconds(3600), 3, &[1]);
    assert!(!window.includes_service(0));
    assert!(window.includes_service(1));
    assert!(!window.includes_service(2));
    // out of universe
    assert!(!window.includes_service(40));
}

#[test]
fn overlaps_test() {
    let window = TimeWindow::new(Time::from_seconds(100), Time::from_seconds(200), 1, &[0]);
    // fully before
    assert!(!window.overlaps(Time::from_seconds(10), Time::from_seconds(50)));
    // last departure exactly at window start still qualifies
    assert!(window.overlaps(Time::from_seconds(10), Time::from_seconds(100)));
    // first arrival exactly at window end does not
    assert!(!window.overlaps(Time::from_seconds(200), Time::from_seconds(300)));
    // straddles
    assert!(window.overlaps(Time::from_seconds(150), Time::from_seconds(400)));
}

#[test]
fn minutes_test() {
    let window = TimeWindow::new(Time::from_seconds(0), Time::from_seconds(3600), 1, &[0]);
    assert_eq!(window.minutes(), 60);
}

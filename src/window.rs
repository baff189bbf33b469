// src/window.rs
//! Daily window: the half-open UTC interval `[start, end)` covering one
//! calendar day of the reference timezone. Derived on demand, never stored.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DailyWindow {
    /// Window for "today" as seen from the reference timezone.
    pub fn current(tz: Tz) -> Self {
        Self::containing(tz, Utc::now())
    }

    /// Window for the reference-timezone day that contains `at`.
    pub fn containing(tz: Tz, at: DateTime<Utc>) -> Self {
        Self::for_date(tz, at.with_timezone(&tz).date_naive())
    }

    /// Window for one specific calendar date of the reference timezone.
    pub fn for_date(tz: Tz, day: NaiveDate) -> Self {
        let next = day.succ_opt().expect("calendar date overflow");
        Self {
            start: day_start(tz, day).with_timezone(&Utc),
            end: day_start(tz, next).with_timezone(&Utc),
        }
    }

    /// Half-open containment: start is in, end is out.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// First valid instant of `day` in `tz`. When a DST jump skips local
/// midnight, the day starts at the first hour that exists.
fn day_start(tz: Tz, day: NaiveDate) -> DateTime<Tz> {
    let midnight = day.and_hms_opt(0, 0, 0).expect("midnight is a valid time");
    tz.from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| {
            tz.from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
                .expect("time after a DST gap resolves")
        })
}

// Copyright 2023 Viktor Reusch
//
// This file is part of ais_kml.
//
// ais_kml is free software: you can redistribute it and/or modify it under the
// terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// ais_kml is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with ais_kml. If not, see <https://www.gnu.org/licenses/>.

//! Resolution of the partial timestamps found in AIS reports.
//!
//! AIS position reports only carry the hour, minute, and second of the fix.
//! The date is reconstructed from the wall clock of the generating host. This
//! is a heuristic: if the reported hour lies ahead of the current hour, the
//! report is assumed to be from the previous day.

use chrono::{Local, NaiveDateTime, NaiveTime, Timelike};

/// Format of the `<when>` values in the generated KML.
///
/// The `Z` suffix is kept even though the date is taken from local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The wall-clock time against which partial timestamps are resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeContext {
    now: NaiveDateTime,
}

impl TimeContext {
    /// Use a fixed `now`, truncated to whole seconds.
    ///
    /// Feed timestamps have a resolution of one second, so sub-second parts
    /// would make equal `<when>` values compare unequal.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: now.with_nanosecond(0).unwrap_or(now),
        }
    }

    /// Use the local time of this host.
    pub fn local() -> Self {
        Self::new(Local::now().naive_local())
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Build a full timestamp from the optional time-of-day components.
    ///
    /// Falls back to `now` if a component is missing or if the components do
    /// not form a valid time of day. AIS uses the second values 60 to 63 to
    /// signal an unavailable time stamp, which ends up here as well.
    pub fn resolve(
        &self,
        hour: Option<u32>,
        minute: Option<u32>,
        second: Option<u32>,
    ) -> NaiveDateTime {
        let (Some(hour), Some(minute), Some(second)) = (hour, minute, second) else {
            return self.now;
        };
        let Some(time) = NaiveTime::from_hms_opt(hour, minute, second) else {
            log::debug!("invalid time of day {hour}:{minute}:{second}, using current time");
            return self.now;
        };

        let today = self.now.date();
        let date = if hour > self.now.hour() {
            today.pred_opt().unwrap_or(today)
        } else {
            today
        };
        date.and_time(time)
    }
}

/// Render `time` as used in KML `<when>` elements.
pub fn format_timestamp(time: NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

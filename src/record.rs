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

//! Parsing of single lines of the JSON position feed.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use crate::time::TimeContext;

/// Maritime Mobile Service Identity of a vessel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mmsi(pub u32);

impl fmt::Display for Mmsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Mmsi {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Mmsi)
    }
}

/// Error for a single line of the feed.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The line is not a JSON object of the expected shape.
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The `mmsi` field is not a valid vessel identifier.
    #[error("invalid vessel identifier: {0}")]
    InvalidVesselId(String),
    /// The line lacks the `mmsi` field.
    #[error("record has no vessel identifier")]
    MissingVesselId,
}

/// A single parsed position report.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionRecord {
    pub vessel_id: Mmsi,
    pub timestamp: NaiveDateTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub name: Option<String>,
    pub speed_over_ground: Option<f64>,
    pub course_over_ground: Option<f64>,
}

impl PositionRecord {
    /// Latitude and longitude, if both are known.
    pub fn position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// A JSON value which the feed writes either as number or as string.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
        .filter(|v: &f64| v.is_finite())
    }

    fn as_u32(&self) -> Option<u32> {
        match self {
            Scalar::Number(n) => n.as_u64().and_then(|v| v.try_into().ok()),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    fn into_text(self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

/// Raw shape of a feed line. Unknown fields are ignored.
#[derive(Deserialize, Debug)]
struct RawRecord {
    mmsi: Option<Scalar>,
    utc_hour: Option<Scalar>,
    utc_min: Option<Scalar>,
    timestamp: Option<Scalar>,
    x: Option<Scalar>,
    y: Option<Scalar>,
    name: Option<Scalar>,
    sog: Option<Scalar>,
    cog: Option<Scalar>,
}

/// Parse one `line` of the feed.
///
/// Partial timestamps are completed with `time`. A line without `mmsi` is
/// rejected with [`RecordError::MissingVesselId`] instead of being grouped
/// under an empty identifier.
pub fn parse_line(line: &[u8], time: &TimeContext) -> Result<PositionRecord, RecordError> {
    let raw: RawRecord = serde_json::from_slice(line)?;

    let vessel_id = match raw.mmsi {
        None => return Err(RecordError::MissingVesselId),
        Some(mmsi) => mmsi
            .as_u32()
            .map(Mmsi)
            .ok_or_else(|| RecordError::InvalidVesselId(mmsi.into_text()))?,
    };

    let component = |field: &str, c: &Option<Scalar>| {
        let scalar = c.as_ref()?;
        let value = scalar.as_u32();
        if value.is_none() {
            log::debug!("ignoring {field} {scalar:?} of {vessel_id}, not a whole number");
        }
        value
    };
    let timestamp = time.resolve(
        component("utc_hour", &raw.utc_hour),
        component("utc_min", &raw.utc_min),
        component("timestamp", &raw.timestamp),
    );

    let number = |c: &Option<Scalar>| c.as_ref().and_then(Scalar::as_f64);
    let (latitude, longitude) = match (number(&raw.y), number(&raw.x)) {
        (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
        _ => (None, None),
    };

    Ok(PositionRecord {
        vessel_id,
        timestamp,
        latitude,
        longitude,
        name: raw.name.map(Scalar::into_text).and_then(clean_name),
        speed_over_ground: number(&raw.sog),
        course_over_ground: number(&raw.cog),
    })
}

/// Strip whitespace and the `@` padding of AIS six-bit strings.
fn clean_name(name: String) -> Option<String> {
    let trimmed = name.trim_end_matches(|c: char| c == '@' || c.is_whitespace());
    let trimmed = trimmed.trim_start();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == name.len() {
        Some(name)
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> TimeContext {
        TimeContext::new(
            NaiveDate::from_ymd_opt(2023, 6, 5)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn full_record() {
        let line = br#"{"mmsi":367652000,"x":-80.1,"y":25.7,"utc_hour":"01","utc_min":"02","timestamp":"03","name":"PELICAN@@@","sog":"10.5","cog":181}"#;
        let record = parse_line(line, &ctx()).unwrap();
        assert_eq!(record.vessel_id, Mmsi(367652000));
        assert_eq!(record.position(), Some((25.7, -80.1)));
        assert_eq!(record.name.as_deref(), Some("PELICAN"));
        assert_eq!(record.speed_over_ground, Some(10.5));
        assert_eq!(record.course_over_ground, Some(181.0));
        assert_eq!(
            record.timestamp,
            NaiveDate::from_ymd_opt(2023, 6, 5)
                .unwrap()
                .and_hms_opt(1, 2, 3)
                .unwrap()
        );
    }

    #[test]
    fn string_mmsi_and_missing_fields() {
        let record = parse_line(br#"{"mmsi":"338336647"}"#, &ctx()).unwrap();
        assert_eq!(record.vessel_id, Mmsi(338336647));
        assert_eq!(record.position(), None);
        assert_eq!(record.name, None);
        assert_eq!(record.timestamp, ctx().now());
    }

    #[test]
    fn fractional_hour_uses_now() {
        let line = br#"{"mmsi":1,"utc_hour":1.0,"utc_min":2,"timestamp":3}"#;
        let record = parse_line(line, &ctx()).unwrap();
        assert_eq!(record.timestamp, ctx().now());
    }

    #[test]
    fn half_position_is_dropped() {
        let record = parse_line(br#"{"mmsi":1,"x":10}"#, &ctx()).unwrap();
        assert_eq!(record.latitude, None);
        assert_eq!(record.longitude, None);
    }

    #[test]
    fn blank_name_is_absent() {
        let record = parse_line(br#"{"mmsi":1,"name":"  @@@@"}"#, &ctx()).unwrap();
        assert_eq!(record.name, None);
    }

    #[test]
    fn unparsable_speed_is_absent() {
        let record = parse_line(br#"{"mmsi":1,"sog":"n/a","cog":null}"#, &ctx()).unwrap();
        assert_eq!(record.speed_over_ground, None);
        assert_eq!(record.course_over_ground, None);
    }

    #[test]
    fn missing_mmsi() {
        let err = parse_line(br#"{"x":1,"y":2}"#, &ctx()).unwrap_err();
        assert!(matches!(err, RecordError::MissingVesselId));
        let err = parse_line(br#"{"mmsi":null}"#, &ctx()).unwrap_err();
        assert!(matches!(err, RecordError::MissingVesselId));
    }

    #[test]
    fn invalid_mmsi() {
        let err = parse_line(br#"{"mmsi":"abc"}"#, &ctx()).unwrap_err();
        assert!(matches!(err, RecordError::InvalidVesselId(ref id) if id == "abc"));
        let err = parse_line(br#"{"mmsi":-4}"#, &ctx()).unwrap_err();
        assert!(matches!(err, RecordError::InvalidVesselId(_)));
    }

    #[test]
    fn malformed_line() {
        let lines: [&[u8]; 4] = [b"{\"mmsi\":1", b"42", b"\xff\xfe", b"{\"mmsi\":true}"];
        for line in lines {
            let err = parse_line(line, &ctx()).unwrap_err();
            assert!(matches!(err, RecordError::Malformed(_)), "{err:?}");
        }
    }
}

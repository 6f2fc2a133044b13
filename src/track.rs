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

//! Grouping of position records into per-vessel tracks.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::NaiveDateTime;

use crate::config::KnownVessels;
use crate::record::{parse_line, Mmsi, PositionRecord, RecordError};
use crate::time::TimeContext;
use crate::Error;

/// A single timestamped position of a track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackPoint {
    pub time: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
}

/// Everything known about one vessel.
#[derive(Clone, Debug)]
pub struct VesselTrack {
    vessel_id: Mmsi,
    display_name: Option<String>,
    last_speed: Option<f64>,
    last_course: Option<f64>,
    points: Vec<TrackPoint>,
    /// Timestamps of `points`.
    seen: HashSet<NaiveDateTime>,
}

impl VesselTrack {
    pub fn new(vessel_id: Mmsi) -> Self {
        Self {
            vessel_id,
            display_name: None,
            last_speed: None,
            last_course: None,
            points: vec![],
            seen: HashSet::new(),
        }
    }

    pub fn vessel_id(&self) -> Mmsi {
        self.vessel_id
    }

    /// Last name reported for this vessel, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn last_speed(&self) -> Option<f64> {
        self.last_speed
    }

    pub fn last_course(&self) -> Option<f64> {
        self.last_course
    }

    /// Points in input order, unique by timestamp.
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Append `point` unless a point with the same timestamp exists.
    ///
    /// Returns whether the point was added.
    pub fn add_point(&mut self, point: TrackPoint) -> bool {
        if !self.seen.insert(point.time) {
            return false;
        }
        self.points.push(point);
        true
    }
}

/// A line of the feed which was rejected and should be reported.
#[derive(Debug)]
pub struct RejectedLine {
    /// 1-based line number.
    pub line: usize,
    pub error: RecordError,
}

/// All vessel tracks of one feed in order of first appearance.
#[derive(Debug, Default)]
pub struct TrackSet {
    tracks: Vec<VesselTrack>,
    /// Position of each vessel in `tracks`.
    index: HashMap<Mmsi, usize>,
    rejected: Vec<RejectedLine>,
    skipped: usize,
}

impl TrackSet {
    pub fn tracks(&self) -> &[VesselTrack] {
        &self.tracks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VesselTrack> {
        self.tracks.iter()
    }

    pub fn get(&self, vessel_id: Mmsi) -> Option<&VesselTrack> {
        self.index.get(&vessel_id).map(|&i| &self.tracks[i])
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Lines without a usable vessel identifier.
    pub fn rejected(&self) -> &[RejectedLine] {
        &self.rejected
    }

    /// Number of unparsable lines which were skipped silently.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<'a> IntoIterator for &'a TrackSet {
    type Item = &'a VesselTrack;
    type IntoIter = std::slice::Iter<'a, VesselTrack>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Folds position records into a [`TrackSet`].
pub struct TrackBuilder<'a> {
    known: &'a KnownVessels,
    set: TrackSet,
}

impl<'a> TrackBuilder<'a> {
    pub fn new(known: &'a KnownVessels) -> Self {
        Self {
            known,
            set: TrackSet::default(),
        }
    }

    /// Add the next `record` of the feed.
    pub fn push(&mut self, record: PositionRecord) {
        let known = self.known;
        let known_name = known.get(record.vessel_id);
        let i = match self.set.index.get(&record.vessel_id).copied() {
            Some(i) => i,
            None => {
                let i = self.set.tracks.len();
                self.set.index.insert(record.vessel_id, i);
                let mut track = VesselTrack::new(record.vessel_id);
                track.display_name = known_name.map(str::to_string);
                self.set.tracks.push(track);
                i
            }
        };
        let track = &mut self.set.tracks[i];

        if let Some((latitude, longitude)) = record.position() {
            let added = track.add_point(TrackPoint {
                time: record.timestamp,
                latitude,
                longitude,
            });
            if !added {
                log::trace!(
                    "dropping duplicate position of {} at {}",
                    record.vessel_id,
                    record.timestamp
                );
            }
        }

        if known_name.is_none() {
            if let Some(name) = record.name {
                track.display_name = Some(name);
            }
        }
        if let Some(speed) = record.speed_over_ground {
            track.last_speed = Some(speed);
        }
        if let Some(course) = record.course_over_ground {
            track.last_course = Some(course);
        }
    }

    /// Note that `line` could not be turned into a record.
    pub fn reject(&mut self, line: usize, error: RecordError) {
        match error {
            RecordError::Malformed(ref err) => {
                log::debug!("skipping line {line}: {err}");
                self.set.skipped += 1;
            }
            RecordError::MissingVesselId | RecordError::InvalidVesselId(_) => {
                log::warn!("rejecting line {line}: {error}");
                self.set.rejected.push(RejectedLine { line, error });
            }
        }
    }

    pub fn finish(self) -> TrackSet {
        self.set
    }
}

/// Read a complete position feed from `source`.
///
/// Every line holds one JSON record. Blank lines are ignored. Lines which
/// cannot be parsed are skipped, lines without a vessel identifier end up in
/// [`TrackSet::rejected`].
///
/// # Example
/// ```
/// # use ais_kml::{read_tracks, KnownVessels, Mmsi, TimeContext};
/// #
/// let feed = r#"
/// {"mmsi":1,"x":10,"y":20,"utc_hour":"01","utc_min":"02","timestamp":"03","name":"PEL"}
/// {"mmsi":1,"x":10,"y":20,"utc_hour":"01","utc_min":"02","timestamp":"03"}
/// "#;
/// let tracks = read_tracks(feed.as_bytes(), &KnownVessels::new(), &TimeContext::local())
///     .expect("reading from memory failed");
///
/// let track = tracks.get(Mmsi(1)).expect("vessel not found");
/// assert_eq!(track.display_name(), Some("PEL"));
/// assert_eq!(track.points().len(), 1);
/// ```
pub fn read_tracks(
    mut source: impl BufRead,
    known: &KnownVessels,
    time: &TimeContext,
) -> Result<TrackSet, Error> {
    let mut builder = TrackBuilder::new(known);
    let mut line = vec![];
    let mut number = 0;

    loop {
        line.clear();
        if source.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        number += 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match parse_line(&line, time) {
            Ok(record) => builder.push(record),
            Err(err) => builder.reject(number, err),
        }
    }

    let tracks = builder.finish();
    log::info!(
        "read {number} lines: {} vessels, {} rejected, {} skipped",
        tracks.len(),
        tracks.rejected().len(),
        tracks.skipped()
    );
    Ok(tracks)
}

/// Read the position feed at `path`.
///
/// A missing or unreadable file results in an empty [`TrackSet`].
pub fn load_tracks(path: &Path, known: &KnownVessels, time: &TimeContext) -> TrackSet {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            log::warn!("cannot open {}: {err}", path.display());
            return TrackSet::default();
        }
    };

    read_tracks(BufReader::new(file), known, time).unwrap_or_else(|err| {
        log::warn!("cannot read {}: {err}", path.display());
        TrackSet::default()
    })
}

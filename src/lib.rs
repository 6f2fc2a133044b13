// Copyright 2021, 2022, 2023 Viktor Reusch
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

//! Library for converting AIS position feeds to
//! [KML](https://developers.google.com/kml).
//!
//! It reads vessel positions, one JSON record per line, groups them into one
//! track per vessel, and writes the tracks as KML for visualization in Google
//! Earth. Additionally, it writes overview documents linking to other KML
//! resources.
//!
//! See [`convert`] for the simplest way to use this library.

use std::io::{self, BufRead};

use thiserror::Error;

pub mod config;
pub mod document;
pub mod record;
pub mod time;
pub mod track;

pub use config::{Config, KnownVessels, NetworkLinkConfig, TrackStyle, UrlPrefix};
pub use document::{write_network_links, write_tracks};
pub use record::{parse_line, Mmsi, PositionRecord, RecordError};
pub use time::TimeContext;
pub use track::{load_tracks, read_tracks, TrackBuilder, TrackPoint, TrackSet, VesselTrack};

/// Error returned from reading feeds and writing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the feed or writing the output failed.
    #[error("I/O failed: {0}")]
    Io(#[from] io::Error),
    /// KML writing failed.
    #[error("writing KML failed: {0}")]
    Kml(#[from] kml::Error),
}

/// Read a position feed and write a KML document of vessel tracks.
///
/// The feed is read from `source`, the resulting document is written to
/// `sink`. Names from `config` override names from the feed, icons are
/// referenced below `prefix`, and partial timestamps are resolved against
/// `time`.
///
/// If an error occurs, the function returns immediately. The `source` and
/// `sink` might have been modified in this case.
///
/// # Example
/// ```
/// # use ais_kml::{convert, Config, TimeContext, UrlPrefix};
/// #
/// let source = r#"
/// {"mmsi":1,"x":10,"y":20,"utc_hour":"01","utc_min":"02","timestamp":"03"}
/// {"mmsi":1,"x":11,"y":21,"utc_hour":"01","utc_min":"05","timestamp":"03"}
/// "#;
/// let mut sink = vec![];
///
/// convert(
///     source.as_bytes(),
///     &mut sink,
///     &Config::default(),
///     &UrlPrefix::default(),
///     &TimeContext::local(),
/// )
/// .expect("conversion failed");
///
/// let kml = String::from_utf8(sink).expect("KML data is not valid UTF-8");
/// assert!(kml.contains("<kml"));
/// assert!(kml.contains("Unidentified Vessel"));
/// assert!(kml.contains("10 20 0"));
/// assert!(kml.contains("11 21 0"));
/// ```
pub fn convert(
    source: impl BufRead,
    sink: impl io::Write,
    config: &Config,
    prefix: &UrlPrefix,
    time: &TimeContext,
) -> Result<(), Error> {
    let tracks = read_tracks(source, &config.known_vessels, time)?;
    write_tracks(&tracks, prefix, &config.style, sink)
}

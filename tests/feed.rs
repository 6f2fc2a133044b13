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

use std::collections::HashSet;

use ais_kml::time::format_timestamp;
use ais_kml::{read_tracks, write_tracks, KnownVessels, Mmsi, TimeContext, TrackSet, UrlPrefix};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

fn context(hour: u32) -> TimeContext {
    TimeContext::new(
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap(),
    )
}

fn read(feed: &str, known: &KnownVessels, time: &TimeContext) -> TrackSet {
    read_tracks(feed.as_bytes(), known, time).expect("reading from memory failed")
}

/// Timestamps and coordinates of all points of `vessel`.
fn points(tracks: &TrackSet, vessel: u32) -> Vec<(String, f64, f64)> {
    tracks
        .get(Mmsi(vessel))
        .expect("vessel not found")
        .points()
        .iter()
        .map(|p| (format_timestamp(p.time), p.latitude, p.longitude))
        .collect()
}

#[test]
fn two_reports_of_one_vessel() {
    let feed = concat!(
        r#"{"mmsi":1,"x":10,"y":20,"utc_hour":"01","utc_min":"02","timestamp":"03"}"#,
        "\n",
        r#"{"mmsi":1,"x":11,"y":21,"utc_hour":"01","utc_min":"05","timestamp":"03"}"#,
        "\n",
    );
    let tracks = read(feed, &KnownVessels::new(), &context(12));

    assert_eq!(tracks.len(), 1);
    assert_eq!(
        points(&tracks, 1),
        vec![
            ("2024-01-01T01:02:03Z".to_string(), 20.0, 10.0),
            ("2024-01-01T01:05:03Z".to_string(), 21.0, 11.0),
        ]
    );
}

#[test]
fn report_from_later_hour_is_yesterday() {
    let feed = concat!(
        r#"{"mmsi":7,"x":1,"y":2,"utc_hour":23,"utc_min":59,"timestamp":58}"#,
        "\n",
        r#"{"mmsi":7,"x":1,"y":2,"utc_hour":0,"utc_min":0,"timestamp":1}"#,
        "\n",
    );
    let tracks = read(feed, &KnownVessels::new(), &context(0));

    assert_eq!(
        points(&tracks, 7),
        vec![
            ("2023-12-31T23:59:58Z".to_string(), 2.0, 1.0),
            ("2024-01-01T00:00:01Z".to_string(), 2.0, 1.0),
        ]
    );
}

#[test]
fn retransmissions_are_dropped() {
    let mut feed = String::new();
    for i in 0..50 {
        let vessel = i % 3;
        let minute = i % 7;
        feed.push_str(&format!(
            "{{\"mmsi\":{vessel},\"x\":{i},\"y\":{i},\"utc_hour\":1,\"utc_min\":{minute},\"timestamp\":0}}\n"
        ));
    }
    let tracks = read(&feed, &KnownVessels::new(), &context(12));

    assert_eq!(tracks.len(), 3);
    for track in &tracks {
        let times: HashSet<_> = track.points().iter().map(|p| p.time).collect();
        assert_eq!(times.len(), track.points().len());
        assert_eq!(track.points().len(), 7);
    }
    // First report of vessel 0 at minute 0 is i = 0, the next one is i = 21.
    assert_eq!(points(&tracks, 0)[0].1, 0.0);
}

#[test]
fn rereading_is_deterministic() {
    let feed = concat!(
        r#"{"mmsi":5,"x":1,"y":2,"name":"A","sog":1}"#,
        "\n",
        r#"{"mmsi":6,"x":3,"y":4,"utc_hour":2,"utc_min":0,"timestamp":0}"#,
        "\n",
        r#"{"mmsi":5,"cog":"45.5"}"#,
        "\n",
    );
    let known = KnownVessels::new();
    let first = read(feed, &known, &context(12));
    let second = read(feed, &known, &context(12));

    for vessel in [5, 6] {
        assert_eq!(points(&first, vessel), points(&second, vessel));
    }
    let track = first.get(Mmsi(5)).unwrap();
    assert_eq!(track.display_name(), Some("A"));
    assert_eq!(track.last_speed(), Some(1.0));
    assert_eq!(track.last_course(), Some(45.5));
}

#[test]
fn known_names_in_document() {
    let feed = concat!(
        r#"{"mmsi":367020910,"x":-80,"y":25,"name":"F G WALTON SMITH"}"#,
        "\n",
        r#"{"mmsi":123456789,"x":-81,"y":26}"#,
        "\n",
        r#"{"mmsi":123456789,"name":"PEL"}"#,
        "\n",
        r#"{"mmsi":123456789}"#,
        "\n",
    );
    let known: KnownVessels = [(Mmsi(367020910), "WS")].into_iter().collect();
    let tracks = read(feed, &known, &context(12));

    let mut sink = vec![];
    write_tracks(&tracks, &UrlPrefix::default(), &Default::default(), &mut sink)
        .expect("writing to memory failed");
    let kml = String::from_utf8(sink).expect("KML data is not valid UTF-8");

    assert!(kml.contains("<name>WS</name>"));
    assert!(!kml.contains("WALTON"));
    assert!(kml.contains("<name>PEL</name>"));
    assert!(!kml.contains("Unidentified Vessel"));
    assert!(kml.find("<name>WS</name>").unwrap() < kml.find("<name>PEL</name>").unwrap());
}

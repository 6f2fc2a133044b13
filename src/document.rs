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

//! Writing of the KML documents.

use std::collections::HashMap;
use std::io;

use kml::types::{Element, Placemark};
use kml::{Kml, KmlDocument, KmlVersion, KmlWriter};

use crate::config::{NetworkLinkConfig, TrackStyle, UrlPrefix};
use crate::time::format_timestamp;
use crate::track::{TrackSet, VesselTrack};
use crate::Error;

/// This line needs to be prepended to the KML output.
const XML_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
/// Namespace of plain KML.
const KML_NAMESPACE: (&str, &str) = ("xmlns", "http://www.opengis.net/kml/2.2");
/// Namespace of the Google extensions, needed for `gx:Track`.
const GX_NAMESPACE: (&str, &str) = ("xmlns:gx", "http://www.google.com/kml/ext/2.2");
/// Name of vessels which never reported one.
pub const UNIDENTIFIED_VESSEL: &str = "Unidentified Vessel";

/// Use double precision for coordinate values.
type CoordValue = f64;

/// Write a KML document with one track per vessel in `tracks`.
///
/// Each vessel becomes a _Placemark_ holding its last known name, speed and
/// course as extended data and its positions as `gx:Track`. The icon of
/// `style` is referenced below `prefix`.
pub fn write_tracks(
    tracks: &TrackSet,
    prefix: &UrlPrefix,
    style: &TrackStyle,
    sink: impl io::Write,
) -> Result<(), Error> {
    let mut elements = vec![Kml::Element(track_style(prefix, style))];
    for track in tracks {
        elements.push(vessel_placemark(track, style));
    }

    write_document(&[KML_NAMESPACE, GX_NAMESPACE], elements, sink)
}

/// Write a KML document with a _NetworkLink_ for each entry of `links`.
///
/// The document is named after `title` and the host of `prefix`, all link
/// targets are resolved below `prefix`.
pub fn write_network_links(
    title: &str,
    prefix: &UrlPrefix,
    links: &[NetworkLinkConfig],
    sink: impl io::Write,
) -> Result<(), Error> {
    let mut elements = vec![simple_kelem(
        "name",
        format!("{title} ({})", prefix.host_label()),
    )];
    for link in links {
        elements.push(Kml::Element(network_link(prefix, link)));
    }

    write_document(&[KML_NAMESPACE], elements, sink)
}

/// Wrap `elements` in a _Document_ and write it to `sink`.
///
/// `kml` keeps the attributes of the `<kml>` tag in a `HashMap`, so the order
/// of the namespace declarations may change between runs.
fn write_document(
    namespaces: &[(&str, &str)],
    elements: Vec<Kml<CoordValue>>,
    mut sink: impl io::Write,
) -> Result<(), Error> {
    let document = Kml::Document {
        elements,
        attrs: Default::default(),
    };
    let namespaces = namespaces
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let kml = Kml::<CoordValue>::KmlDocument(KmlDocument {
        version: KmlVersion::V22,
        attrs: namespaces,
        elements: vec![document],
    });

    writeln!(&mut sink, "{XML_HEAD}")?;
    let mut writer = KmlWriter::from_writer(&mut sink);
    writer.write(&kml)?;
    writeln!(&mut sink)?;

    Ok(())
}

/// Create the shared _Style_ of all vessel placemarks.
fn track_style(prefix: &UrlPrefix, style: &TrackStyle) -> Element {
    let label = parent_element(
        "LabelStyle",
        vec![simple_element("scale", style.label_scale.to_string())],
    );
    let icon = parent_element(
        "IconStyle",
        vec![
            simple_element("scale", style.icon_scale.to_string()),
            parent_element(
                "Icon",
                vec![simple_element("href", prefix.join(&style.icon_path))],
            ),
        ],
    );

    Element {
        name: "Style".to_string(),
        attrs: HashMap::from([("id".to_string(), style.id.clone())]),
        children: vec![label, icon],
        ..Default::default()
    }
}

/// Create the _Placemark_ of one vessel.
///
/// Vessels without a name are listed by MMSI and marked as unidentified.
fn vessel_placemark(track: &VesselTrack, style: &TrackStyle) -> Kml<CoordValue> {
    let mut data = vec![];
    let name = match track.display_name() {
        Some(name) => {
            data.push(data_element("mmsi", track.vessel_id().to_string()));
            name.to_string()
        }
        None => {
            data.push(data_element("name", UNIDENTIFIED_VESSEL));
            track.vessel_id().to_string()
        }
    };
    if let Some(speed) = track.last_speed() {
        data.push(data_element("sog", speed.to_string()));
    }
    if let Some(course) = track.last_course() {
        data.push(data_element("cog", course.to_string()));
    }

    let mut coords = vec![];
    for point in track.points() {
        coords.push(simple_element("when", format_timestamp(point.time)));
        coords.push(simple_element(
            "gx:coord",
            format!("{} {} 0", point.longitude, point.latitude),
        ));
    }

    Kml::Placemark(Placemark {
        name: Some(name),
        children: vec![
            simple_element("styleUrl", format!("#{}", style.id)),
            parent_element("ExtendedData", data),
            parent_element("gx:Track", coords),
        ],
        ..Default::default()
    })
}

/// Create a _NetworkLink_ to `link` below `prefix`.
fn network_link(prefix: &UrlPrefix, link: &NetworkLinkConfig) -> Element {
    let mut children = vec![];
    if let Some(ref name) = link.name {
        children.push(simple_element("name", name.as_str()));
    }
    if let Some(ref description) = link.description {
        children.push(simple_element("description", description.as_str()));
    }
    children.push(parent_element(
        "Link",
        vec![simple_element("href", prefix.join(&link.href))],
    ));

    parent_element("NetworkLink", children)
}

/// Create an _ExtendedData_ entry.
fn data_element(name: impl Into<String>, value: impl Into<String>) -> Element {
    Element {
        name: "Data".to_string(),
        attrs: HashMap::from([("name".to_string(), name.into())]),
        children: vec![simple_element("value", value)],
        ..Default::default()
    }
}

/// Create a simple KML element with `name` and `content`.
fn simple_kelem(name: impl Into<String>, content: impl Into<String>) -> Kml<CoordValue> {
    Kml::Element(simple_element(name, content))
}

/// Create a simple KML element with `name` and `content`.
fn simple_element(name: impl Into<String>, content: impl Into<String>) -> Element {
    Element {
        name: name.into(),
        content: Some(content.into()),
        ..Default::default()
    }
}

/// Create a KML element with `name` containing `children`.
fn parent_element(name: impl Into<String>, children: Vec<Element>) -> Element {
    Element {
        name: name.into(),
        children,
        ..Default::default()
    }
}

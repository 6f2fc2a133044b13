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

//! Configuration of the generated documents.
//!
//! Every type here can be deserialized, so a complete [`Config`] can be read
//! from a configuration file. Missing sections fall back to their defaults.

use std::collections::HashMap;
use std::num::ParseIntError;
use std::path::PathBuf;

use serde::Deserialize;

use crate::record::Mmsi;

/// Prefix used when the request does not tell scheme and host.
pub const DEFAULT_PREFIX: &str = "https://glidervm3.ceoas.oregonstate.edu";
/// Host label used when the request does not tell the host.
const UNKNOWN_HOST: &str = "UNKNOWN";

/// Root of the configuration file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Position feed read by default.
    pub input: PathBuf,
    /// URL prefix used outside of a request context.
    pub default_prefix: String,
    pub known_vessels: KnownVessels,
    pub style: TrackStyle,
    pub links: LinksConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("ais.json"),
            default_prefix: DEFAULT_PREFIX.to_string(),
            known_vessels: Default::default(),
            style: Default::default(),
            links: Default::default(),
        }
    }
}

/// Display names which take precedence over names from the feed.
///
/// In the configuration file, this is a table keyed by MMSI:
/// ```toml
/// [known_vessels]
/// 367652000 = "PEL"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub struct KnownVessels(HashMap<Mmsi, String>);

impl KnownVessels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mmsi: Mmsi, name: impl Into<String>) {
        self.0.insert(mmsi, name.into());
    }

    pub fn get(&self, mmsi: Mmsi) -> Option<&str> {
        self.0.get(&mmsi).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<HashMap<String, String>> for KnownVessels {
    type Error = ParseIntError;

    fn try_from(table: HashMap<String, String>) -> Result<Self, Self::Error> {
        table
            .into_iter()
            .map(|(mmsi, name)| mmsi.parse().map(|mmsi| (mmsi, name)))
            .collect::<Result<HashMap<Mmsi, String>, _>>()
            .map(KnownVessels)
    }
}

impl<N: Into<String>> FromIterator<(Mmsi, N)> for KnownVessels {
    fn from_iter<I: IntoIterator<Item = (Mmsi, N)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(m, n)| (m, n.into())).collect())
    }
}

/// Shared style of all vessel placemarks.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackStyle {
    /// Referenced as `#id` from each placemark.
    pub id: String,
    /// Path of the ship icon below the URL prefix.
    pub icon_path: String,
    pub icon_scale: f64,
    pub label_scale: f64,
}

impl Default for TrackStyle {
    fn default() -> Self {
        Self {
            id: "drifterStyle".to_string(),
            icon_path: "/Shore/kml_code/icons/icon_ship.png".to_string(),
            icon_scale: 0.2,
            label_scale: 0.2,
        }
    }
}

/// Overview document of processed data products.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    /// Document name. The host label is appended in parentheses.
    pub title: String,
    #[serde(rename = "link")]
    pub links: Vec<NetworkLinkConfig>,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            title: "SUNRISE".to_string(),
            links: vec![],
        }
    }
}

/// A single KML _NetworkLink_.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NetworkLinkConfig {
    /// Path below the URL prefix.
    pub href: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Scheme and host under which generated URLs are reachable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlPrefix {
    base: String,
    host: Option<String>,
}

impl UrlPrefix {
    /// Use `scheme://host` if both are given, `default` otherwise.
    pub fn resolve(scheme: Option<&str>, host: Option<&str>, default: &str) -> Self {
        let scheme = scheme.map(str::trim).filter(|s| !s.is_empty());
        let host = host.map(str::trim).filter(|h| !h.is_empty());
        match (scheme, host) {
            (Some(scheme), Some(host)) => Self {
                base: format!("{scheme}://{host}"),
                host: Some(host.to_string()),
            },
            _ => Self {
                base: default.trim_end_matches('/').to_string(),
                host: None,
            },
        }
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Append `path` to this prefix.
    pub fn join(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base.trim_end_matches('/'), path)
    }

    /// First DNS label of the request host.
    pub fn host_label(&self) -> &str {
        self.host
            .as_deref()
            .and_then(|h| h.split('.').next())
            .filter(|l| !l.is_empty())
            .unwrap_or(UNKNOWN_HOST)
    }
}

impl Default for UrlPrefix {
    fn default() -> Self {
        Self::resolve(None, None, DEFAULT_PREFIX)
    }
}

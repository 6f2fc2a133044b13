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

//! Loading of the TOML configuration file.

use std::fs;
use std::path::Path;

use ais_kml::Config;
use anyhow::{Context, Result};

pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    log::debug!(
        "loaded {} known vessels and {} links from {:?}",
        config.known_vessels.len(),
        config.links.links.len(),
        path
    );
    Ok(config)
}

//! Custom figment providers.

use crate::Config;
use figment::{
    Metadata, Profile, Provider,
    providers::{Format, Toml},
    value::{Dict, Map, Value},
};
use std::path::PathBuf;

/// Reads `[profile.<name>]` tables from a TOML file and exposes each of them as a figment
/// profile.
///
/// A missing file provides no data.
pub(crate) struct ProfileTomlProvider {
    path: PathBuf,
}

impl ProfileTomlProvider {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Provider for ProfileTomlProvider {
    fn metadata(&self) -> Metadata {
        Metadata::named(format!("TOML file `{}`", self.path.display()))
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let mut profiles = Map::new();
        let sections = Toml::file(&self.path).nested().data()?;
        for (section, dict) in sections {
            if section.to_string() != Config::PROFILE_SECTION {
                warn!(path = %self.path.display(), %section, "ignoring unknown config section");
                continue;
            }
            for (name, value) in dict {
                match value {
                    Value::Dict(_, dict) => {
                        profiles.insert(Profile::new(&name), dict);
                    }
                    other => {
                        return Err(figment::Error::from(format!(
                            "expected a table for profile `{name}`, found {}",
                            other.to_actual()
                        )));
                    }
                }
            }
        }
        Ok(profiles)
    }
}

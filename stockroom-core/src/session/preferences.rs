//! Display preferences persisted next to the session token

use super::store::ClientStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const THEME_KEY: &str = "prefs.theme";
const DENSITY_KEY: &str = "prefs.density";

/// Color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Table and form density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    #[default]
    Comfortable,
    Compact,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme \"{}\" (expected light or dark)", other)),
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Density::Comfortable => "comfortable",
            Density::Compact => "compact",
        })
    }
}

impl FromStr for Density {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "comfortable" => Ok(Density::Comfortable),
            "compact" => Ok(Density::Compact),
            other => {
                Err(format!("unknown density \"{}\" (expected comfortable or compact)", other))
            }
        }
    }
}

/// User display preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub density: Density,
}

impl Preferences {
    /// Load from the store; unknown or missing values fall back to defaults
    pub async fn load(store: &dyn ClientStore) -> Result<Self> {
        let mut prefs = Self::default();
        if let Some(theme) = store.get(THEME_KEY).await? {
            prefs.theme = theme.parse().unwrap_or_else(|e| {
                log::warn!("Ignoring stored theme: {}", e);
                Theme::default()
            });
        }
        if let Some(density) = store.get(DENSITY_KEY).await? {
            prefs.density = density.parse().unwrap_or_else(|e| {
                log::warn!("Ignoring stored density: {}", e);
                Density::default()
            });
        }
        Ok(prefs)
    }

    pub async fn save(&self, store: &dyn ClientStore) -> Result<()> {
        store.set(THEME_KEY, &self.theme.to_string()).await?;
        store.set(DENSITY_KEY, &self.density.to_string()).await?;
        Ok(())
    }
}

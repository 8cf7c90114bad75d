use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HoshiError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoshiConfig {
    pub watchlist: WatchlistConfig,
    pub player: PlayerConfig,
    pub suggest: SuggestConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistConfig {
    /// Key under which the watchlist is persisted.
    pub storage_key: String,
    pub glyph_present: String,
    pub glyph_absent: String,
    pub add_label: String,
    pub remove_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub hide_delay_ms: u64,
    pub button_skip_secs: f64,
    pub key_skip_secs: f64,
    pub speeds: Vec<f64>,
    pub default_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestConfig {
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub filter: String,
}

impl HoshiConfig {
    /// Merge a (possibly partial) TOML override over the built-in defaults.
    ///
    /// Keys missing from `text` keep their default value.
    pub fn from_override(text: &str) -> Result<Self, HoshiError> {
        let mut base: toml::Table =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| HoshiError::Config(e.to_string()))?;
        let user: toml::Table =
            toml::from_str(text).map_err(|e| HoshiError::Config(e.to_string()))?;
        merge(&mut base, user);

        let config: HoshiConfig = toml::Value::Table(base)
            .try_into()
            .map_err(|e: toml::de::Error| HoshiError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HoshiError> {
        let player = &self.player;
        if player.speeds.is_empty() {
            return Err(HoshiError::Config("player.speeds must not be empty".into()));
        }
        if player
            .speeds
            .iter()
            .any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err(HoshiError::Config("player.speeds must be positive".into()));
        }
        if !player.speeds.contains(&player.default_speed) {
            return Err(HoshiError::Config(format!(
                "player.default_speed {} is not one of player.speeds",
                player.default_speed
            )));
        }
        if player.hide_delay_ms == 0 {
            return Err(HoshiError::Config("player.hide_delay_ms must be > 0".into()));
        }
        if !(player.button_skip_secs > 0.0 && player.key_skip_secs > 0.0) {
            return Err(HoshiError::Config("player skip steps must be > 0".into()));
        }
        if self.watchlist.storage_key.is_empty() {
            return Err(HoshiError::Config("watchlist.storage_key must not be empty".into()));
        }
        Ok(())
    }
}

impl PlayerConfig {
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    /// Replace `speeds` with the rates a page's speed menu actually offers.
    ///
    /// Invalid rates are dropped. The default speed is kept when offered,
    /// otherwise the first offered rate becomes the default. With nothing
    /// valid offered the config is unchanged.
    pub fn with_offered_speeds(mut self, offered: Vec<f64>) -> Self {
        let offered: Vec<f64> = offered
            .into_iter()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .collect();
        let Some(&first) = offered.first() else {
            return self;
        };
        if !offered.contains(&self.default_speed) {
            self.default_speed = first;
        }
        self.speeds = offered;
        self
    }
}

impl Default for HoshiConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

fn merge(base: &mut toml::Table, user: toml::Table) {
    for (key, value) in user {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

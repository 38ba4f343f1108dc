//! Session configuration.
//!
//! Defaults suit an interactive session. Embedders can deserialize a
//! [`SessionConfig`] from their own configuration or overlay the process
//! environment with [`SessionConfig::from_env`].

use std::env;

use serde::Deserialize;

/// Tunables for one UI session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Prefix for generated node ids (`w1`, `w2`, ...).
    pub id_prefix: String,
    /// Draw ids from the process-wide generator instead of a private one.
    pub shared_ids: bool,
    /// Slot increment used while a tree is already on the client.
    pub interactive_growth: usize,
    /// Smallest physical child array.
    pub min_child_capacity: usize,
    /// Populate uncached virtual tree items before creating them on the client.
    pub materialize_on_render: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id_prefix: "w".to_string(),
            shared_ids: false,
            interactive_growth: 4,
            min_child_capacity: 4,
            materialize_on_render: true,
        }
    }
}

impl SessionConfig {
    /// Defaults overlaid with `SPARK_REMOTE_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(prefix) = env::var("SPARK_REMOTE_ID_PREFIX") {
            if !prefix.trim().is_empty() {
                config.id_prefix = prefix.trim().to_string();
            }
        }
        if let Some(shared) = env_flag("SPARK_REMOTE_SHARED_IDS") {
            config.shared_ids = shared;
        }
        if let Some(materialize) = env_flag("SPARK_REMOTE_MATERIALIZE_ON_RENDER") {
            config.materialize_on_render = materialize;
        }
        config
    }

    pub(crate) fn growth(&self) -> Growth {
        Growth {
            increment: self.interactive_growth.max(1),
            floor: self.min_child_capacity.max(1),
        }
    }
}

/// Child array growth parameters derived from the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Growth {
    pub increment: usize,
    pub floor: usize,
}

impl Default for Growth {
    fn default() -> Self {
        SessionConfig::default().growth()
    }
}

/// Parse a boolean-like flag value.
///
/// Truthy: `1`, `true`, `yes`, `on`. Falsy: `0`, `false`, `no`, `off`, empty.
/// Case-insensitive, surrounding whitespace ignored.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    let parsed = parse_env_flag(&value);
    if parsed.is_none() {
        tracing::warn!("Ignoring unrecognized value for {}: {:?}", name, value);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_flag() {
        assert_eq!(parse_env_flag(" YES "), Some(true));
        assert_eq!(parse_env_flag("off"), Some(false));
        assert_eq!(parse_env_flag(""), Some(false));
        assert_eq!(parse_env_flag("maybe"), None);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"idPrefix":"n","interactiveGrowth":8}"#).unwrap();
        assert_eq!(config.id_prefix, "n");
        assert_eq!(config.interactive_growth, 8);
        assert_eq!(config.min_child_capacity, 4);
        assert!(config.materialize_on_render);
    }

    #[test]
    fn test_growth_never_zero() {
        let config = SessionConfig {
            interactive_growth: 0,
            min_child_capacity: 0,
            ..SessionConfig::default()
        };
        let growth = config.growth();
        assert_eq!(growth.increment, 1);
        assert_eq!(growth.floor, 1);
    }
}

//! Configuration loading and management.

use std::path::{Path, PathBuf};

use agree_core::{AnnotatorId, DEFAULT_ROSTER, MergeOptions, Roster, RosterError};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Merged annotations file read when no input is given.
    pub input_path: PathBuf,

    /// Expected annotator IDs. Accepts a list of scalars or a comma-separated
    /// string, so `AGREE_ROSTER=1,2,3` and `roster = [1, 2, 3]` both work.
    #[serde(deserialize_with = "deserialize_roster")]
    pub roster: Vec<String>,

    /// Column names treated as the item ID when merging exports.
    pub id_aliases: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("output").join("merged_by_id.json"),
            roster: DEFAULT_ROSTER.iter().map(ToString::to_string).collect(),
            id_aliases: MergeOptions::default().id_aliases,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (AGREE_*)
        figment = figment.merge(Env::prefixed("AGREE_"));

        figment.extract()
    }

    /// Builds the roster, preferring `overrides` when given.
    pub fn roster(&self, overrides: Option<&[String]>) -> Result<Roster, RosterError> {
        Roster::new(overrides.unwrap_or(self.roster.as_slice()))
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            id_aliases: self.id_aliases.clone(),
        }
    }
}

fn deserialize_roster<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    fn push_ids<E: serde::de::Error>(value: &Value, ids: &mut Vec<String>) -> Result<(), E> {
        match value {
            Value::String(s) => {
                ids.extend(
                    s.split(',')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(ToString::to_string),
                );
                Ok(())
            }
            Value::Array(items) => items.iter().try_for_each(|item| match item {
                Value::Array(_) => Err(E::custom("nested lists are not annotator ids")),
                other => push_ids(other, ids),
            }),
            other => {
                let id = AnnotatorId::from_scalar(other)
                    .ok_or_else(|| E::custom(format!("invalid annotator id: {other}")))?;
                ids.push(id.into());
                Ok(())
            }
        }
    }

    let value = Value::deserialize(deserializer)?;
    let mut ids = Vec::new();
    push_ids::<D::Error>(&value, &mut ids)?;
    Ok(ids)
}

/// Returns the platform-specific config directory for agree.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("agree"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_three_annotators() {
        let config = Config::default();
        assert_eq!(config.roster, ["1", "2", "3"]);
        assert_eq!(config.input_path, Path::new("output/merged_by_id.json"));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("agree.toml");
        std::fs::write(
            &path,
            "input_path = \"data/merged.json\"\nroster = [\"a\", \"b\"]\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.input_path, Path::new("data/merged.json"));
        assert_eq!(config.roster, ["a", "b"]);
        assert_eq!(config.id_aliases, MergeOptions::default().id_aliases);
    }

    #[test]
    fn test_roster_from_env_accepts_plain_ids() {
        figment::Jail::expect_with(|jail| {
            let dir = jail.directory().display().to_string();
            jail.set_env("XDG_CONFIG_HOME", dir);
            jail.set_env("AGREE_ROSTER", "1,2,3");
            let config = Config::load_from(None)?;
            assert_eq!(config.roster, ["1", "2", "3"]);
            assert_eq!(config.roster(None).unwrap(), Roster::default());

            jail.set_env("AGREE_ROSTER", "[4,5,6]");
            let config = Config::load_from(None)?;
            assert_eq!(config.roster, ["4", "5", "6"]);

            jail.set_env("AGREE_ROSTER", " a , b ");
            let config = Config::load_from(None)?;
            assert_eq!(config.roster, ["a", "b"]);
            Ok(())
        });
    }

    #[test]
    fn test_numeric_roster_in_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("agree.toml");
        std::fs::write(&path, "roster = [1, 2.0, \"x\"]\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.roster, ["1", "2", "x"]);
    }

    #[test]
    fn test_roster_override_wins() {
        let config = Config::default();
        let overrides = vec!["x".to_string(), "y".to_string()];
        let roster = config.roster(Some(&overrides)).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(config.roster(None).unwrap(), Roster::default());
    }

    #[test]
    fn test_empty_roster_is_rejected() {
        let config = Config {
            roster: Vec::new(),
            ..Config::default()
        };
        assert_eq!(config.roster(None), Err(RosterError::Empty));
    }
}

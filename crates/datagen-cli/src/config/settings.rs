use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use datagen_core::GeneratorOptions;
use datagen_generate::ResourceBinding;
use datagen_store::{CsvSpec, SeedConfig};

use super::atomic::write_bytes_atomic;
use super::ConfigResult;

pub const DEFAULT_DB_PATH: &str = "datagen.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// SQL script run before seeding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            schema: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub generator: GeneratorOptions,
    pub store: StoreConfig,
    pub resources: Vec<ResourceBinding>,
    pub seeds: Vec<SeedConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generator: GeneratorOptions::default(),
            store: StoreConfig::default(),
            resources: vec![
                ResourceBinding::new("digit", "int_range", "0..10"),
                ResourceBinding::new("dice", "int_range", "1|2|3|4|5|6"),
                ResourceBinding::new("year", "int_range", "1950..2025!1984"),
                ResourceBinding::new("phone", "pattern", "+33 6 00..99 00..99 00..99 00..99"),
                ResourceBinding::new("time", "pattern", "00..24:00..60"),
                ResourceBinding::new("number", "union", "digit|dice|year"),
                ResourceBinding::new("first_name", "random_row", "person_prop:type=first_name"),
            ],
            seeds: vec![SeedConfig {
                name: "[fr] person.first_name".to_string(),
                prop_table: "person".to_string(),
                prop_type: "first_name".to_string(),
                locale: "fr-FR".to_string(),
                path: PathBuf::from("seeds/first_names.csv"),
                csv: CsvSpec {
                    skip_header: true,
                    delimiter: ';',
                    column: 0,
                },
            }],
        }
    }
}

impl Config {
    /// Read the optional schema script named by `[store] schema`.
    pub fn schema_script(&self) -> ConfigResult<Option<String>> {
        match &self.store.schema {
            Some(path) => Ok(Some(std::fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }
}

pub fn load_or_create_config(path: &Path) -> ConfigResult<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        return Ok(config);
    }

    let config = Config::default();
    save_config(path, &config)?;
    Ok(config)
}

pub fn reset_config(path: &Path) -> ConfigResult<Config> {
    let config = Config::default();
    save_config(path, &config)?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &Config) -> ConfigResult<()> {
    let encoded = toml::to_string_pretty(config)?;
    write_bytes_atomic(path, encoded.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("datagen-cli-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn missing_config_is_created_with_defaults() {
        let path = temp_config_path("datagen.toml");

        let config = load_or_create_config(&path).expect("create config");
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = load_or_create_config(&path).expect("reload config");
        assert_eq!(reloaded, config);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let path = temp_config_path("partial.toml");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
        std::fs::write(
            &path,
            r#"
            [generator]
            enforce_uniqueness = true

            [[resources]]
            name = "code"
            generator = "pattern"
            args = "C-000..999"
            "#,
        )
        .expect("write config");

        let config = load_or_create_config(&path).expect("load config");
        assert!(config.generator.enforce_uniqueness);
        assert_eq!(config.generator.max_unique_retries, 20);
        assert_eq!(config.store.path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.resources.len(), 1);
        assert_eq!(config.resources[0].args, "C-000..999");
        assert_eq!(config.seeds, Config::default().seeds);
    }

    #[test]
    fn reset_overwrites_existing_config() {
        let path = temp_config_path("reset.toml");
        let mut config = load_or_create_config(&path).expect("create config");
        config.resources.clear();
        save_config(&path, &config).expect("save config");
        assert!(load_or_create_config(&path).expect("load").resources.is_empty());

        let reset = reset_config(&path).expect("reset config");
        assert_eq!(reset, Config::default());
        assert_eq!(load_or_create_config(&path).expect("load"), Config::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let path = temp_config_path("broken.toml");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
        std::fs::write(&path, "[[resources]]\nname = 3\n").expect("write config");

        assert!(matches!(
            load_or_create_config(&path),
            Err(ConfigError::TomlDecode(_))
        ));
    }
}

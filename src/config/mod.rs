use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod validator;

use crate::cli::Cli;

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    pub schemas: SchemaSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaSettings {
    /// Directory holding `{protocol}_{type}.json|yaml` schema documents
    pub dir: PathBuf,
    /// Recursion cap for `$ref` resolution
    pub max_ref_depth: usize,
    /// Wrap the file provider in the per-(protocol, type) cache
    pub cache: bool,
}

/// Static resource catalogue offered to reference pickers
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct CatalogSettings {
    #[serde(default)]
    pub entrypoints: Vec<String>,
    #[serde(default)]
    pub resources: Vec<CatalogResource>,
}

/// Protocol and type stay plain strings so the validator can report bad values
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogResource {
    pub protocol: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_provider() -> String {
    "file".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_source() -> String {
    "database".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (includes config file and CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let config_path = &cli.config;
        let root = config_path
            .parent()
            .and_then(|p| p.to_str())
            .filter(|p| !p.is_empty())
            .unwrap_or(".");

        let s = Self::builder(config_path.clone())?;
        let mut settings: Settings = s.try_deserialize()?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.load_external_configs(root)?;
        settings.validate()?;

        Ok(settings)
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let config_path = std::path::Path::new(root).join("proxyform");
        let s = Self::builder(config_path)?;

        let mut settings: Settings = s.try_deserialize()?;

        settings.load_external_configs(root)?;
        settings.validate()?;

        Ok(settings)
    }

    fn builder(config_path: PathBuf) -> Result<Config, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .set_default("schemas.dir", "schemas")?
            .set_default("schemas.max_ref_depth", 64)?
            .set_default("schemas.cache", true)?
            .build()?;
        Ok(s)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!("Configuration validation failed:\n{}", error_messages.join("\n"))
        })
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.schemas_dir {
            self.schemas.dir = dir.clone();
        }
    }

    fn load_external_configs(&mut self, root: &str) -> Result<(), anyhow::Error> {
        self.load_catalog_from_dir(&format!("{}/catalog", root))?;
        Ok(())
    }

    fn load_catalog_from_dir(&mut self, path: &str) -> Result<(), anyhow::Error> {
        let pattern = format!("{}/*", path);
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) => {
                    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                        if matches!(ext, "json" | "yaml" | "yml") {
                            let content = std::fs::read_to_string(&path)?;
                            let resources: Vec<CatalogResource> = if ext == "json" {
                                serde_json::from_str(&content)?
                            } else {
                                serde_yaml::from_str(&content)?
                            };
                            tracing::debug!("Loaded {} catalog entries from {}", resources.len(), path.display());
                            self.catalog.resources.extend(resources);
                        }
                    }
                }
                Err(e) => tracing::warn!("Failed to read glob entry: {}", e),
            }
        }
        Ok(())
    }
}

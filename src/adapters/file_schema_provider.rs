use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::{Protocol, ResourceType, SchemaProvider};

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Reads schema documents named `{protocol}_{type}.{json,yaml,yml}` from a directory
pub struct FileSchemaProvider {
    dir: PathBuf,
}

impl FileSchemaProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stem of the schema file for a combination
    pub fn file_stem(protocol: Protocol, resource_type: ResourceType) -> String {
        format!("{}_{}", protocol, resource_type)
    }

    /// Every valid `{protocol}_{type}` combination with a schema file present
    pub fn available(&self) -> anyhow::Result<Vec<(Protocol, ResourceType)>> {
        let pattern = format!("{}/*_*", self.dir.display());
        let mut found = Vec::new();

        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) => {
                    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                        continue;
                    };
                    if !EXTENSIONS.contains(&ext) {
                        continue;
                    }
                    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                        continue;
                    };
                    if let Some(pair) = parse_stem(stem) {
                        if !found.contains(&pair) {
                            found.push(pair);
                        }
                    }
                }
                Err(e) => tracing::warn!("Failed to read glob entry: {}", e),
            }
        }

        found.sort();
        Ok(found)
    }

    async fn locate(&self, stem: &str) -> Option<(PathBuf, &'static str)> {
        for ext in EXTENSIONS {
            let path = self.dir.join(format!("{}.{}", stem, ext));
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some((path, ext));
            }
        }
        None
    }
}

fn parse_stem(stem: &str) -> Option<(Protocol, ResourceType)> {
    let (protocol, resource_type) = stem.split_once('_')?;
    let protocol: Protocol = protocol.parse().ok()?;
    let resource_type: ResourceType = resource_type.parse().ok()?;
    protocol.supports(resource_type).then_some((protocol, resource_type))
}

#[async_trait]
impl SchemaProvider for FileSchemaProvider {
    async fn fetch_schema(&self, protocol: Protocol, resource_type: ResourceType) -> anyhow::Result<Value> {
        if !protocol.supports(resource_type) {
            bail!("{} does not support {}", protocol, resource_type);
        }

        let stem = Self::file_stem(protocol, resource_type);
        let Some((path, ext)) = self.locate(&stem).await else {
            bail!("No schema file for {} in {}", stem, self.dir.display());
        };

        debug!("Reading schema {}", path.display());
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let schema: Value = if ext == "json" {
            serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))?
        } else {
            serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {}", path.display()))?
        };
        Ok(schema)
    }
}

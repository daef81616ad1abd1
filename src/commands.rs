//! Subcommand execution for the `proxyform` binary

use anyhow::Context;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::adapters::{CachedSchemaProvider, FileSchemaProvider, StaticCatalog};
use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::domain::{Protocol, ResourceType, SchemaProvider};
use crate::form::resolver;
use crate::form::{value_store, FieldPath, FormMode, FormSession, FormView, PickerSource};
use crate::rules::RuleBuilder;

/// Run the selected subcommand and return what should be printed
pub async fn run(cli: &Cli, settings: &Settings) -> anyhow::Result<String> {
    match &cli.command {
        Command::Resolve { protocol, resource_type, subtype } => {
            resolve(settings, *protocol, *resource_type, subtype.as_deref()).await
        }
        Command::Render { protocol, resource_type, subtype, value, readonly, with_options } => {
            let value = match value {
                Some(path) => read_document(path).await?,
                None => json!({}),
            };
            let mode = if *readonly { FormMode::ReadOnly } else { FormMode::Edit };
            render(settings, *protocol, *resource_type, subtype.clone(), value, mode, *with_options).await
        }
        Command::Set { value, path, json } => {
            let tree = read_document(value).await?;
            let new_value = json
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()
                .context("--json is not valid JSON")?;
            let updated = value_store::try_set(&tree, &FieldPath::parse(path), new_value)?;
            Ok(serde_json::to_string_pretty(&updated)?)
        }
        Command::Rule { draft } => {
            let draft = read_document(draft).await?;
            let builder: RuleBuilder = serde_json::from_value(draft).context("Invalid rule draft")?;
            let builder = builder.restore()?;
            Ok(builder.build_expression())
        }
        Command::Schemas => {
            let provider = FileSchemaProvider::new(&settings.schemas.dir);
            let lines: Vec<String> = provider
                .available()?
                .into_iter()
                .map(|(protocol, resource_type)| FileSchemaProvider::file_stem(protocol, resource_type))
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

fn schema_provider(settings: &Settings) -> Arc<dyn SchemaProvider> {
    let files: Arc<dyn SchemaProvider> = Arc::new(FileSchemaProvider::new(&settings.schemas.dir));
    if settings.schemas.cache {
        Arc::new(CachedSchemaProvider::new(files))
    } else {
        files
    }
}

async fn resolve(
    settings: &Settings,
    protocol: Protocol,
    resource_type: ResourceType,
    subtype: Option<&str>,
) -> anyhow::Result<String> {
    let provider = schema_provider(settings);
    let raw = provider.fetch_schema(protocol, resource_type).await?;
    let depth = settings.schemas.max_ref_depth;

    let resolved = match subtype {
        Some(key) => resolver::extract_branch_with_depth(&raw, key, depth)?.to_value(),
        None => resolver::resolve_document(&raw, depth)?,
    };
    Ok(serde_json::to_string_pretty(&resolved)?)
}

async fn render(
    settings: &Settings,
    protocol: Protocol,
    resource_type: ResourceType,
    subtype: Option<String>,
    value: Value,
    mode: FormMode,
    with_options: bool,
) -> anyhow::Result<String> {
    let (branch, value) = match (resource_type, subtype) {
        (ResourceType::Services, None) => {
            let (detected, inner) = resolver::detect_service_subtype(&value);
            info!("Detected service subtype {}", detected);
            (Some(detected.key().to_string()), inner)
        }
        (ResourceType::Services, Some(key)) => {
            let inner = value.get(&key).cloned().unwrap_or(value);
            (Some(key), inner)
        }
        (_, branch) => (branch, value),
    };

    let mut session = FormSession::new(protocol, resource_type, mode).with_max_depth(settings.schemas.max_ref_depth);
    if let Some(branch) = branch {
        session = session.with_branch(branch);
    }

    let provider = schema_provider(settings);
    session.load(provider.as_ref()).await?;
    let view = session.view(&value);

    let mut output = json!({ "view": view });
    if with_options {
        if let FormView::Ready { layout, .. } = &view {
            let catalog = Arc::new(StaticCatalog::from_settings(&settings.catalog));
            let pickers = PickerSource::new(catalog.clone(), catalog);
            let options: Vec<Value> = pickers
                .load_for(layout)
                .await?
                .into_iter()
                .map(|(request, options)| json!({ "request": request, "options": options }))
                .collect();
            output["options"] = Value::Array(options);
        }
    }
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Read a JSON or YAML document, chosen by extension
pub async fn read_document(path: &Path) -> anyhow::Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => {
            serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {}", path.display()))
        }
        _ => serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CatalogSettings, SchemaSettings};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn settings(dir: &Path) -> Settings {
        Settings {
            schemas: SchemaSettings { dir: dir.to_path_buf(), max_ref_depth: 64, cache: true },
            catalog: CatalogSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_set_command() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let value = dir.path().join("router.yaml");
        fs::write(&value, "rule: Host(`a`)\ntls:\n  certResolver: le\n")?;

        let cli = Cli::parse_from([
            "proxyform",
            "set",
            "--value",
            value.to_str().unwrap(),
            "--path",
            "tls.certResolver",
        ]);
        let out = run(&cli, &settings(dir.path())).await?;
        let tree: Value = serde_json::from_str(&out)?;
        assert_eq!(tree, json!({ "rule": "Host(`a`)", "tls": {} }));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_command_rejects_index_past_end() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let value = dir.path().join("empty.json");
        fs::write(&value, "{}")?;

        let cli = Cli::parse_from([
            "proxyform",
            "set",
            "--value",
            value.to_str().unwrap(),
            "--path",
            "a[4000000000000]",
            "--json",
            "\"x\"",
        ]);
        let err = run(&cli, &settings(dir.path())).await.unwrap_err();
        assert!(err.to_string().contains("a[4000000000000]"));
        Ok(())
    }

    #[tokio::test]
    async fn test_render_detects_service_subtype() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("http_services.json"),
            r#"{
                "oneOf": [
                    { "properties": { "loadBalancer": { "type": "object", "properties": { "passHostHeader": { "type": "boolean" } } } } },
                    { "properties": { "weighted": { "type": "object", "properties": { "services": { "type": "array", "items": { "type": "object", "properties": { "name": { "type": "string" }, "weight": { "type": "integer" } } } } } } } }
                ]
            }"#,
        )?;
        let value = dir.path().join("svc.json");
        fs::write(&value, r#"{ "weighted": { "services": [ { "name": "a", "weight": 1 } ] } }"#)?;

        let cli = Cli::parse_from([
            "proxyform",
            "render",
            "--protocol",
            "http",
            "--type",
            "services",
            "--value",
            value.to_str().unwrap(),
        ]);
        let out = run(&cli, &settings(dir.path())).await?;
        let rendered: Value = serde_json::from_str(&out)?;
        assert_eq!(rendered["view"]["state"], "ready");
        assert_eq!(rendered["view"]["layout"]["fields"][0]["key"], "services");
        Ok(())
    }

    #[tokio::test]
    async fn test_schemas_listing() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("http_routers.json"), "{}")?;
        fs::write(dir.path().join("tcp_routers.yaml"), "{}")?;

        let cli = Cli::parse_from(["proxyform", "schemas"]);
        let out = run(&cli, &settings(dir.path())).await?;
        assert_eq!(out, "http_routers\ntcp_routers");
        Ok(())
    }
}

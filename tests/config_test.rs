use proxyform::adapters::StaticCatalog;
use proxyform::config::Settings;
use proxyform::domain::{Protocol, ResourceReferenceResolver, ResourceType};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_catalog_dir() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    fs::create_dir_all(root.join("catalog"))?;

    let proxyform_toml = r#"
[schemas]
dir = "/srv/schemas"
max_ref_depth = 32

[catalog]
entrypoints = ["web", "websecure"]

[[catalog.resources]]
protocol = "http"
type = "middlewares"
name = "auth"
"#;
    fs::write(root.join("proxyform.toml"), proxyform_toml)?;

    let services_json = r#"
[
    { "protocol": "http", "type": "services", "name": "api", "provider": "file" },
    { "protocol": "http", "type": "services", "name": "whoami", "provider": "docker", "source": "docker" }
]
"#;
    fs::write(root.join("catalog/services.json"), services_json)?;

    let routers_yaml = r#"
- protocol: tcp
  type: routers
  name: postgres
  enabled: false
"#;
    fs::write(root.join("catalog/routers.yaml"), routers_yaml)?;
    fs::write(root.join("catalog/README.md"), "ignored")?;

    let settings = Settings::from_root(root.to_str().unwrap())?;

    assert_eq!(settings.schemas.dir, PathBuf::from("/srv/schemas"));
    assert_eq!(settings.schemas.max_ref_depth, 32);
    assert_eq!(settings.catalog.entrypoints.len(), 2);
    assert_eq!(settings.catalog.resources.len(), 4);

    let postgres = settings
        .catalog
        .resources
        .iter()
        .find(|r| r.name == "postgres")
        .unwrap();
    assert!(!postgres.enabled);
    assert_eq!(postgres.source, "database");

    Ok(())
}

#[test]
fn test_invalid_catalog_entry_fails_validation() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("catalog"))?;
    fs::write(
        root.join("catalog/bad.json"),
        r#"[ { "protocol": "udp", "type": "tls", "name": "x" } ]"#,
    )?;

    let err = Settings::from_root(root.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Configuration validation failed"));
    Ok(())
}

#[test]
fn test_duplicate_across_files_fails_validation() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("catalog"))?;
    let entry = r#"[ { "protocol": "http", "type": "routers", "name": "dashboard" } ]"#;
    fs::write(root.join("catalog/a.json"), entry)?;
    fs::write(root.join("catalog/b.json"), entry)?;

    let err = Settings::from_root(root.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Duplicate entry"));
    Ok(())
}

#[tokio::test]
async fn test_catalog_from_settings() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("catalog"))?;
    fs::write(
        root.join("catalog/services.yml"),
        "- { protocol: http, type: services, name: api }\n- { protocol: http, type: services, name: ext, source: kubernetes }\n",
    )?;

    let settings = Settings::from_root(root.to_str().unwrap())?;
    let catalog = StaticCatalog::from_settings(&settings.catalog);

    let managed = catalog
        .list_resources(Protocol::Http, ResourceType::Services, false)
        .await?;
    assert_eq!(managed.len(), 1);
    assert_eq!(managed[0].name, "api");
    Ok(())
}

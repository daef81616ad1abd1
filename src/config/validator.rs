use std::collections::HashMap;
use thiserror::Error;

use crate::config::{CatalogResource, CatalogSettings, SchemaSettings, Settings};
use crate::domain::{Protocol, ResourceType};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_schemas(&settings.schemas) {
            errors.extend(e);
        }

        if let Err(e) = Self::validate_catalog(&settings.catalog) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_schemas(schemas: &SchemaSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if schemas.dir.as_os_str().is_empty() {
            errors.push(ValidationError::MissingField("schemas.dir".to_string()));
        }

        if schemas.max_ref_depth == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "schemas.max_ref_depth".to_string(),
                reason: "Depth cap must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_catalog(catalog: &CatalogSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen_entrypoints = HashMap::new();
        let mut seen_resources = HashMap::new();

        for (idx, name) in catalog.entrypoints.iter().enumerate() {
            if name.is_empty() {
                errors.push(ValidationError::MissingField(format!("catalog.entrypoints[{}]", idx)));
            }
            if let Some(prev_idx) = seen_entrypoints.insert(name, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Entry point '{}' appears at indices {} and {}",
                    name, prev_idx, idx
                )));
            }
        }

        for (idx, resource) in catalog.resources.iter().enumerate() {
            if resource.name.is_empty() {
                errors.push(ValidationError::MissingField(format!("catalog.resources[{}].name", idx)));
            }

            if let Err(e) = Self::validate_combination(idx, resource) {
                errors.push(e);
                continue;
            }

            let key = (
                resource.protocol.as_str(),
                resource.resource_type.as_str(),
                format!("{}@{}", resource.name, resource.provider),
            );
            if let Some(prev_idx) = seen_resources.insert(key, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "{} {} '{}@{}' appears at indices {} and {}",
                    resource.protocol, resource.resource_type, resource.name, resource.provider, prev_idx, idx
                )));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_combination(idx: usize, resource: &CatalogResource) -> Result<(), ValidationError> {
        let protocol: Protocol = resource.protocol.parse().map_err(|_| ValidationError::InvalidValue {
            field: format!("catalog.resources[{}].protocol", idx),
            reason: format!("Unknown protocol '{}'", resource.protocol),
        })?;
        let resource_type: ResourceType =
            resource.resource_type.parse().map_err(|_| ValidationError::InvalidValue {
                field: format!("catalog.resources[{}].type", idx),
                reason: format!("Unknown resource type '{}'", resource.resource_type),
            })?;

        if !protocol.supports(resource_type) {
            return Err(ValidationError::InvalidValue {
                field: format!("catalog.resources[{}]", idx),
                reason: format!("{} does not support {}", protocol, resource_type),
            });
        }
        Ok(())
    }
}

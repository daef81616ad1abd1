//! # Proxyform - schema-driven configuration forms
//!
//! Proxyform turns the JSON Schema of a reverse-proxy resource (routers,
//! services, middlewares, servers transports, TLS) into an editable form
//! description, and provides a visual builder for router rule expressions.
//!
//! ## Features
//!
//! - **Schema Resolution**: `$ref` dereferencing with cycle detection and a depth cap
//! - **Field Classification**: domain references, enums, flags, maps, nested structs
//! - **Path Editing**: immutable whole-tree updates addressed by `a.b[0].c` paths
//! - **Read-only Mode**: the same layout rendered as display widgets
//! - **Rule Builder**: grouped conditions serialised to HTTP or TCP rule expressions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use proxyform::adapters::FileSchemaProvider;
//! use proxyform::domain::{Protocol, ResourceType};
//! use proxyform::form::{FormMode, FormSession};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = FileSchemaProvider::new("schemas");
//!     let mut session = FormSession::new(Protocol::Http, ResourceType::Routers, FormMode::Edit);
//!     session.load(&provider).await?;
//!
//!     let view = session.view(&serde_json::json!({ "rule": "Host(`example.com`)" }));
//!     println!("{}", serde_json::to_string_pretty(&view)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: protocol vocabulary and collaborator ports
//! - **Form**: resolver, classifier, value store, renderer and session
//! - **Rules**: matcher catalogue and rule draft builder
//! - **Adapters**: file-backed schemas, schema cache, static resource catalogue
//! - **Config**: settings loading and validation

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod form;
pub mod rules;

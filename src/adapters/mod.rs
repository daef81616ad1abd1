pub mod catalog;
pub mod file_schema_provider;
pub mod schema_cache;

pub use catalog::StaticCatalog;
pub use file_schema_provider::FileSchemaProvider;
pub use schema_cache::CachedSchemaProvider;

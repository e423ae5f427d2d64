mod create_catalog;
mod load_schemas;
mod load_stubs;
pub mod ports;

pub use create_catalog::{Catalog, CatalogBuilder};
pub use load_schemas::{load_schemas, SchemaLoader};
pub use load_stubs::{load_file, load_stubs};

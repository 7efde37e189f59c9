//! OpenAPI 3.0 to TypeScript client generator.
//!
//! Parses an OpenAPI 3.0.3 JSON document and emits a strongly typed
//! TypeScript client: one interface file per named schema and a nested
//! client object mirroring the URL hierarchy, all rendered through a small
//! placeholder template engine.
//!
//! ```no_run
//! use openapi_tsgen::{GenerateConfig, generate_to};
//!
//! # fn main() -> openapi_tsgen::Result<()> {
//! let json = std::fs::read_to_string("openapi.json")?;
//! let config = GenerateConfig {
//!     namespace: "api".to_string(),
//!     output_dir: "src/generated".into(),
//! };
//! generate_to(&json, &config)?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod openapi;
pub mod template;

pub use error::{Error, Result};
pub use openapi::{GenerateConfig, GeneratedFile, generate, generate_to};

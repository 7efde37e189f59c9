//! OpenAPI 3.0 to TypeScript client generator.
//!
//! This module parses OpenAPI 3.0.3 documents and generates a typed client:
//! - One interface file per named object schema (`schemas/<Name>.ts`)
//! - A fetch-based client object mirroring the URL hierarchy (`client.ts`)

mod emit;
mod resolve;
mod routes;
mod spec;
mod types;

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::Result;
use emit::Emitter;

pub use resolve::Resolver;
pub use routes::{BoundOperation, PathNode, RouteTree};
pub use spec::{
    AdditionalProperties, Components, Document, HttpMethod, Info, MediaType, Operation, Parameter,
    PathItem, RefOr, Reference, RequestBody, Response, Schema, Server,
};
pub use types::{TsType, TypeResolver};

/// Generation settings, fixed before the run starts.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Name of the exported root client object.
    pub namespace: String,
    /// Directory the write edge places files under.
    pub output_dir: PathBuf,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        GenerateConfig {
            namespace: "api".to_string(),
            output_dir: PathBuf::from("generated"),
        }
    }
}

/// One generated file, path relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Generates the full client from an OpenAPI JSON document. Pure: returns
/// the files without touching the filesystem.
pub fn generate(json: &str, config: &GenerateConfig) -> Result<Vec<GeneratedFile>> {
    let doc = Document::from_json(json)?;
    debug!(
        title = %doc.info.title,
        version = %doc.info.version,
        paths = doc.paths.len(),
        "parsed OpenAPI document"
    );

    let tree = RouteTree::build(&doc);
    debug!(routes = %tree.describe(), "route tree built");

    let mut emitter = Emitter::new(&doc);
    emitter.emit_component_schemas()?;
    let client = emitter.emit_client(&tree, &config.namespace)?;

    let mut files = vec![GeneratedFile {
        path: PathBuf::from("client.ts"),
        content: client,
    }];
    for (name, content) in emitter.into_interfaces() {
        files.push(GeneratedFile {
            path: PathBuf::from("schemas").join(format!("{name}.ts")),
            content,
        });
    }
    Ok(files)
}

/// Generates the client and writes it under `config.output_dir`.
pub fn generate_to(json: &str, config: &GenerateConfig) -> Result<()> {
    let files = generate(json, config)?;
    for file in &files {
        let path = config.output_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &file.content)?;
        debug!(path = %path.display(), bytes = file.content.len(), "wrote generated file");
    }
    Ok(())
}

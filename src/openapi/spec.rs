//! Typed in-memory representation of a parsed OpenAPI 3.0.3 document.
//!
//! Parsing is lenient and forward-compatible: unknown fields are ignored.
//! Every referencable position is polymorphic over inline value vs `$ref`
//! through [`RefOr`]. The model is immutable after parsing; all generation
//! state lives in the pipeline, not here.

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::warn;

use crate::error::Result;

/// Root document.
#[derive(Debug, Deserialize)]
pub struct Document {
    /// Declared OpenAPI version, e.g. `3.0.3`.
    pub openapi: String,
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    /// URL template → path item, in document order.
    pub paths: IndexMap<String, PathItem>,
    pub components: Option<Components>,
}

impl Document {
    /// Parses a document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Document = serde_json::from_str(json)?;
        if !doc.openapi.starts_with("3.0") {
            warn!(
                version = %doc.openapi,
                "document is not OpenAPI 3.0.x; proceeding with 3.0.3 semantics"
            );
        }
        Ok(doc)
    }
}

/// `info` object.
#[derive(Debug, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

/// `servers` entry.
#[derive(Debug, Deserialize)]
pub struct Server {
    pub url: String,
    pub description: Option<String>,
}

/// A path item: one operation slot per HTTP verb plus shared parameters.
#[derive(Debug, Deserialize)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
    /// Path-level parameters shared by all operations on this URL.
    pub parameters: Option<Vec<RefOr<Parameter>>>,
}

impl PathItem {
    /// The verb → operation bindings present on this item, in a fixed verb
    /// order so output does not depend on the input's field order.
    pub fn operations(&self) -> Vec<(HttpMethod, &Operation)> {
        [
            (HttpMethod::Get, &self.get),
            (HttpMethod::Put, &self.put),
            (HttpMethod::Post, &self.post),
            (HttpMethod::Delete, &self.delete),
            (HttpMethod::Options, &self.options),
            (HttpMethod::Head, &self.head),
            (HttpMethod::Patch, &self.patch),
            (HttpMethod::Trace, &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
        .collect()
    }
}

/// HTTP verb of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Wire form, e.g. `GET`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Callable name in the generated client, e.g. `get`.
    pub fn fn_name(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

/// An API operation (endpoint).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Option<Vec<RefOr<Parameter>>>,
    pub request_body: Option<RefOr<RequestBody>>,
    /// Status code (or `default`) → response, in document order.
    #[serde(default)]
    pub responses: IndexMap<String, RefOr<Response>>,
}

/// A parameter (path, query, header, or cookie).
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default)]
    pub required: bool,
    pub schema: Option<RefOr<Schema>>,
    pub description: Option<String>,
}

/// A request body definition.
#[derive(Debug, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,
    pub content: Option<IndexMap<String, MediaType>>,
    pub description: Option<String>,
}

/// A response definition.
#[derive(Debug, Deserialize)]
pub struct Response {
    pub description: Option<String>,
    pub content: Option<IndexMap<String, MediaType>>,
}

/// Media type content (e.g. `application/json`).
#[derive(Debug, Deserialize)]
pub struct MediaType {
    pub schema: Option<RefOr<Schema>>,
}

/// A JSON Schema node as used in OpenAPI 3.0.
///
/// A schema is exactly one of: primitive, object-with-properties,
/// object-with-additionalProperties, or array; the reference alternative is
/// carried by the enclosing [`RefOr`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: Option<String>,
    /// Property name → schema, in declared order.
    pub properties: Option<IndexMap<String, RefOr<Schema>>>,
    /// Names of required properties.
    pub required: Option<Vec<String>>,
    /// Item schema for array types.
    pub items: Option<Box<RefOr<Schema>>>,
    /// Either a boolean literal or a value schema for map-like objects.
    pub additional_properties: Option<AdditionalProperties>,
    pub description: Option<String>,
    /// Format hint (e.g. `date-time`); not reflected in the emitted types.
    pub format: Option<String>,
    /// OpenAPI 3.0 nullable flag; parsed but not reflected in emitted types.
    pub nullable: Option<bool>,
}

/// Either an inline value or a `$ref` pointer.
///
/// `Ref` is listed first so that an object carrying `$ref` deserializes as a
/// reference even though every [`Schema`] field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// A `$ref` pointer into the components table.
    Ref(Reference),
    /// An inline definition.
    Value(T),
}

/// A `$ref` pointer of the form `#/components/<section>/<name>`.
#[derive(Debug, Clone, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub pointer: String,
}

/// `additionalProperties` is either a boolean or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<RefOr<Schema>>),
}

/// `components` object. The sections the pipeline consumes are typed; the
/// rest are kept opaque so pointers into them can still be classified.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    pub schemas: Option<IndexMap<String, RefOr<Schema>>>,
    pub responses: Option<IndexMap<String, RefOr<Response>>>,
    pub parameters: Option<IndexMap<String, RefOr<Parameter>>>,
    pub request_bodies: Option<IndexMap<String, RefOr<RequestBody>>>,
    pub examples: Option<IndexMap<String, serde_json::Value>>,
    pub headers: Option<IndexMap<String, serde_json::Value>>,
    pub security_schemes: Option<IndexMap<String, serde_json::Value>>,
    pub links: Option<IndexMap<String, serde_json::Value>>,
    pub callbacks: Option<IndexMap<String, serde_json::Value>>,
}

//! Error taxonomy for the generation pipeline.
//!
//! Every failure aborts the run: the pipeline is a one-shot, fail-fast
//! transformation. There is no partial-output mode, since a half-generated
//! client would leave dangling type references.

use std::io;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All the ways a generation run can fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A template was rendered without a value for a required placeholder.
    #[error("missing required template variable `{name}`")]
    MissingRequiredVariable {
        /// Placeholder name as written in the template.
        name: String,
    },

    /// A supplied value did not match a placeholder's declared kind, or one
    /// placeholder name was declared with two conflicting kinds.
    #[error("template variable `{name}`: expected {expected}, got {actual} (`{value}`)")]
    TypeMismatch {
        /// Placeholder name.
        name: String,
        /// What the placeholder accepts.
        expected: String,
        /// The actual type of the supplied value.
        actual: String,
        /// The offending value itself.
        value: String,
    },

    /// A `$ref` pointer could not be resolved against the components table.
    #[error("unresolvable reference `{pointer}`: {reason}")]
    UnresolvableReference {
        /// The pointer as it appears in the document.
        pointer: String,
        /// Why resolution failed (unknown section, missing key, chain, ...).
        reason: String,
    },

    /// An object schema with properties could not be assigned any type name.
    #[error("object schema with properties has no inferable type name ({context})")]
    SchemaMissingName {
        /// Where in the document the schema was encountered.
        context: String,
    },

    /// `additionalProperties` was a boolean literal where a schema is required.
    #[error("`additionalProperties` must be a schema, not a boolean ({context})")]
    InvalidAdditionalProperties {
        /// Where in the document the schema was encountered.
        context: String,
    },

    /// A primitive `type` outside {string, integer, number, boolean}.
    #[error("unknown primitive type `{ty}` ({context})")]
    UnknownPrimitiveType {
        /// The offending `type` literal.
        ty: String,
        /// Where in the document the schema was encountered.
        context: String,
    },

    /// The input document is not valid JSON or not a parseable OpenAPI document.
    #[error("failed to parse OpenAPI document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Filesystem failure while writing generated files.
    #[error(transparent)]
    Io(#[from] io::Error),
}

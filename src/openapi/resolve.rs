//! One-hop `$ref` resolution against the components table.
//!
//! Resolution is deliberately non-recursive: a components entry that is itself
//! a reference is rejected rather than followed, since chained and cyclic
//! reference graphs are out of scope and silently following them would hide
//! authoring mistakes.

use indexmap::IndexMap;

use super::spec::{Components, Document, Parameter, RefOr, RequestBody, Response, Schema};
use crate::error::{Error, Result};

/// Component section names recognized in `#/components/<section>/<name>`.
const SECTIONS: [&str; 9] = [
    "schemas",
    "responses",
    "parameters",
    "examples",
    "requestBodies",
    "headers",
    "securitySchemes",
    "links",
    "callbacks",
];

/// Resolves `$ref` pointers against a document's components table.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    components: Option<&'a Components>,
}

impl<'a> Resolver<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Resolver {
            components: doc.components.as_ref(),
        }
    }

    /// Resolves a schema position. A non-reference input passes through
    /// unchanged under `context`; a reference yields the entry and a type
    /// name inferred from the pointer's final segment.
    pub fn schema(
        &self,
        node: &'a RefOr<Schema>,
        context: Option<&str>,
    ) -> Result<(Option<String>, &'a Schema)> {
        self.resolve(node, context, "schemas", |c| c.schemas.as_ref())
    }

    /// Resolves a parameter position.
    pub fn parameter(
        &self,
        node: &'a RefOr<Parameter>,
        context: Option<&str>,
    ) -> Result<(Option<String>, &'a Parameter)> {
        self.resolve(node, context, "parameters", |c| c.parameters.as_ref())
    }

    /// Resolves a request body position.
    pub fn request_body(
        &self,
        node: &'a RefOr<RequestBody>,
        context: Option<&str>,
    ) -> Result<(Option<String>, &'a RequestBody)> {
        self.resolve(node, context, "requestBodies", |c| {
            c.request_bodies.as_ref()
        })
    }

    /// Resolves a response position.
    pub fn response(
        &self,
        node: &'a RefOr<Response>,
        context: Option<&str>,
    ) -> Result<(Option<String>, &'a Response)> {
        self.resolve(node, context, "responses", |c| c.responses.as_ref())
    }

    fn resolve<T>(
        &self,
        node: &'a RefOr<T>,
        context: Option<&str>,
        section: &'static str,
        table: impl Fn(&'a Components) -> Option<&'a IndexMap<String, RefOr<T>>>,
    ) -> Result<(Option<String>, &'a T)> {
        let reference = match node {
            RefOr::Value(value) => return Ok((context.map(str::to_owned), value)),
            RefOr::Ref(reference) => reference,
        };
        let (ref_section, key) = split_pointer(&reference.pointer)?;
        if ref_section != section {
            return Err(Error::UnresolvableReference {
                pointer: reference.pointer.clone(),
                reason: format!("expected a `{section}` reference, found section `{ref_section}`"),
            });
        }
        let entry = self
            .components
            .and_then(&table)
            .and_then(|entries| entries.get(key))
            .ok_or_else(|| Error::UnresolvableReference {
                pointer: reference.pointer.clone(),
                reason: format!("no entry named `{key}` in `{section}`"),
            })?;
        match entry {
            RefOr::Value(value) => Ok((Some(type_name(key)), value)),
            RefOr::Ref(_) => Err(Error::UnresolvableReference {
                pointer: reference.pointer.clone(),
                reason: format!("entry `{key}` is itself a reference; chains are not followed"),
            }),
        }
    }
}

/// Splits a pointer into its section and lookup key, validating both the
/// pointer shape and the section name.
fn split_pointer(pointer: &str) -> Result<(&str, &str)> {
    let rest = pointer
        .strip_prefix("#/components/")
        .ok_or_else(|| Error::UnresolvableReference {
            pointer: pointer.to_string(),
            reason: "pointer must have the form `#/components/<section>/<name>`".to_string(),
        })?;
    let (section, key) = rest
        .split_once('/')
        .ok_or_else(|| Error::UnresolvableReference {
            pointer: pointer.to_string(),
            reason: "pointer must have the form `#/components/<section>/<name>`".to_string(),
        })?;
    if !SECTIONS.contains(&section) {
        return Err(Error::UnresolvableReference {
            pointer: pointer.to_string(),
            reason: format!("unknown components section `{section}`"),
        });
    }
    Ok((section, key))
}

/// Derives a type name from a pointer's final segment.
fn type_name(segment: &str) -> String {
    super::types::pascal_case(segment)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::openapi::spec::Reference;

    fn doc_with_schema(name: &str, schema_json: &str) -> Document {
        Document::from_json(&format!(
            r#"{{
                "openapi": "3.0.3",
                "info": {{ "title": "T", "version": "1" }},
                "paths": {{}},
                "components": {{ "schemas": {{ "{name}": {schema_json} }} }}
            }}"#,
        ))
        .unwrap()
    }

    fn reference(pointer: &str) -> RefOr<Schema> {
        RefOr::Ref(Reference {
            pointer: pointer.to_string(),
        })
    }

    #[test]
    fn test_non_reference_passes_through_with_context_name() {
        let doc = doc_with_schema("Team", r#"{ "type": "object" }"#);
        let resolver = Resolver::new(&doc);
        let inline = RefOr::Value(Schema {
            schema_type: Some("string".to_string()),
            ..Schema::default()
        });
        let (name, schema) = resolver.schema(&inline, Some("Label")).unwrap();
        assert_eq!(name.as_deref(), Some("Label"));
        assert_eq!(schema.schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_resolves_schema_reference_and_infers_name() {
        let doc = doc_with_schema("team_member", r#"{ "type": "object" }"#);
        let resolver = Resolver::new(&doc);
        let node = reference("#/components/schemas/team_member");
        let (name, schema) = resolver.schema(&node, None).unwrap();
        assert_eq!(name.as_deref(), Some("TeamMember"));
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
    }

    #[test]
    fn test_unknown_section_fails() {
        let doc = doc_with_schema("Team", r#"{ "type": "object" }"#);
        let resolver = Resolver::new(&doc);
        let node = reference("#/components/gadgets/Team");
        let err = resolver.schema(&node, None).unwrap_err();
        assert!(matches!(err, Error::UnresolvableReference { reason, .. }
            if reason.contains("unknown components section")));
    }

    #[test]
    fn test_missing_key_fails() {
        let doc = doc_with_schema("Team", r#"{ "type": "object" }"#);
        let resolver = Resolver::new(&doc);
        let node = reference("#/components/schemas/Missing");
        let err = resolver.schema(&node, None).unwrap_err();
        assert!(matches!(err, Error::UnresolvableReference { reason, .. }
            if reason.contains("no entry named `Missing`")));
    }

    #[test]
    fn test_wrong_section_for_position_fails() {
        let doc = doc_with_schema("Team", r#"{ "type": "object" }"#);
        let resolver = Resolver::new(&doc);
        let node = reference("#/components/responses/Team");
        let err = resolver.schema(&node, None).unwrap_err();
        assert!(matches!(err, Error::UnresolvableReference { reason, .. }
            if reason.contains("expected a `schemas` reference")));
    }

    #[test]
    fn test_chained_reference_is_rejected() {
        let doc = doc_with_schema("Alias", r##"{ "$ref": "#/components/schemas/Team" }"##);
        let resolver = Resolver::new(&doc);
        let node = reference("#/components/schemas/Alias");
        let err = resolver.schema(&node, None).unwrap_err();
        assert!(matches!(err, Error::UnresolvableReference { reason, .. }
            if reason.contains("chains are not followed")));
    }

    #[test]
    fn test_malformed_pointer_fails() {
        let doc = doc_with_schema("Team", r#"{ "type": "object" }"#);
        let resolver = Resolver::new(&doc);
        let node = reference("Team");
        assert!(matches!(
            resolver.schema(&node, None),
            Err(Error::UnresolvableReference { .. })
        ));
    }
}

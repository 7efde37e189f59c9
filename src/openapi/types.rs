//! Schema classification and TypeScript interface emission.
//!
//! Every schema position maps to exactly one [`TsType`]. Named object schemas
//! become `export interface` declarations, emitted once per name and memoized
//! in encounter order; everything else maps structurally.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::resolve::Resolver;
use super::spec::{AdditionalProperties, Document, RefOr, Schema};
use crate::error::{Error, Result};
use crate::template::{Template, Value, Values};

/// One interface field: `  name?: type;`.
const FIELD: &str = "  %name%%opt?%: %type%;";

/// One import line at the top of a generated schema file.
const IMPORT: &str = "import type { %name% } from \"./%name%\";";

/// A full schema file body.
const INTERFACE: &str = "%~documented -> \"/** %description% */\"~%
export interface %name% {
%fields%
}
";

/// The TypeScript type a schema maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsType {
    String,
    Number,
    Boolean,
    /// Absent or empty payload.
    Void,
    /// A schema with no classifiable shape.
    Unknown,
    /// A named interface, emitted separately.
    Ref(String),
    Array(Box<TsType>),
    /// Map-like object via `additionalProperties`.
    Record(Box<TsType>),
}

impl TsType {
    /// The type's source form at a use site.
    pub fn ts(&self) -> String {
        match self {
            TsType::String => "string".to_string(),
            TsType::Number => "number".to_string(),
            TsType::Boolean => "boolean".to_string(),
            TsType::Void => "void".to_string(),
            TsType::Unknown => "unknown".to_string(),
            TsType::Ref(name) => name.clone(),
            TsType::Array(item) => format!("{}[]", item.ts()),
            TsType::Record(value) => format!("Record<string, {}>", value.ts()),
        }
    }

    /// Collects every interface name this type mentions, for imports.
    pub fn collect_refs(&self, refs: &mut IndexSet<String>) {
        match self {
            TsType::Ref(name) => {
                refs.insert(name.clone());
            }
            TsType::Array(inner) | TsType::Record(inner) => inner.collect_refs(refs),
            _ => {}
        }
    }
}

/// Maps schemas to [`TsType`]s and accumulates interface files.
pub struct TypeResolver<'a> {
    resolver: Resolver<'a>,
    /// Interface name → file body, in first-emitted order.
    registry: IndexMap<String, String>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(doc: &'a Document) -> Self {
        TypeResolver {
            resolver: Resolver::new(doc),
            registry: IndexMap::new(),
        }
    }

    /// The emitted interfaces, name → file body, in emission order.
    pub fn interfaces(&self) -> &IndexMap<String, String> {
        &self.registry
    }

    /// Resolves a schema position to its TypeScript type, emitting interface
    /// files for any named object schemas encountered along the way.
    ///
    /// `name` is the schema's own name if it has one (a components key);
    /// `parent` and `property` describe the position for synthesized names and
    /// error context.
    pub fn resolve(
        &mut self,
        node: &'a RefOr<Schema>,
        name: Option<&str>,
        parent: Option<&str>,
        property: Option<&str>,
    ) -> Result<TsType> {
        let (resolved_name, schema) = self.resolver.schema(node, name)?;
        let label = context(resolved_name.as_deref(), parent, property);

        if let Some(properties) = &schema.properties {
            if properties.is_empty() {
                return Ok(TsType::Void);
            }
            let interface_name = resolved_name
                .or_else(|| synthesize(parent, property))
                .ok_or(Error::SchemaMissingName { context: label })?;
            self.emit_interface(&interface_name, schema)?;
            return Ok(TsType::Ref(interface_name));
        }

        if let Some(additional) = &schema.additional_properties {
            let value_schema = match additional {
                AdditionalProperties::Bool(_) => {
                    return Err(Error::InvalidAdditionalProperties { context: label });
                }
                AdditionalProperties::Schema(value_schema) => value_schema,
            };
            let owner = resolved_name.as_deref().or(parent);
            let value = self.resolve(value_schema, None, owner, Some("value"))?;
            return Ok(TsType::Record(Box::new(value)));
        }

        match schema.schema_type.as_deref() {
            Some("array") => {
                let Some(items) = &schema.items else {
                    return Ok(TsType::Array(Box::new(TsType::Unknown)));
                };
                let owner = resolved_name.as_deref().or(parent);
                let item = self.resolve(items, None, owner, Some("item"))?;
                Ok(TsType::Array(Box::new(item)))
            }
            Some("object") => Ok(TsType::Void),
            Some("string") => Ok(TsType::String),
            Some("integer") | Some("number") => Ok(TsType::Number),
            Some("boolean") => Ok(TsType::Boolean),
            Some(other) => Err(Error::UnknownPrimitiveType {
                ty: other.to_string(),
                context: label,
            }),
            None => Ok(TsType::Unknown),
        }
    }

    /// Emits the interface for `name` once; later calls are no-ops. A
    /// placeholder entry is registered up front so self-referential schemas
    /// terminate.
    fn emit_interface(&mut self, name: &str, schema: &'a Schema) -> Result<()> {
        if self.registry.contains_key(name) {
            return Ok(());
        }
        self.registry.insert(name.to_string(), String::new());
        debug!(interface = name, "emitting schema interface");

        let properties = schema.properties.as_ref();
        let required: &[String] = schema.required.as_deref().unwrap_or(&[]);

        let field_template = Template::parse(FIELD)?;
        let mut refs = IndexSet::new();
        let mut fields = Vec::new();
        if let Some(properties) = properties {
            for (prop, prop_schema) in properties {
                let ty = self.resolve(prop_schema, None, Some(name), Some(prop.as_str()))?;
                ty.collect_refs(&mut refs);
                let values = Values::new()
                    .set("name", property_key(prop))
                    .set_opt("opt", (!required.contains(prop)).then_some("?"))
                    .set("type", ty.ts());
                fields.push(field_template.render(&values, 0)?);
            }
        }

        let body = Template::parse(INTERFACE)?
            .with_formatter("description", single_line)
            .render(
                &Values::new()
                    .set("documented", schema.description.is_some())
                    .set_opt("description", schema.description.as_deref())
                    .set("name", name)
                    .set("fields", fields.join("\n")),
                0,
            )?;

        let import_template = Template::parse(IMPORT)?;
        let mut file = String::new();
        for referenced in &refs {
            if referenced == name {
                continue;
            }
            file.push_str(&import_template.render(&Values::new().set("name", &**referenced), 0)?);
            file.push('\n');
        }
        if !file.is_empty() {
            file.push('\n');
        }
        file.push_str(&body);

        self.registry.insert(name.to_string(), file);
        Ok(())
    }
}

/// Collapses a description to one line for a doc comment.
fn single_line(value: &Value) -> String {
    value.display().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Name for an inline object schema, derived from its position.
fn synthesize(parent: Option<&str>, property: Option<&str>) -> Option<String> {
    match (parent, property) {
        (None, None) => None,
        (parent, property) => Some(format!(
            "{}{}",
            parent.map(pascal_case).unwrap_or_default(),
            property.map(pascal_case).unwrap_or_default(),
        )),
    }
}

/// Where in the document a schema sits, for error messages.
fn context(name: Option<&str>, parent: Option<&str>, property: Option<&str>) -> String {
    if let Some(name) = name {
        return name.to_string();
    }
    match (parent, property) {
        (Some(parent), Some(property)) => format!("{parent}.{property}"),
        (Some(parent), None) => parent.to_string(),
        (None, Some(property)) => property.to_string(),
        (None, None) => "anonymous schema".to_string(),
    }
}

/// A property name as it appears in an object literal or interface body:
/// bare when it is a valid identifier, quoted otherwise.
pub(crate) fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let identifier = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier {
        name.to_string()
    } else {
        format!("{:?}", name)
    }
}

/// `team_member`, `team-member`, and `teamMember` all become `TeamMember`.
pub(crate) fn pascal_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut upper_next = true;
    for c in input.chars() {
        if !c.is_ascii_alphanumeric() {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

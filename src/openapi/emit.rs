//! Client surface emission.
//!
//! Walks the route tree and renders one method per operation, nested object
//! scopes per path segment, and the `request` helper that every method calls.
//! All text goes through the template engine; the emitter only assembles
//! values.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::resolve::Resolver;
use super::routes::{BoundOperation, PathNode, RouteTree};
use super::spec::{Document, HttpMethod, Parameter};
use super::types::{TsType, TypeResolver, pascal_case, property_key};
use crate::error::Result;
use crate::template::{Template, Value, Values};

/// One client method.
const METHOD: &str = "%~documented -> \"/** %summary% */\"~%
/** %method% %url% */
%name%(%args%): Promise<%ret%> {
  return request%targ?%(`%path%`, \"%method%\", %query_arg%, %body_arg%, options)%then?%;
},";

/// One nested scope in the exported client object.
const SCOPE: &str = "%name%: {
  %body%
},";

/// One import line at the top of `client.ts`.
const IMPORT: &str = "import type { %name% } from \"./schemas/%name%\";";

/// The `client.ts` file. The `request` helper is shared by every method;
/// `%imports%` carries its own trailing blank line when present.
const CLIENT: &str = r#"// Generated API client for %title% v%version%.

%imports?%const BASE_URL = "%base_url%";

async function request<T = unknown>(
  path: string,
  method: string,
  query?: Record<string, unknown>,
  body?: unknown,
  options?: RequestInit,
): Promise<T | null> {
  const search = new URLSearchParams();
  if (query) {
    for (const [key, value] of Object.entries(query)) {
      if (value !== undefined && value !== null) {
        search.set(key, String(value));
      }
    }
  }
  const qs = search.toString();
  const response = await fetch(`${BASE_URL}${path}${qs ? `?${qs}` : ""}`, {
    ...options,
    method,
    headers: { "Content-Type": "application/json", ...(options ? options.headers : undefined) },
    body: body !== undefined ? JSON.stringify(body) : undefined,
  });
  if (!response.ok) {
    throw new Error(`${method} ${path} failed with status ${response.status}`);
  }
  const text = await response.text();
  return text.length > 0 ? (JSON.parse(text) as T) : null;
}

export const %namespace% = {
  %body%
};
"#;

/// Renders the client file and schema interface files for one document.
pub struct Emitter<'a> {
    doc: &'a Document,
    resolver: Resolver<'a>,
    types: TypeResolver<'a>,
    /// Interface names referenced by client signatures, in first-use order.
    imports: IndexSet<String>,
}

impl<'a> Emitter<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Emitter {
            doc,
            resolver: Resolver::new(doc),
            types: TypeResolver::new(doc),
            imports: IndexSet::new(),
        }
    }

    /// Resolves every named component schema so its interface file exists
    /// even when no operation references it.
    pub fn emit_component_schemas(&mut self) -> Result<()> {
        let schemas = self
            .doc
            .components
            .as_ref()
            .and_then(|c| c.schemas.as_ref());
        let Some(schemas) = schemas else {
            return Ok(());
        };
        for (name, node) in schemas {
            self.types.resolve(node, Some(name.as_str()), None, None)?;
        }
        debug!(interfaces = self.types.interfaces().len(), "component schemas emitted");
        Ok(())
    }

    /// Renders `client.ts` for the given route tree.
    pub fn emit_client(&mut self, tree: &RouteTree<'a>, namespace: &str) -> Result<String> {
        let body = self.emit_node(&tree.root)?;

        let import_template = Template::parse(IMPORT)?;
        let mut import_lines = Vec::new();
        for name in &self.imports {
            import_lines.push(import_template.render(&Values::new().set("name", &**name), 0)?);
        }
        let imports = (!import_lines.is_empty()).then(|| format!("{}\n\n", import_lines.join("\n")));

        let base_url = self
            .doc
            .servers
            .first()
            .map(|s| s.url.trim_end_matches('/').to_string())
            .unwrap_or_default();

        Template::parse(CLIENT)?.render(
            &Values::new()
                .set("title", self.doc.info.title.as_str())
                .set("version", self.doc.info.version.as_str())
                .set_opt("imports", imports)
                .set("base_url", base_url)
                .set("namespace", namespace)
                .set("body", splice(&body, 2)),
            0,
        )
    }

    /// The emitted interfaces, name → file body, in emission order.
    pub fn into_interfaces(self) -> IndexMap<String, String> {
        self.types.interfaces().clone()
    }

    /// Methods first, then child scopes, blank-line separated.
    fn emit_node(&mut self, node: &PathNode<'a>) -> Result<String> {
        let mut blocks = Vec::new();
        if let Some(url) = &node.url {
            for op in &node.operations {
                blocks.push(self.emit_method(url, op)?);
            }
        }
        let scope_template = Template::parse(SCOPE)?;
        for (segment, child) in &node.children {
            let body = self.emit_node(child)?;
            let values = Values::new()
                .set("name", property_key(&scope_name(segment)))
                .set("body", splice(&body, 2));
            blocks.push(scope_template.render(&values, 0)?);
        }
        Ok(blocks.join("\n\n"))
    }

    fn emit_method(&mut self, url: &str, op: &BoundOperation<'a>) -> Result<String> {
        let operation = op.operation;
        let op_name = operation_name(op.method, url, operation.operation_id.as_deref());
        let parameters = self.merge_parameters(op)?;

        // Path arguments, in URL segment order.
        let (path, path_params) = interpolate(url);
        let mut args = Vec::new();
        for param_name in &path_params {
            let ty = match parameters.get(param_name.as_str()).copied() {
                Some(param) if param.location == "path" => match &param.schema {
                    Some(schema) => {
                        self.types
                            .resolve(schema, None, Some(op_name.as_str()), Some(param_name.as_str()))?
                    }
                    None => TsType::String,
                },
                _ => TsType::String,
            };
            self.import(&ty);
            args.push(format!("{}: {}", camel_case(param_name), ty.ts()));
        }

        // Request body, JSON content only.
        let mut body_arg = None;
        let mut body_required = false;
        if let Some(request_body) = &operation.request_body {
            let (body_name, body) = self.resolver.request_body(request_body, None)?;
            let schema = body
                .content
                .as_ref()
                .and_then(|content| content.get("application/json"))
                .and_then(|media| media.schema.as_ref());
            if let Some(schema) = schema {
                let ty = self.types.resolve(
                    schema,
                    body_name.as_deref(),
                    Some(op_name.as_str()),
                    Some("body"),
                )?;
                self.import(&ty);
                body_required = body.required;
                body_arg = Some(ty);
            }
        }

        // Query object; optional only when nothing after it is required.
        let query_params: Vec<&Parameter> = parameters
            .values()
            .filter(|p| p.location == "query")
            .copied()
            .collect();
        let mut query_arg = None;
        if !query_params.is_empty() {
            let mut fields = Vec::new();
            let mut all_optional = true;
            for &param in &query_params {
                let ty = match &param.schema {
                    Some(schema) => {
                        self.types
                            .resolve(schema, None, Some(op_name.as_str()), Some(param.name.as_str()))?
                    }
                    None => TsType::String,
                };
                self.import(&ty);
                all_optional &= !param.required;
                fields.push(format!(
                    "{}{}: {}",
                    property_key(&param.name),
                    if param.required { "" } else { "?" },
                    ty.ts(),
                ));
            }
            let optional = all_optional && (body_arg.is_none() || !body_required);
            query_arg = Some((format!("{{ {} }}", fields.join("; ")), optional));
        }

        if let Some((ty, optional)) = &query_arg {
            args.push(format!("query{}: {}", if *optional { "?" } else { "" }, ty));
        }
        if let Some(ty) = &body_arg {
            args.push(format!(
                "body{}: {}",
                if body_required { "" } else { "?" },
                ty.ts(),
            ));
        }
        args.push("options?: RequestInit".to_string());

        // First 2xx response with a JSON schema wins; none means void.
        let ret = self.response_type(op, &op_name)?;
        if let Some(ty) = &ret {
            self.import(ty);
        }

        let values = Values::new()
            .set("documented", operation.summary.is_some())
            .set_opt("summary", operation.summary.as_deref())
            .set("method", op.method.as_str())
            .set("url", url)
            .set("name", op.method.fn_name())
            .set("args", args.join(", "))
            .set(
                "ret",
                ret.as_ref()
                    .map(|ty| format!("{} | null", ty.ts()))
                    .unwrap_or_else(|| "void".to_string()),
            )
            .set_opt("targ", ret.as_ref().map(|ty| format!("<{}>", ty.ts())))
            .set("path", path)
            .set(
                "query_arg",
                query_arg.map(|_| "query").unwrap_or("undefined"),
            )
            .set("body_arg", body_arg.map(|_| "body").unwrap_or("undefined"))
            .set_opt("then", ret.is_none().then_some(".then(() => undefined)"));

        Template::parse(METHOD)?
            .with_formatter("summary", single_line)
            .render(&values, 0)
    }

    /// Path-level parameters first, operation parameters override by name.
    fn merge_parameters(
        &mut self,
        op: &BoundOperation<'a>,
    ) -> Result<IndexMap<&'a str, &'a Parameter>> {
        let mut merged: IndexMap<&str, &Parameter> = IndexMap::new();
        let sources = op
            .shared_parameters
            .into_iter()
            .chain(op.operation.parameters.as_ref());
        for source in sources {
            for node in source {
                let (_, param) = self.resolver.parameter(node, None)?;
                merged.insert(param.name.as_str(), param);
            }
        }
        Ok(merged)
    }

    /// The success payload type, or `None` for an empty (`void`) response.
    fn response_type(&mut self, op: &BoundOperation<'a>, op_name: &str) -> Result<Option<TsType>> {
        let Some((_, response, response_name)) = op
            .operation
            .responses
            .iter()
            .find(|(status, _)| status.starts_with('2'))
            .map(|(status, node)| {
                self.resolver
                    .response(node, None)
                    .map(|(name, response)| (status, response, name))
            })
            .transpose()?
        else {
            return Ok(None);
        };

        let Some(content) = &response.content else {
            return Ok(None);
        };
        let schema = content
            .get("application/json")
            .or_else(|| content.values().find(|media| media.schema.is_some()))
            .and_then(|media| media.schema.as_ref());
        let Some(schema) = schema else {
            return Ok(None);
        };

        let ty = self.types.resolve(
            schema,
            response_name.as_deref(),
            Some(op_name),
            Some("response"),
        )?;
        Ok(match ty {
            TsType::Void => None,
            other => Some(other),
        })
    }

    fn import(&mut self, ty: &TsType) {
        ty.collect_refs(&mut self.imports);
    }
}

/// Collapses text to one line for a doc comment.
fn single_line(value: &Value) -> String {
    value.display().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Indents every non-empty line after the first, so a multi-line block can be
/// substituted at an already-indented template position.
fn splice(block: &str, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let mut out = String::new();
    for (i, line) in block.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&pad);
            }
        }
        out.push_str(line);
    }
    out
}

/// `{param}` segments scope as `byParam`; everything else is camel-cased.
fn scope_name(segment: &str) -> String {
    match segment
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(param) => format!("by{}", pascal_case(param)),
        None => camel_case(segment),
    }
}

/// Name stem for types synthesized inside one operation.
fn operation_name(method: HttpMethod, url: &str, operation_id: Option<&str>) -> String {
    if let Some(id) = operation_id {
        return pascal_case(id);
    }
    let mut name = pascal_case(method.fn_name());
    for segment in url.split('/').filter(|s| !s.is_empty()) {
        name.push_str(&pascal_case(segment.trim_matches(['{', '}'])));
    }
    name
}

/// Rewrites `{param}` segments to `${param}` template interpolations and
/// returns the parameter names in order.
fn interpolate(url: &str) -> (String, Vec<String>) {
    let mut params = Vec::new();
    let path = url
        .split('/')
        .map(|segment| {
            match segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                Some(param) => {
                    params.push(param.to_string());
                    format!("${{{}}}", camel_case(param))
                }
                None => segment.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("/");
    (path, params)
}

/// `team_member` becomes `teamMember`.
fn camel_case(input: &str) -> String {
    let pascal = pascal_case(input);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_ascii_lowercase(), chars.as_str()),
        None => pascal,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn emit(json: &str) -> (String, IndexMap<String, String>) {
        let doc = Document::from_json(json).unwrap();
        let tree = RouteTree::build(&doc);
        let mut emitter = Emitter::new(&doc);
        emitter.emit_component_schemas().unwrap();
        let client = emitter.emit_client(&tree, "api").unwrap();
        (client, emitter.into_interfaces())
    }

    const TEAMS: &str = r##"{
        "openapi": "3.0.3",
        "info": { "title": "Teams", "version": "2.1.0" },
        "servers": [{ "url": "https://api.example.com/v1/" }],
        "paths": {
            "/teams": {
                "get": {
                    "summary": "List all teams.",
                    "parameters": [
                        { "name": "limit", "in": "query",
                          "schema": { "type": "integer" } }
                    ],
                    "responses": {
                        "200": {
                            "description": "ok",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Team" }
                                    }
                                }
                            }
                        }
                    }
                },
                "post": {
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/Team" }
                            }
                        }
                    },
                    "responses": {
                        "201": {
                            "description": "created",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Team" }
                                }
                            }
                        }
                    }
                }
            },
            "/teams/{team_id}": {
                "parameters": [
                    { "name": "team_id", "in": "path", "required": true,
                      "schema": { "type": "integer" } }
                ],
                "get": {
                    "responses": {
                        "200": {
                            "description": "ok",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Team" }
                                }
                            }
                        }
                    }
                },
                "delete": {
                    "responses": { "204": { "description": "gone" } }
                }
            }
        },
        "components": {
            "schemas": {
                "Team": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string" }
                    },
                    "required": ["name"]
                }
            }
        }
    }"##;

    #[test]
    fn test_client_shell() {
        let (client, _) = emit(TEAMS);
        assert!(client.starts_with("// Generated API client for Teams v2.1.0."));
        assert!(client.contains("const BASE_URL = \"https://api.example.com/v1\";"));
        assert!(client.contains("import type { Team } from \"./schemas/Team\";"));
        assert!(client.contains("export const api = {"));
        assert!(client.ends_with("};\n"));
    }

    #[test]
    fn test_scope_nesting_and_parameter_scope_name() {
        let (client, _) = emit(TEAMS);
        assert!(client.contains("  teams: {"));
        assert!(client.contains("    byTeamId: {"));
    }

    #[test]
    fn test_method_signatures() {
        let (client, _) = emit(TEAMS);
        assert!(client.contains("/** List all teams. */"));
        assert!(client.contains("/** GET /teams */"));
        assert!(client.contains(
            "get(query?: { limit?: number }, options?: RequestInit): Promise<Team[] | null>"
        ));
        assert!(client.contains("post(body: Team, options?: RequestInit): Promise<Team | null>"));
        assert!(client.contains(
            "get(teamId: number, options?: RequestInit): Promise<Team | null>"
        ));
    }

    #[test]
    fn test_path_interpolation_and_request_calls() {
        let (client, _) = emit(TEAMS);
        assert!(client.contains("request<Team[]>(`/teams`, \"GET\", query, undefined, options)"));
        assert!(client.contains("request<Team>(`/teams`, \"POST\", undefined, body, options)"));
        assert!(client.contains(
            "request<Team>(`/teams/${teamId}`, \"GET\", undefined, undefined, options)"
        ));
    }

    #[test]
    fn test_empty_response_is_void() {
        let (client, _) = emit(TEAMS);
        assert!(client.contains(
            "delete(teamId: number, options?: RequestInit): Promise<void>"
        ));
        assert!(client.contains(
            "request(`/teams/${teamId}`, \"DELETE\", undefined, undefined, options).then(() => undefined);"
        ));
    }

    #[test]
    fn test_component_schemas_emitted_without_references() {
        let (_, interfaces) = emit(
            r#"{
                "openapi": "3.0.3",
                "info": { "title": "T", "version": "1" },
                "paths": {},
                "components": {
                    "schemas": {
                        "Orphan": {
                            "type": "object",
                            "properties": { "x": { "type": "string" } }
                        }
                    }
                }
            }"#,
        );
        assert!(interfaces.contains_key("Orphan"));
    }

    #[test]
    fn test_inline_body_and_response_get_synthesized_names() {
        let (client, interfaces) = emit(
            r#"{
                "openapi": "3.0.3",
                "info": { "title": "T", "version": "1" },
                "paths": {
                    "/login": {
                        "post": {
                            "operationId": "login_user",
                            "requestBody": {
                                "required": true,
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "token": { "type": "string" } },
                                            "required": ["token"]
                                        }
                                    }
                                }
                            },
                            "responses": {
                                "200": {
                                    "description": "ok",
                                    "content": {
                                        "application/json": {
                                            "schema": {
                                                "type": "object",
                                                "properties": { "ok": { "type": "boolean" } }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }"#,
        );
        assert!(interfaces.contains_key("LoginUserBody"));
        assert!(interfaces.contains_key("LoginUserResponse"));
        assert!(client.contains("body: LoginUserBody"));
        assert!(client.contains("Promise<LoginUserResponse | null>"));
    }

    #[test]
    fn test_operation_parameter_overrides_shared() {
        let (client, _) = emit(
            r#"{
                "openapi": "3.0.3",
                "info": { "title": "T", "version": "1" },
                "paths": {
                    "/items/{id}": {
                        "parameters": [
                            { "name": "id", "in": "path", "required": true,
                              "schema": { "type": "string" } }
                        ],
                        "get": {
                            "parameters": [
                                { "name": "id", "in": "path", "required": true,
                                  "schema": { "type": "integer" } }
                            ],
                            "responses": {}
                        }
                    }
                }
            }"#,
        );
        assert!(client.contains("get(id: number, options?: RequestInit)"));
    }

    #[test]
    fn test_determinism() {
        let (first, first_files) = emit(TEAMS);
        let (second, second_files) = emit(TEAMS);
        assert_eq!(first, second);
        assert_eq!(first_files, second_files);
    }

    #[test]
    fn test_helpers() {
        assert_eq!(camel_case("team_member"), "teamMember");
        assert_eq!(scope_name("{user_id}"), "byUserId");
        assert_eq!(scope_name("audit-log"), "auditLog");
        assert_eq!(
            operation_name(HttpMethod::Get, "/teams/{id}/members", None),
            "GetTeamsIdMembers"
        );
        assert_eq!(
            operation_name(HttpMethod::Post, "/x", Some("create_team")),
            "CreateTeam"
        );
        assert_eq!(interpolate("/a/{id}/b"), (
            "/a/${id}/b".to_string(),
            vec!["id".to_string()],
        ));
        assert_eq!(splice("a\nb\n\nc", 2), "a\n  b\n\n  c");
    }
}

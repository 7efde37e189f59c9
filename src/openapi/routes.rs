//! Route tree built from the document's path table.
//!
//! URL templates are split on `/` and folded into a trie, so `/teams/{id}`
//! and `/teams/{id}/members` share the `teams` and `{id}` nodes. The tree
//! shape drives the nesting of the emitted client object.

use indexmap::IndexMap;
use tracing::trace;

use super::spec::{Document, HttpMethod, Operation, Parameter, RefOr};

/// An operation bound to its node, carrying the path-level parameters it
/// inherits.
#[derive(Debug)]
pub struct BoundOperation<'a> {
    pub method: HttpMethod,
    pub operation: &'a Operation,
    pub shared_parameters: Option<&'a Vec<RefOr<Parameter>>>,
}

/// One segment of the route trie.
#[derive(Debug)]
pub struct PathNode<'a> {
    /// The full URL template, present only on endpoint nodes.
    pub url: Option<String>,
    /// For `{name}` segments, the path parameter name.
    pub parameter: Option<String>,
    /// Operations attached to this node's URL.
    pub operations: Vec<BoundOperation<'a>>,
    /// Child segment → node, in first-encountered order.
    pub children: IndexMap<String, PathNode<'a>>,
}

impl<'a> PathNode<'a> {
    fn new(segment: &str) -> Self {
        let parameter = segment
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .map(str::to_owned);
        PathNode {
            url: None,
            parameter,
            operations: Vec::new(),
            children: IndexMap::new(),
        }
    }

    /// Whether any operation is attached at this node.
    pub fn is_endpoint(&self) -> bool {
        !self.operations.is_empty()
    }
}

/// The whole route trie, rooted at `/`.
#[derive(Debug)]
pub struct RouteTree<'a> {
    pub root: PathNode<'a>,
}

impl<'a> RouteTree<'a> {
    /// Folds every path table entry into the trie, in document order.
    pub fn build(doc: &'a Document) -> Self {
        let mut root = PathNode::new("");
        root.url = Some("/".to_string());
        for (url, item) in &doc.paths {
            let mut node = &mut root;
            for segment in url.split('/').filter(|s| !s.is_empty()) {
                node = node
                    .children
                    .entry(segment.to_string())
                    .or_insert_with(|| PathNode::new(segment));
            }
            node.url = Some(url.clone());
            for (method, operation) in item.operations() {
                trace!(url = %url, method = method.as_str(), "binding operation");
                node.operations.push(BoundOperation {
                    method,
                    operation,
                    shared_parameters: item.parameters.as_ref(),
                });
            }
        }
        RouteTree { root }
    }

    /// One line per node, for diagnostics. Each line carries the node's
    /// path, every path parameter bound from the root down to it, and the
    /// attached HTTP methods.
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        describe_node(&self.root, "/", &[], &mut lines);
        lines.join("\n")
    }
}

fn describe_node<'a>(
    node: &'a PathNode<'_>,
    label: &str,
    inherited: &[&'a str],
    lines: &mut Vec<String>,
) {
    let mut params = inherited.to_vec();
    if let Some(parameter) = &node.parameter {
        params.push(parameter);
    }
    let mut line = label.to_string();
    if !params.is_empty() {
        line.push_str(&format!(" (params: {})", params.join(", ")));
    }
    if node.is_endpoint() {
        let methods: Vec<_> = node
            .operations
            .iter()
            .map(|op| op.method.as_str())
            .collect();
        line.push_str(&format!(" [{}]", methods.join(", ")));
    }
    lines.push(line);
    for (segment, child) in &node.children {
        describe_node(child, &format!("{label}{segment}/"), &params, lines);
    }
}

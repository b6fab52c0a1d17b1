// Relationship extraction between known entities
//
// Runs after the full node set exists. Two passes walk the syntax tree
// (constructor injection, top-level instantiation) and two scan the raw
// text (import bindings, extends/implements clauses). Edges only ever
// point at names present in the node map.

use crate::analysis::graph::{nodes_named, Edge, Node, NodeMap};
use crate::error::{Error, Result};
use crate::parser::{node_text, SourceParser};
use regex::Regex;
use std::path::Path;
use tree_sitter::Node as SyntaxNode;

pub struct RelationshipExtractor {
    parser: SourceParser,
    import_re: Regex,
    extends_re: Regex,
}

impl RelationshipExtractor {
    pub fn new() -> Result<Self> {
        let import_re = Regex::new(r#"import\s+\{([^}]*)\}\s+from\s+['"][^'"]+['"]"#)
            .map_err(|e| Error::parser(format!("import pattern: {}", e)))?;
        let extends_re = Regex::new(r"class\s+(\w+)\s+extends\s+(\w+)(?:\s+implements\s+([^{]+))?")
            .map_err(|e| Error::parser(format!("inheritance pattern: {}", e)))?;

        Ok(Self {
            parser: SourceParser::new()?,
            import_re,
            extends_re,
        })
    }

    /// Derive all edges from one file against the complete node set.
    ///
    /// The source node is the one whose file path matches; files without
    /// a surviving node contribute nothing. `Err` means the file could
    /// not be parsed and no passes ran.
    pub fn extract(&mut self, path: &Path, source: &str, nodes: &NodeMap) -> Result<Vec<Edge>> {
        let mut edges = Vec::new();
        let Some(node) = nodes.values().find(|n| n.file_path == path) else {
            return Ok(edges);
        };

        let tree = self.parser.parse(path, source)?;
        let bytes = source.as_bytes();
        let root = tree.root_node();

        self.injection_edges(&root, bytes, node, nodes, &mut edges);
        self.import_edges(source, node, nodes, &mut edges);
        self.inheritance_edges(source, node, nodes, &mut edges);
        self.instantiation_edges(&root, bytes, node, nodes, &mut edges);

        Ok(edges)
    }

    /// Constructor parameters with class-typed annotations become
    /// `depends on` edges. Only the class matching the node name is
    /// considered.
    fn injection_edges(
        &self,
        root: &SyntaxNode,
        source: &[u8],
        node: &Node,
        nodes: &NodeMap,
        edges: &mut Vec<Edge>,
    ) {
        let Some(class) = class_named(root, source, &node.name) else {
            return;
        };
        let Some(body) = class.child_by_field_name("body") else {
            return;
        };

        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() != "method_definition" {
                continue;
            }
            let is_constructor = member
                .child_by_field_name("name")
                .map_or(false, |n| node_text(&n, source) == "constructor");
            if !is_constructor {
                continue;
            }
            let Some(params) = member.child_by_field_name("parameters") else {
                continue;
            };

            let mut params_cursor = params.walk();
            for param in params.children(&mut params_cursor) {
                if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
                    continue;
                }
                let Some(type_name) = annotation_type_name(&param, source) else {
                    continue;
                };
                for target in nodes_named(nodes, type_name) {
                    if target.id != node.id {
                        edges.push(Edge::depends_on(&node.id, &target.id));
                    }
                }
            }
        }
    }

    /// Named import bindings that refer to known nodes become `imports`
    /// edges. Deliberately textual; a binding that is never used still
    /// counts.
    fn import_edges(&self, source: &str, node: &Node, nodes: &NodeMap, edges: &mut Vec<Edge>) {
        for captures in self.import_re.captures_iter(source) {
            let Some(bindings) = captures.get(1) else {
                continue;
            };
            for binding in bindings.as_str().split(',') {
                for word in binding.split_whitespace() {
                    if word == "as" || word == "type" {
                        continue;
                    }
                    for target in nodes_named(nodes, word) {
                        if target.id != node.id {
                            edges.push(Edge::imports(&node.id, &target.id));
                        }
                    }
                }
            }
        }
    }

    /// `class X extends Y implements Z1, Z2` clauses naming known nodes.
    /// Only fires for the node's own class; an implements clause without
    /// extends is not recognized.
    fn inheritance_edges(&self, source: &str, node: &Node, nodes: &NodeMap, edges: &mut Vec<Edge>) {
        for captures in self.extends_re.captures_iter(source) {
            let class_name = captures.get(1).map_or("", |m| m.as_str());
            if class_name != node.name {
                continue;
            }

            if let Some(base) = captures.get(2) {
                for target in nodes_named(nodes, base.as_str()) {
                    if target.id != node.id {
                        edges.push(Edge::extends(&node.id, &target.id));
                    }
                }
            }

            if let Some(interfaces) = captures.get(3) {
                for interface in interfaces.as_str().split(',') {
                    let interface = interface.trim();
                    if interface.is_empty() {
                        continue;
                    }
                    for target in nodes_named(nodes, interface) {
                        if target.id != node.id {
                            edges.push(Edge::implements(&node.id, &target.id));
                        }
                    }
                }
            }
        }
    }

    /// Top-level `const x = new ClassName(...)` declarations become
    /// `instantiates` edges. Instantiation inside function or method
    /// bodies is out of scope.
    fn instantiation_edges(
        &self,
        root: &SyntaxNode,
        source: &[u8],
        node: &Node,
        nodes: &NodeMap,
        edges: &mut Vec<Edge>,
    ) {
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                "lexical_declaration" | "variable_declaration" => {
                    self.declaration_edges(&child, source, node, nodes, edges);
                }
                "export_statement" => {
                    let mut export_cursor = child.walk();
                    for grandchild in child.children(&mut export_cursor) {
                        if matches!(
                            grandchild.kind(),
                            "lexical_declaration" | "variable_declaration"
                        ) {
                            self.declaration_edges(&grandchild, source, node, nodes, edges);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn declaration_edges(
        &self,
        declaration: &SyntaxNode,
        source: &[u8],
        node: &Node,
        nodes: &NodeMap,
        edges: &mut Vec<Edge>,
    ) {
        let mut cursor = declaration.walk();
        for declarator in declaration.children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(value) = declarator.child_by_field_name("value") else {
                continue;
            };
            if value.kind() != "new_expression" {
                continue;
            }
            let Some(constructor) = value.child_by_field_name("constructor") else {
                continue;
            };
            let constructor_name = node_text(&constructor, source);
            for target in nodes_named(nodes, constructor_name) {
                if target.id != node.id {
                    edges.push(Edge::instantiates(&node.id, &target.id));
                }
            }
        }
    }
}

/// Find the top-level class with the given name, looking through export
/// wrappers
fn class_named<'tree>(
    root: &SyntaxNode<'tree>,
    source: &[u8],
    name: &str,
) -> Option<SyntaxNode<'tree>> {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "class_declaration" | "abstract_class_declaration" => {
                if class_name_matches(&child, source, name) {
                    return Some(child);
                }
            }
            "export_statement" => {
                let mut export_cursor = child.walk();
                for grandchild in child.children(&mut export_cursor) {
                    if matches!(
                        grandchild.kind(),
                        "class_declaration" | "abstract_class_declaration"
                    ) && class_name_matches(&grandchild, source, name)
                    {
                        return Some(grandchild);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn class_name_matches(class: &SyntaxNode, source: &[u8], name: &str) -> bool {
    class
        .child_by_field_name("name")
        .map_or(false, |n| node_text(&n, source) == name)
}

/// Name of a parameter's type annotation when it is a plain or generic
/// type reference. Keyword types (`string`, `number`) yield nothing.
fn annotation_type_name<'a>(param: &SyntaxNode, source: &'a [u8]) -> Option<&'a str> {
    let annotation = param.child_by_field_name("type")?;
    let mut cursor = annotation.walk();
    for child in annotation.children(&mut cursor) {
        match child.kind() {
            "type_identifier" => return Some(node_text(&child, source)),
            "generic_type" => {
                if let Some(name) = child.child_by_field_name("name") {
                    return Some(node_text(&name, source));
                }
            }
            _ => {}
        }
    }
    None
}

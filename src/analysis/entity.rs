// Entity extraction: one node per parseable source file

use crate::analysis::classify::classify;
use crate::analysis::graph::Node;
use crate::error::Result;
use crate::parser::{node_text, SourceParser};
use std::path::Path;
use tree_sitter::Node as SyntaxNode;

/// Extracts the primary entity of a source file.
///
/// The first named top-level class supplies the node name and members;
/// later classes in the same file are ignored. A file without any class
/// still yields a node named after the file stem.
pub struct EntityExtractor {
    parser: SourceParser,
}

impl EntityExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: SourceParser::new()?,
        })
    }

    /// Extract the node for one file. `Err` means the file could not be
    /// parsed; the caller decides whether to skip it.
    pub fn extract(&mut self, path: &Path, source: &str, root: &Path) -> Result<Node> {
        let tree = self.parser.parse(path, source)?;
        let kind = classify(path);
        let directory = relative_directory(path, root);
        let bytes = source.as_bytes();

        let class = first_named_class(&tree.root_node());
        let name = class
            .as_ref()
            .and_then(|c| c.child_by_field_name("name"))
            .map(|n| node_text(&n, bytes).to_string())
            .unwrap_or_else(|| file_stem(path));

        let mut node = Node::new(name, kind, path, directory);
        if let Some(class) = class {
            collect_members(&class, bytes, &mut node);
        }

        Ok(node)
    }
}

/// Project-relative directory of a file, forward slashes, `.` at the root
pub(crate) fn relative_directory(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    match relative.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.to_string_lossy().replace('\\', "/")
        }
        _ => ".".to_string(),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Find the first named top-level class, looking through export wrappers.
/// Anonymous classes (`export default class {}`) do not count.
fn first_named_class<'tree>(root: &SyntaxNode<'tree>) -> Option<SyntaxNode<'tree>> {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "class_declaration" | "abstract_class_declaration" => {
                if child.child_by_field_name("name").is_some() {
                    return Some(child);
                }
            }
            "export_statement" => {
                let mut export_cursor = child.walk();
                for grandchild in child.children(&mut export_cursor) {
                    if matches!(
                        grandchild.kind(),
                        "class_declaration" | "abstract_class_declaration"
                    ) && grandchild.child_by_field_name("name").is_some()
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

/// Collect public method and property names from a class body.
/// Constructors, accessors, and underscore-prefixed names are skipped.
fn collect_members(class: &SyntaxNode, source: &[u8], node: &mut Node) {
    let Some(body) = class.child_by_field_name("body") else {
        return;
    };

    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        match member.kind() {
            "method_definition" => {
                if is_accessor(&member) {
                    continue;
                }
                if let Some(name_node) = member.child_by_field_name("name") {
                    let name = node_text(&name_node, source);
                    if name != "constructor" && !name.starts_with('_') {
                        node.methods.push(name.to_string());
                    }
                }
            }
            "public_field_definition" | "field_definition" => {
                if let Some(name_node) = member.child_by_field_name("name") {
                    let name = node_text(&name_node, source);
                    if !name.starts_with('_') {
                        node.properties.push(name.to_string());
                    }
                }
            }
            _ => {}
        }
    }
}

/// Get/set accessors parse as method definitions; the keyword token
/// marks them.
fn is_accessor(member: &SyntaxNode) -> bool {
    let mut cursor = member.walk();
    let has_accessor_keyword = member
        .children(&mut cursor)
        .any(|child| matches!(child.kind(), "get" | "set"));
    has_accessor_keyword
}

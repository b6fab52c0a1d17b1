// Graph data model for entity relationships

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Architectural role of a source file's primary entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Model,
    Repository,
    Service,
    Controller,
    Middleware,
    Other,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Model => "Model",
            NodeKind::Repository => "Repository",
            NodeKind::Service => "Service",
            NodeKind::Controller => "Controller",
            NodeKind::Middleware => "Middleware",
            NodeKind::Other => "Other",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the stable node id for a (kind, name) pair
pub fn node_id(kind: NodeKind, name: &str) -> String {
    format!("{}-{}", kind, name)
}

/// A code entity extracted from one source file.
///
/// The id is derived from kind and name, so two files declaring the same
/// class under the same role collapse to a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Stable identity, `<Kind>-<Name>`
    pub id: String,
    /// Display name of the primary class (or the file stem)
    pub name: String,
    /// Entity kind, serialized as `type` for the renderer
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Absolute path of the source file
    pub file_path: PathBuf,
    /// Project-relative directory with forward slashes, `.` at the root
    pub directory: String,
    /// Public method names of the primary class
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    /// Public property names of the primary class
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        kind: NodeKind,
        file_path: impl Into<PathBuf>,
        directory: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: node_id(kind, &name),
            name,
            kind,
            file_path: file_path.into(),
            directory: directory.into(),
            methods: Vec::new(),
            properties: Vec::new(),
        }
    }
}

/// Node lookup table keyed by node id
pub type NodeMap = HashMap<String, Node>;

/// All nodes sharing a display name. Names are not unique across kinds,
/// so callers get every candidate.
pub fn nodes_named<'a>(nodes: &'a NodeMap, name: &str) -> impl Iterator<Item = &'a Node> {
    let name = name.to_string();
    nodes.values().filter(move |node| node.name == name)
}

/// Kind of relationship between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    #[serde(rename = "extends")]
    Extends,
    #[serde(rename = "implements")]
    Implements,
    #[serde(rename = "depends on")]
    DependsOn,
    #[serde(rename = "imports")]
    Imports,
    #[serde(rename = "instantiates")]
    Instantiates,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Extends => "extends",
            RelationKind::Implements => "implements",
            RelationKind::DependsOn => "depends on",
            RelationKind::Imports => "imports",
            RelationKind::Instantiates => "instantiates",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed relationship between two nodes.
///
/// Edges carry ids only. Duplicate edges are allowed; they are presence
/// signals, not multiplicities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub relationship: RelationKind,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relationship: RelationKind,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relationship,
        }
    }

    pub fn extends(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, RelationKind::Extends)
    }

    pub fn implements(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, RelationKind::Implements)
    }

    pub fn depends_on(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, RelationKind::DependsOn)
    }

    pub fn imports(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, RelationKind::Imports)
    }

    pub fn instantiates(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, RelationKind::Instantiates)
    }
}

/// Serializable graph slice returned by queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipData {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl RelationshipData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

// Snapshot filtering

use crate::analysis::graph::{Edge, Node, NodeMap, RelationshipData};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Filters applied to a cached snapshot. `directory` and `file_name`
/// are case-insensitive substring matches combined with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    /// Return the entire snapshot, ignoring the other filters
    pub include_all: bool,
    /// Substring of the node's project-relative directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Substring of the node's name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Widen the result by one hop along any edge touching a match
    pub include_related_nodes: bool,
}

impl SearchCriteria {
    pub fn all() -> Self {
        Self {
            include_all: true,
            ..Self::default()
        }
    }

    pub fn with_directory(directory: impl Into<String>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            ..Self::default()
        }
    }

    pub fn with_related(mut self) -> Self {
        self.include_related_nodes = true;
        self
    }

    fn matches(&self, node: &Node) -> bool {
        if let Some(directory) = &self.directory {
            if !node
                .directory
                .to_lowercase()
                .contains(&directory.to_lowercase())
            {
                return false;
            }
        }
        if let Some(file_name) = &self.file_name {
            if !node.name.to_lowercase().contains(&file_name.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Apply `criteria` to a snapshot. Nodes come back sorted by id so the
/// output is stable across runs; edges keep their extraction order.
pub fn run_query(nodes: &NodeMap, edges: &[Edge], criteria: &SearchCriteria) -> RelationshipData {
    if criteria.include_all {
        return RelationshipData {
            nodes: collect_sorted(nodes, |_| true),
            edges: edges.to_vec(),
        };
    }

    let matched: HashSet<&str> = nodes
        .values()
        .filter(|node| criteria.matches(node))
        .map(|node| node.id.as_str())
        .collect();

    if !criteria.include_related_nodes {
        let direct: Vec<Edge> = edges
            .iter()
            .filter(|edge| {
                matched.contains(edge.source.as_str()) && matched.contains(edge.target.as_str())
            })
            .cloned()
            .collect();
        return RelationshipData {
            nodes: collect_sorted(nodes, |node| matched.contains(node.id.as_str())),
            edges: direct,
        };
    }

    // One hop out: an edge touching a match is kept, and the far end
    // joins the result. Neighbors do not recruit their own neighbors.
    let mut related: HashSet<String> = matched.iter().map(|id| id.to_string()).collect();
    let mut relevant = Vec::new();
    for edge in edges {
        if matched.contains(edge.source.as_str()) {
            relevant.push(edge.clone());
            related.insert(edge.target.clone());
        } else if matched.contains(edge.target.as_str()) {
            relevant.push(edge.clone());
            related.insert(edge.source.clone());
        }
    }

    RelationshipData {
        nodes: collect_sorted(nodes, |node| related.contains(&node.id)),
        edges: relevant,
    }
}

fn collect_sorted(nodes: &NodeMap, keep: impl Fn(&Node) -> bool) -> Vec<Node> {
    let mut out: Vec<Node> = nodes.values().filter(|n| keep(n)).cloned().collect();
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::graph::NodeKind;

    fn fixture() -> (NodeMap, Vec<Edge>) {
        let nodes: NodeMap = [
            Node::new(
                "UserController",
                NodeKind::Controller,
                "/p/src/controllers/UserController.ts",
                "src/controllers",
            ),
            Node::new(
                "UserService",
                NodeKind::Service,
                "/p/src/services/UserService.ts",
                "src/services",
            ),
            Node::new(
                "UserRepository",
                NodeKind::Repository,
                "/p/src/repositories/UserRepository.ts",
                "src/repositories",
            ),
        ]
        .into_iter()
        .map(|n| (n.id.clone(), n))
        .collect();

        let edges = vec![
            Edge::depends_on("Controller-UserController", "Service-UserService"),
            Edge::depends_on("Service-UserService", "Repository-UserRepository"),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_include_all_returns_everything_sorted() {
        let (nodes, edges) = fixture();
        let data = run_query(&nodes, &edges, &SearchCriteria::all());
        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.edges.len(), 2);
        let ids: Vec<_> = data.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_directory_filter_is_substring_case_insensitive() {
        let (nodes, edges) = fixture();
        let data = run_query(&nodes, &edges, &SearchCriteria::with_directory("SERVICES"));
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].id, "Service-UserService");
    }

    #[test]
    fn test_name_filter_matches_node_name() {
        let (nodes, edges) = fixture();
        let data = run_query(&nodes, &edges, &SearchCriteria::with_file_name("repo"));
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].id, "Repository-UserRepository");
    }

    #[test]
    fn test_filters_combine_conjunctively() {
        let (nodes, edges) = fixture();
        let mut criteria = SearchCriteria::with_directory("src");
        criteria.file_name = Some("controller".into());
        let data = run_query(&nodes, &edges, &criteria);
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].id, "Controller-UserController");

        criteria.file_name = Some("nothing".into());
        let data = run_query(&nodes, &edges, &criteria);
        assert!(data.nodes.is_empty());
    }

    #[test]
    fn test_direct_edges_require_both_endpoints() {
        let (nodes, edges) = fixture();
        let data = run_query(&nodes, &edges, &SearchCriteria::with_file_name("user"));
        // All three nodes match "user" so both edges survive
        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.edges.len(), 2);

        let data = run_query(&nodes, &edges, &SearchCriteria::with_file_name("service"));
        assert_eq!(data.nodes.len(), 1);
        assert!(data.edges.is_empty());
    }

    #[test]
    fn test_related_widens_by_one_hop_only() {
        let (nodes, edges) = fixture();
        let criteria = SearchCriteria::with_file_name("controller").with_related();
        let data = run_query(&nodes, &edges, &criteria);
        // Controller matches; Service joins via the edge; Repository
        // is two hops away and stays out
        let ids: Vec<_> = data.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["Controller-UserController", "Service-UserService"]);
        assert_eq!(data.edges.len(), 1);
    }

    #[test]
    fn test_related_includes_incoming_edges() {
        let (nodes, edges) = fixture();
        let criteria = SearchCriteria::with_file_name("service").with_related();
        let data = run_query(&nodes, &edges, &criteria);
        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.edges.len(), 2);
    }

    #[test]
    fn test_empty_criteria_matches_everything() {
        let (nodes, edges) = fixture();
        let data = run_query(&nodes, &edges, &SearchCriteria::default());
        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.edges.len(), 2);
    }

    #[test]
    fn test_criteria_wire_shape() {
        let criteria = SearchCriteria::with_directory("services").with_related();
        let json = serde_json::to_value(&criteria).unwrap();
        assert_eq!(json["includeAll"], false);
        assert_eq!(json["directory"], "services");
        assert_eq!(json["includeRelatedNodes"], true);
        assert!(json.get("fileName").is_none());

        let parsed: SearchCriteria = serde_json::from_str(r#"{"includeAll":true}"#).unwrap();
        assert!(parsed.include_all);
        assert!(!parsed.include_related_nodes);
    }
}

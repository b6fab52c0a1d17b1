// Mermaid rendering of relationship data

use crate::analysis::graph::{NodeKind, RelationshipData};

/// Node fill colors, one per kind
const KIND_STYLES: [(NodeKind, &str); 6] = [
    (NodeKind::Model, "fill:#477DC0,color:#fff"),
    (NodeKind::Repository, "fill:#D09144,color:#fff"),
    (NodeKind::Service, "fill:#7EB36A,color:#fff"),
    (NodeKind::Controller, "fill:#C64F4D,color:#fff"),
    (NodeKind::Middleware, "fill:#8B67AD,color:#fff"),
    (NodeKind::Other, "fill:#7099A6,color:#fff"),
];

/// Renders a `RelationshipData` as a Mermaid flowchart
pub struct DiagramGenerator {
    /// Layout direction (TB, LR, BT, RL)
    direction: String,
}

impl DiagramGenerator {
    pub fn new() -> Self {
        Self {
            direction: "TB".to_string(),
        }
    }

    /// Set layout direction
    pub fn with_direction(mut self, dir: &str) -> Self {
        self.direction = dir.to_string();
        self
    }

    /// Generate the flowchart. Node order follows the input, so sorted
    /// input gives reproducible diagrams.
    pub fn generate(&self, data: &RelationshipData) -> String {
        let mut lines = Vec::new();
        lines.push(format!("graph {}", self.direction));

        for node in &data.nodes {
            let safe_id = sanitize_id(&node.id);
            let class = node.kind.as_str().to_lowercase();
            lines.push(format!("    {}[\"{}\"]:::{}", safe_id, node.name, class));
        }

        for edge in &data.edges {
            let from_id = sanitize_id(&edge.source);
            let to_id = sanitize_id(&edge.target);
            lines.push(format!(
                "    {} -->|{}| {}",
                from_id, edge.relationship, to_id
            ));
        }

        for (kind, style) in KIND_STYLES {
            if data.nodes.iter().any(|n| n.kind == kind) {
                lines.push(format!(
                    "    classDef {} {}",
                    kind.as_str().to_lowercase(),
                    style
                ));
            }
        }

        lines.join("\n")
    }
}

impl Default for DiagramGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sanitize a string for use as a Mermaid node ID
fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

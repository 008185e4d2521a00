//! Graph export of resource dependency closures.
//!
//! Snapshots the managers a resource needs, together with their live state,
//! for debugging fixtures that are set up more often than expected.

use std::rc::Rc;

#[cfg(feature = "graph-export")]
use serde::{Deserialize, Serialize};

use crate::error::ResourceResult;
use crate::internal::dependency_closure;
use crate::node::ResourceNode;

/// A manager in the exported graph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphNode {
    /// Identity of the manager
    pub id: String,
    /// Manager name
    pub name: String,
    /// Position in the dependencies-first set-up order
    pub order: usize,
    pub set_up_cost: u32,
    pub tear_down_cost: u32,
    /// Outstanding holders at export time
    pub uses: usize,
    /// Own dirty flag at export time
    pub dirty: bool,
    /// Whether an instance was cached at export time
    pub has_instance: bool,
}

/// A declared dependency: `from` needs `to` under `label`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// Output formats understood by [`ResourceGraph::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Dot,
    Mermaid,
}

/// Dependency closure of one resource with per-manager state.
///
/// # Examples
///
/// ```
/// use ferrous_resources::{ExportFormat, FnResource, ResourceGraph, ResourceManager};
///
/// let schema = ResourceManager::new(FnResource::new(|_| Ok(1u32)).named("schema"));
/// let db = ResourceManager::builder(FnResource::new(|_| Ok(2u32)).named("db"))
///     .depends_on("schema", schema.clone())
///     .build()
///     .unwrap();
///
/// let graph = ResourceGraph::of(&db);
/// assert_eq!(graph.nodes.len(), 2);
/// assert_eq!(graph.nodes[0].name, "schema");
/// assert_eq!(graph.edges[0].label, "schema");
///
/// let dot = graph.export(ExportFormat::Dot).unwrap();
/// assert!(dot.contains("digraph Resources"));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "graph-export", derive(Serialize, Deserialize))]
pub struct ResourceGraph {
    /// Nodes in set-up order; the root is last
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl ResourceGraph {
    /// Builds the graph for any manager.
    pub fn of<N: ResourceNode + 'static>(root: &Rc<N>) -> Self {
        let root: Rc<dyn ResourceNode> = root.clone();
        Self::from_node(&root)
    }

    /// Builds the graph for a type-erased manager.
    pub fn from_node(root: &Rc<dyn ResourceNode>) -> Self {
        let closure = dependency_closure(root);
        let nodes = closure
            .iter()
            .enumerate()
            .map(|(order, node)| GraphNode {
                id: node.id().to_string(),
                name: node.name().to_string(),
                order,
                set_up_cost: node.set_up_cost(),
                tear_down_cost: node.tear_down_cost(),
                uses: node.uses(),
                dirty: node.is_dirty_self(),
                has_instance: node.has_instance(),
            })
            .collect();
        let edges = closure
            .iter()
            .flat_map(|node| {
                let from = node.id().to_string();
                node.dependencies()
                    .into_iter()
                    .map(move |(label, dependency)| GraphEdge {
                        from: from.clone(),
                        to: dependency.id().to_string(),
                        label,
                    })
            })
            .collect();
        Self { nodes, edges }
    }

    /// Sum of set-up costs over the whole closure.
    pub fn total_set_up_cost(&self) -> u64 {
        self.nodes.iter().map(|n| u64::from(n.set_up_cost)).sum()
    }

    /// Sum of tear-down costs over the whole closure.
    pub fn total_tear_down_cost(&self) -> u64 {
        self.nodes.iter().map(|n| u64::from(n.tear_down_cost)).sum()
    }

    pub fn export(&self, format: ExportFormat) -> ResourceResult<String> {
        match format {
            ExportFormat::Json => self.to_json(),
            ExportFormat::Dot => Ok(self.to_dot()),
            ExportFormat::Mermaid => Ok(self.to_mermaid()),
        }
    }

    /// Exports the graph as JSON.
    pub fn to_json(&self) -> ResourceResult<String> {
        #[cfg(feature = "graph-export")]
        {
            serde_json::to_string_pretty(self)
                .map_err(|e| crate::error::ResourceError::failed("graph-export", e))
        }
        #[cfg(not(feature = "graph-export"))]
        {
            // Fallback manual JSON generation
            let mut json = String::from("{\n  \"nodes\": [\n");
            for (i, node) in self.nodes.iter().enumerate() {
                if i > 0 {
                    json.push_str(",\n");
                }
                json.push_str(&format!(
                    "    {{\"id\": \"{}\", \"name\": {}, \"order\": {}, \"set_up_cost\": {}, \"tear_down_cost\": {}, \"uses\": {}, \"dirty\": {}, \"has_instance\": {}}}",
                    node.id, json_string(&node.name), node.order, node.set_up_cost, node.tear_down_cost,
                    node.uses, node.dirty, node.has_instance
                ));
            }
            json.push_str("\n  ],\n  \"edges\": [\n");
            for (i, edge) in self.edges.iter().enumerate() {
                if i > 0 {
                    json.push_str(",\n");
                }
                json.push_str(&format!(
                    "    {{\"from\": \"{}\", \"to\": \"{}\", \"label\": {}}}",
                    edge.from, edge.to, json_string(&edge.label)
                ));
            }
            json.push_str("\n  ]\n}");
            Ok(json)
        }
    }

    /// Exports the graph in DOT format for Graphviz.
    pub fn to_dot(&self) -> String {
        let mut output = String::from("digraph Resources {\n  rankdir=BT;\n  node [shape=box];\n\n");
        for node in &self.nodes {
            let color = if node.dirty {
                "salmon"
            } else if node.has_instance {
                "lightgreen"
            } else {
                "white"
            };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\nuses={}\", fillcolor={}, style=filled];\n",
                node.id, dot_escape(&node.name), node.uses, color
            ));
        }
        output.push('\n');
        for edge in &self.edges {
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                edge.from, edge.to, dot_escape(&edge.label)
            ));
        }
        output.push_str("}\n");
        output
    }

    /// Exports the graph as a Mermaid flowchart.
    pub fn to_mermaid(&self) -> String {
        let mut output = String::from("graph BT\n");
        for node in &self.nodes {
            output.push_str(&format!("  {}[\"{}\"]\n", mermaid_id(&node.id), mermaid_escape(&node.name)));
        }
        for edge in &self.edges {
            output.push_str(&format!(
                "  {} -->|{}| {}\n",
                mermaid_id(&edge.from),
                mermaid_escape(&edge.label),
                mermaid_id(&edge.to)
            ));
        }
        output
    }
}

fn mermaid_id(id: &str) -> String {
    id.replace('-', "_")
}

/// Quotes `s` as a JSON string literal.
#[cfg(not(feature = "graph-export"))]
fn json_string(s: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Escapes text placed inside a DOT double-quoted string.
fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Escapes text for Mermaid node and edge labels using entity codes.
fn mermaid_escape(s: &str) -> String {
    s.replace('"', "#quot;").replace('|', "#124;")
}

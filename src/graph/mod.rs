//! In-memory graph representation
//!
//! The graph the parser lowers into: nodes with stable IDs and parent
//! links, first-class edges, and document metadata. CRUD operations
//! enforce the structural invariants (unique IDs, existing endpoints,
//! acyclic parent chains, self-loop and duplicate-edge policy) and stamp
//! `modified` on every mutation. [`Graph::validate`] re-checks the same
//! invariants wholesale; it is distinct from the semantic validation the
//! parser performs before lowering.

pub mod hierarchy;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ast::{PropertyMap, Value};

pub use hierarchy::HierarchyIndex;

/// A node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "PropertyMap::is_empty", default)]
    pub metadata: PropertyMap,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type: None,
            level: None,
            parent_id: None,
            metadata: PropertyMap::new(),
        }
    }
}

/// A directed edge between two node IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "PropertyMap::is_empty", default)]
    pub metadata: PropertyMap,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type: None,
            label: None,
            metadata: PropertyMap::new(),
        }
    }
}

/// Document-level metadata. The named fields are the reserved keys;
/// everything else lives in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Unreserved directives, keyed by name.
    #[serde(skip_serializing_if = "PropertyMap::is_empty", default)]
    pub directives: PropertyMap,
    /// Parser provenance (`name`, `version`).
    #[serde(skip_serializing_if = "PropertyMap::is_empty", default)]
    pub parser: PropertyMap,
    /// Free-form additional keys.
    #[serde(skip_serializing_if = "PropertyMap::is_empty", default)]
    pub extra: PropertyMap,
}

/// Construction options for [`Graph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphOptions {
    /// Reject rather than repair questionable input in `from_json`.
    pub strict: bool,
    /// Assign `node_N` IDs to nodes added without one.
    pub auto_generate_ids: bool,
    pub allow_self_loops: bool,
    /// Upper bounds on graph size; `None` means unbounded.
    pub max_nodes: Option<usize>,
    pub max_edges: Option<usize>,
    pub default_metadata: Option<GraphMetadata>,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            strict: false,
            auto_generate_ids: false,
            allow_self_loops: false,
            max_nodes: None,
            max_edges: None,
            default_metadata: None,
        }
    }
}

/// Errors raised by graph mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    EmptyNodeId,
    EmptyNodeLabel(String),
    DuplicateNodeId(String),
    UnknownNode(String),
    UnknownParent { id: String, parent: String },
    CircularParent(String),
    UnknownEdgeEndpoint { from: String, to: String, missing: String },
    SelfLoop(String),
    DuplicateEdge { from: String, to: String },
    MaxNodesExceeded(usize),
    MaxEdgesExceeded(usize),
    InvalidJson(String),
}

impl GraphError {
    /// The stable diagnostic code this error surfaces under.
    pub fn code(&self) -> &'static str {
        use crate::diagnostics::codes;
        match self {
            GraphError::EmptyNodeId
            | GraphError::EmptyNodeLabel(_)
            | GraphError::DuplicateNodeId(_) => codes::DUPLICATE_NODE_ID,
            GraphError::UnknownNode(_)
            | GraphError::UnknownParent { .. }
            | GraphError::UnknownEdgeEndpoint { .. } => codes::INVALID_NODE_REFERENCE,
            GraphError::CircularParent(_) => codes::CIRCULAR_PARENT_REFERENCE,
            GraphError::SelfLoop(_) => codes::SELF_LOOP_EDGE,
            GraphError::DuplicateEdge { .. } => codes::DUPLICATE_EDGE,
            GraphError::MaxNodesExceeded(_) => codes::MAX_NODES_EXCEEDED,
            GraphError::MaxEdgesExceeded(_) => codes::MAX_EDGES_EXCEEDED,
            GraphError::InvalidJson(_) => codes::SYNTAX_ERROR,
        }
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::EmptyNodeId => write!(f, "node id must not be empty"),
            GraphError::EmptyNodeLabel(id) => write!(f, "node '{}' has an empty label", id),
            GraphError::DuplicateNodeId(id) => write!(f, "node id '{}' already exists", id),
            GraphError::UnknownNode(id) => write!(f, "no node with id '{}'", id),
            GraphError::UnknownParent { id, parent } => {
                write!(f, "node '{}' references missing parent '{}'", id, parent)
            }
            GraphError::CircularParent(id) => {
                write!(f, "setting this parent would make '{}' its own ancestor", id)
            }
            GraphError::UnknownEdgeEndpoint { from, to, missing } => {
                write!(f, "edge {} -> {} references missing node '{}'", from, to, missing)
            }
            GraphError::SelfLoop(id) => write!(f, "self-loop on '{}' is not allowed", id),
            GraphError::DuplicateEdge { from, to } => {
                write!(f, "edge {} -> {} already exists", from, to)
            }
            GraphError::MaxNodesExceeded(max) => {
                write!(f, "graph exceeds the maximum of {} nodes", max)
            }
            GraphError::MaxEdgesExceeded(max) => {
                write!(f, "graph exceeds the maximum of {} edges", max)
            }
            GraphError::InvalidJson(msg) => write!(f, "graph JSON is malformed: {}", msg),
        }
    }
}

impl std::error::Error for GraphError {}

/// Serializable shape of a graph, used by `to_json` / `from_json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphData {
    nodes: Vec<GraphNode>,
    edges: Vec<Edge>,
    metadata: GraphMetadata,
}

/// Patch for [`Graph::update_node`]. `None` fields are left untouched;
/// metadata entries are merged in.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub label: Option<String>,
    pub node_type: Option<Option<String>>,
    pub level: Option<Option<u32>>,
    pub metadata: Option<PropertyMap>,
}

/// The graph itself. Node order is insertion order, which downstream
/// serialization relies on.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    pub metadata: GraphMetadata,
    options: GraphOptions,
    auto_id_counter: usize,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}

impl Graph {
    pub fn new(options: GraphOptions) -> Self {
        let mut metadata = options.default_metadata.clone().unwrap_or_default();
        let now = chrono::Utc::now().to_rfc3339();
        metadata.created = Some(now.clone());
        metadata.modified = Some(now);
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            metadata,
            options,
            auto_id_counter: 0,
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // Node CRUD

    /// Add a node, enforcing ID uniqueness and parent validity. A node
    /// without an ID gets a generated one when `auto_generate_ids` is on.
    pub fn add_node(&mut self, mut node: GraphNode) -> Result<&GraphNode, GraphError> {
        if node.id.is_empty() {
            if self.options.auto_generate_ids {
                node.id = self.next_auto_id();
            } else {
                return Err(GraphError::EmptyNodeId);
            }
        }
        if node.label.is_empty() {
            return Err(GraphError::EmptyNodeLabel(node.id));
        }
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNodeId(node.id));
        }
        if let Some(max) = self.options.max_nodes {
            if self.nodes.len() >= max {
                return Err(GraphError::MaxNodesExceeded(max));
            }
        }
        if let Some(parent) = &node.parent_id {
            if !self.index.contains_key(parent) {
                return Err(GraphError::UnknownParent {
                    id: node.id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        self.touch();
        Ok(self.nodes.last().unwrap())
    }

    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<&GraphNode, GraphError> {
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        {
            let node = &mut self.nodes[idx];
            if let Some(label) = patch.label {
                if label.is_empty() {
                    return Err(GraphError::EmptyNodeLabel(id.to_string()));
                }
                node.label = label;
            }
            if let Some(node_type) = patch.node_type {
                node.node_type = node_type;
            }
            if let Some(level) = patch.level {
                node.level = level;
            }
            if let Some(metadata) = patch.metadata {
                node.metadata.extend_from(&metadata);
            }
        }
        self.touch();
        Ok(&self.nodes[idx])
    }

    /// Remove a node, its connected edges, and detach its children.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let idx = match self.index.get(id) {
            Some(idx) => *idx,
            None => return false,
        };
        self.nodes.remove(idx);
        self.edges.retain(|e| e.from != id && e.to != id);
        for node in &mut self.nodes {
            if node.parent_id.as_deref() == Some(id) {
                node.parent_id = None;
            }
        }
        self.rebuild_index();
        self.touch();
        true
    }

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|idx| &self.nodes[*idx])
    }

    pub fn get_all_nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    // Edge CRUD

    pub fn add_edge(&mut self, edge: Edge) -> Result<&Edge, GraphError> {
        for endpoint in [&edge.from, &edge.to] {
            if !self.index.contains_key(endpoint) {
                return Err(GraphError::UnknownEdgeEndpoint {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        if edge.from == edge.to && !self.options.allow_self_loops {
            return Err(GraphError::SelfLoop(edge.from));
        }
        if self.edges.iter().any(|e| e.from == edge.from && e.to == edge.to) {
            return Err(GraphError::DuplicateEdge {
                from: edge.from,
                to: edge.to,
            });
        }
        if let Some(max) = self.options.max_edges {
            if self.edges.len() >= max {
                return Err(GraphError::MaxEdgesExceeded(max));
            }
        }
        self.edges.push(edge);
        self.touch();
        Ok(self.edges.last().unwrap())
    }

    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| !(e.from == from && e.to == to));
        let removed = self.edges.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    pub fn get_edge(&self, from: &str, to: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.from == from && e.to == to)
    }

    pub fn get_all_edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn get_connected_edges(&self, id: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.from == id || e.to == id)
            .collect()
    }

    // Hierarchy

    pub fn get_child_nodes(&self, id: &str) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == Some(id))
            .collect()
    }

    pub fn get_parent_node(&self, id: &str) -> Option<&GraphNode> {
        let parent_id = self.get_node(id)?.parent_id.as_deref()?;
        self.get_node(parent_id)
    }

    pub fn get_root_nodes(&self) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.parent_id.is_none()).collect()
    }

    /// Re-parent a node, rejecting chains that would loop back to it.
    pub fn set_node_parent(
        &mut self,
        id: &str,
        parent: Option<&str>,
    ) -> Result<(), GraphError> {
        if !self.index.contains_key(id) {
            return Err(GraphError::UnknownNode(id.to_string()));
        }
        if let Some(parent_id) = parent {
            if !self.index.contains_key(parent_id) {
                return Err(GraphError::UnknownParent {
                    id: id.to_string(),
                    parent: parent_id.to_string(),
                });
            }
            // Walk up from the new parent; hitting `id` means a cycle.
            let mut cursor = Some(parent_id.to_string());
            while let Some(current) = cursor {
                if current == id {
                    return Err(GraphError::CircularParent(id.to_string()));
                }
                cursor = self
                    .get_node(&current)
                    .and_then(|n| n.parent_id.clone());
            }
        }
        let idx = self.index[id];
        self.nodes[idx].parent_id = parent.map(|p| p.to_string());
        self.touch();
        Ok(())
    }

    /// IDs from the root of the hierarchy down to `id`, inclusive.
    pub fn get_node_path(&self, id: &str) -> Vec<String> {
        let mut path = Vec::new();
        let mut cursor = self.get_node(id);
        while let Some(node) = cursor {
            path.push(node.id.clone());
            cursor = node
                .parent_id
                .as_deref()
                .and_then(|parent| self.get_node(parent));
        }
        path.reverse();
        path
    }

    /// A traversal index over the parent links.
    pub fn hierarchy(&self) -> HierarchyIndex<'_> {
        HierarchyIndex::build(self)
    }

    // Layers

    pub fn get_nodes_at_level(&self, level: u32) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| n.level == Some(level))
            .collect()
    }

    pub fn get_all_levels(&self) -> Vec<u32> {
        let mut levels: Vec<u32> = self
            .nodes
            .iter()
            .filter_map(|n| n.level)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        levels.sort_unstable();
        levels
    }

    pub fn move_node_to_level(&mut self, id: &str, level: u32) -> Result<(), GraphError> {
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        self.nodes[idx].level = Some(level);
        self.touch();
        Ok(())
    }

    // Search

    pub fn find_nodes(&self, predicate: impl Fn(&GraphNode) -> bool) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| predicate(n)).collect()
    }

    pub fn find_nodes_by_type(&self, node_type: &str) -> Vec<&GraphNode> {
        self.find_nodes(|n| n.node_type.as_deref() == Some(node_type))
    }

    /// Nodes connected to `id` by any edge, in edge order, deduplicated.
    pub fn get_neighbors(&self, id: &str) -> Vec<&GraphNode> {
        let mut seen = HashSet::new();
        let mut neighbors = Vec::new();
        for edge in &self.edges {
            let other = if edge.from == id {
                &edge.to
            } else if edge.to == id {
                &edge.from
            } else {
                continue;
            };
            if seen.insert(other.clone()) {
                if let Some(node) = self.get_node(other) {
                    neighbors.push(node);
                }
            }
        }
        neighbors
    }

    // Serialization

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(GraphData {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            metadata: self.metadata.clone(),
        })
        .unwrap_or(serde_json::Value::Null)
    }

    /// Rebuild a graph from `to_json` output, re-validating every node and
    /// edge through the normal CRUD path.
    pub fn from_json(
        json: &serde_json::Value,
        options: GraphOptions,
    ) -> Result<Graph, GraphError> {
        let data: GraphData = serde_json::from_value(json.clone())
            .map_err(|err| GraphError::InvalidJson(err.to_string()))?;
        let mut graph = Graph::new(options);
        let created = data.metadata.created.clone();
        graph.metadata = data.metadata;
        for node in data.nodes {
            graph.add_node(node)?;
        }
        for edge in data.edges {
            graph.add_edge(edge)?;
        }
        if created.is_some() {
            graph.metadata.created = created;
        }
        Ok(graph)
    }

    /// Structural re-validation of the whole graph. Distinct from the
    /// parser's semantic validation: this checks the graph invariants
    /// only, regardless of how the graph was built.
    pub fn validate(&self) -> Vec<GraphError> {
        let mut errors = Vec::new();

        let mut ids = HashSet::new();
        for node in &self.nodes {
            if node.id.is_empty() {
                errors.push(GraphError::EmptyNodeId);
            } else if !ids.insert(node.id.as_str()) {
                errors.push(GraphError::DuplicateNodeId(node.id.clone()));
            }
            if node.label.is_empty() {
                errors.push(GraphError::EmptyNodeLabel(node.id.clone()));
            }
            if let Some(parent) = &node.parent_id {
                if !self.index.contains_key(parent) {
                    errors.push(GraphError::UnknownParent {
                        id: node.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        // Parent chains must terminate.
        for node in &self.nodes {
            let mut slow = node.parent_id.as_deref();
            let mut steps = 0;
            while let Some(current) = slow {
                if current == node.id {
                    errors.push(GraphError::CircularParent(node.id.clone()));
                    break;
                }
                steps += 1;
                if steps > self.nodes.len() {
                    errors.push(GraphError::CircularParent(node.id.clone()));
                    break;
                }
                slow = self
                    .get_node(current)
                    .and_then(|n| n.parent_id.as_deref());
            }
        }

        let mut pairs = HashSet::new();
        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !self.index.contains_key(endpoint) {
                    errors.push(GraphError::UnknownEdgeEndpoint {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
            if edge.from == edge.to && !self.options.allow_self_loops {
                errors.push(GraphError::SelfLoop(edge.from.clone()));
            }
            if !pairs.insert((edge.from.clone(), edge.to.clone())) {
                errors.push(GraphError::DuplicateEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            }
        }

        errors
    }

    /// Metadata values that came from directives, as a flat map. Used by
    /// round-trip comparisons and the CLI summary.
    pub fn directive_view(&self) -> PropertyMap {
        let mut map = PropertyMap::new();
        if let Some(title) = &self.metadata.title {
            map.insert("title", Value::String(title.clone()));
        }
        if let Some(description) = &self.metadata.description {
            map.insert("description", Value::String(description.clone()));
        }
        if let Some(version) = &self.metadata.version {
            map.insert("version", Value::String(version.clone()));
        }
        if let Some(author) = &self.metadata.author {
            map.insert("author", Value::String(author.clone()));
        }
        if let Some(domain) = &self.metadata.domain {
            map.insert("domain", Value::String(domain.clone()));
        }
        if !self.metadata.tags.is_empty() {
            map.insert(
                "tags",
                Value::Array(
                    self.metadata
                        .tags
                        .iter()
                        .map(|t| Value::String(t.clone()))
                        .collect(),
                ),
            );
        }
        if let Some(strict) = self.metadata.strict {
            map.insert("strict", Value::Bool(strict));
        }
        map.extend_from(&self.metadata.directives);
        map
    }

    fn next_auto_id(&mut self) -> String {
        loop {
            self.auto_id_counter += 1;
            let candidate = format!("node_{}", self.auto_id_counter);
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.clone(), idx))
            .collect();
    }

    fn touch(&mut self) {
        self.metadata.modified = Some(chrono::Utc::now().to_rfc3339());
    }
}

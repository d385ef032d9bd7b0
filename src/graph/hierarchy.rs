//! Hierarchy traversal index
//!
//! Graph nodes reference their parents by ID, which makes downward
//! traversal linear per step. [`HierarchyIndex`] materializes the parent
//! links into an `ego_tree::Tree` once, giving cheap child, descendant and
//! pre-order access for the serializer and hierarchy queries.

use std::collections::HashMap;

use ego_tree::{NodeId, Tree};

use super::{Graph, GraphNode};

/// A forest view over a graph's parent links. The tree root is synthetic;
/// graph roots are its children, in node insertion order.
pub struct HierarchyIndex<'g> {
    tree: Tree<Option<&'g GraphNode>>,
    ids: HashMap<&'g str, NodeId>,
}

impl<'g> HierarchyIndex<'g> {
    pub fn build(graph: &'g Graph) -> Self {
        let mut children_of: HashMap<&str, Vec<&'g GraphNode>> = HashMap::new();
        let mut roots: Vec<&'g GraphNode> = Vec::new();

        for node in graph.get_all_nodes() {
            match node.parent_id.as_deref() {
                // A dangling parent reference degrades to a root so the
                // index stays total even on unvalidated graphs.
                Some(parent) if graph.get_node(parent).is_some() => {
                    children_of.entry(parent).or_default().push(node);
                }
                _ => roots.push(node),
            }
        }

        let mut tree: Tree<Option<&'g GraphNode>> = Tree::new(None);
        let mut ids = HashMap::new();
        let root_id = tree.root().id();

        let mut stack: Vec<(NodeId, &'g GraphNode)> =
            roots.iter().rev().map(|n| (root_id, *n)).collect();
        while let Some((parent_tree_id, node)) = stack.pop() {
            let tree_id = tree
                .get_mut(parent_tree_id)
                .expect("parent placed before child")
                .append(Some(node))
                .id();
            ids.insert(node.id.as_str(), tree_id);
            for child in children_of.get(node.id.as_str()).into_iter().flatten().rev() {
                stack.push((tree_id, *child));
            }
        }

        Self { tree, ids }
    }

    /// All nodes in pre-order: each root followed by its subtree.
    pub fn pre_order(&self) -> Vec<&'g GraphNode> {
        self.tree
            .root()
            .descendants()
            .filter_map(|n| *n.value())
            .collect()
    }

    /// Direct children of `id`, in insertion order.
    pub fn children(&self, id: &str) -> Vec<&'g GraphNode> {
        match self.ids.get(id).and_then(|tid| self.tree.get(*tid)) {
            Some(node) => node.children().filter_map(|n| *n.value()).collect(),
            None => Vec::new(),
        }
    }

    /// Every node below `id`, pre-order, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> Vec<&'g GraphNode> {
        match self.ids.get(id).and_then(|tid| self.tree.get(*tid)) {
            Some(node) => node
                .descendants()
                .skip(1)
                .filter_map(|n| *n.value())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Depth below the synthetic root: graph roots are at 0.
    pub fn depth(&self, id: &str) -> Option<usize> {
        let tid = self.ids.get(id)?;
        let node = self.tree.get(*tid)?;
        Some(node.ancestors().count() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphNode, GraphOptions};

    fn sample() -> Graph {
        let mut graph = Graph::new(GraphOptions::default());
        graph.add_node(GraphNode::new("sys", "System")).unwrap();
        graph.add_node(GraphNode::new("web", "Web")).unwrap();
        graph.add_node(GraphNode::new("api", "Api")).unwrap();
        graph.add_node(GraphNode::new("db", "Db")).unwrap();
        graph.set_node_parent("web", Some("sys")).unwrap();
        graph.set_node_parent("api", Some("sys")).unwrap();
        graph.set_node_parent("db", Some("api")).unwrap();
        graph
    }

    #[test]
    fn pre_order_visits_roots_then_subtrees() {
        let graph = sample();
        let index = graph.hierarchy();
        let ids: Vec<&str> = index.pre_order().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["sys", "web", "api", "db"]);
    }

    #[test]
    fn children_and_descendants() {
        let graph = sample();
        let index = graph.hierarchy();
        let children: Vec<&str> = index.children("sys").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(children, vec!["web", "api"]);
        let descendants: Vec<&str> = index
            .descendants("sys")
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(descendants, vec!["web", "api", "db"]);
    }

    #[test]
    fn depth_counts_from_graph_roots() {
        let graph = sample();
        let index = graph.hierarchy();
        assert_eq!(index.depth("sys"), Some(0));
        assert_eq!(index.depth("db"), Some(2));
        assert_eq!(index.depth("missing"), None);
    }
}

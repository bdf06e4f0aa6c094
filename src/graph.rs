//! Link graph and anomaly analysis.
//!
//! A directed adjacency map built from one crawl snapshot. Two traversals run
//! over it: in-degree counting for orphan pages, and connected components of
//! the undirected projection for isolated clusters.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::urls::normalize_node_url;

/// Result of analyzing a link graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphAnalysisResult {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Non-homepage nodes with no inbound links, sorted
    pub orphan_pages: Vec<String>,
    /// Components (size ≥ 2) without a path to the homepage, each sorted
    pub isolated_clusters: Vec<Vec<String>>,
}

/// Directed link graph. Node identities are node-normalized URLs.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    nodes: BTreeSet<String>,
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl LinkGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node; returns its normalized identity.
    pub fn add_node(&mut self, url: &str) -> String {
        let id = normalize_node_url(url);
        self.nodes.insert(id.clone());
        id
    }

    /// Adds the edge `from → to`, adding both nodes. Self-links are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        if from != to {
            self.edges.entry(from).or_default().insert(to);
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Whether a node exists.
    pub fn contains(&self, url: &str) -> bool {
        self.nodes.contains(&normalize_node_url(url))
    }

    /// Nodes, sorted.
    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.nodes.iter()
    }

    fn in_degrees(&self) -> BTreeMap<&str, usize> {
        let mut degrees: BTreeMap<&str, usize> =
            self.nodes.iter().map(|n| (n.as_str(), 0)).collect();
        for targets in self.edges.values() {
            for target in targets {
                *degrees.entry(target.as_str()).or_insert(0) += 1;
            }
        }
        degrees
    }

    /// Nodes other than the homepage with in-degree 0.
    pub fn orphan_pages(&self, homepage: &str) -> Vec<String> {
        let home = normalize_node_url(homepage);
        self.in_degrees()
            .into_iter()
            .filter(|(node, degree)| *degree == 0 && *node != home)
            .map(|(node, _)| node.to_string())
            .collect()
    }

    fn undirected(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut adjacency: BTreeMap<&str, BTreeSet<&str>> =
            self.nodes.iter().map(|n| (n.as_str(), BTreeSet::new())).collect();
        for (from, targets) in &self.edges {
            for to in targets {
                adjacency.entry(from.as_str()).or_default().insert(to.as_str());
                adjacency.entry(to.as_str()).or_default().insert(from.as_str());
            }
        }
        adjacency
    }

    /// Connected components of the undirected projection, each sorted, in
    /// order of their smallest node.
    pub fn components(&self) -> Vec<Vec<String>> {
        let adjacency = self.undirected();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut components = Vec::new();

        for &start in adjacency.keys() {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start.to_string()];
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                for &next in adjacency.get(node).into_iter().flatten() {
                    if seen.insert(next) {
                        component.push(next.to_string());
                        queue.push_back(next);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }

    /// Components with at least two nodes that do not contain the homepage.
    pub fn isolated_clusters(&self, homepage: &str) -> Vec<Vec<String>> {
        let home = normalize_node_url(homepage);
        self.components()
            .into_iter()
            .filter(|c| c.len() >= 2 && !c.contains(&home))
            .collect()
    }

    /// Full analysis. The homepage is always treated as present and reachable.
    pub fn analyze(&self, homepage: &str) -> GraphAnalysisResult {
        let mut graph = self.clone();
        graph.add_node(homepage);
        GraphAnalysisResult {
            total_nodes: graph.node_count(),
            total_edges: graph.edge_count(),
            orphan_pages: graph.orphan_pages(homepage),
            isolated_clusters: graph.isolated_clusters(homepage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: &str = "https://example.go.id/";
    const A: &str = "https://example.go.id/a";
    const B: &str = "https://example.go.id/b";
    const C: &str = "https://example.go.id/c";
    const D: &str = "https://example.go.id/d";
    const E: &str = "https://example.go.id/e";

    fn base_graph() -> LinkGraph {
        let mut g = LinkGraph::new();
        g.add_edge(H, A);
        g.add_edge(A, B);
        g.add_node(C);
        g
    }

    #[test]
    fn test_orphan_detection_excludes_homepage() {
        let g = base_graph();
        assert_eq!(g.orphan_pages(H), vec![C.to_string()]);
    }

    #[test]
    fn test_isolated_cluster_detection() {
        let mut g = base_graph();
        g.add_edge(D, E);
        g.add_edge(E, D);
        assert_eq!(g.isolated_clusters(H), vec![vec![D.to_string(), E.to_string()]]);
        // D and E link to each other, so neither is an orphan
        assert_eq!(g.orphan_pages(H), vec![C.to_string()]);
    }

    #[test]
    fn test_analyze_counts() {
        let mut g = base_graph();
        g.add_edge(D, E);
        g.add_edge(E, D);
        let result = g.analyze(H);
        assert_eq!(result.total_nodes, 6);
        assert_eq!(result.total_edges, 4);
        assert_eq!(result.orphan_pages, vec![C.to_string()]);
        assert_eq!(result.isolated_clusters.len(), 1);
    }

    #[test]
    fn test_normalization_is_applied_to_nodes_and_edges() {
        let mut g = LinkGraph::new();
        g.add_edge("https://example.go.id", "https://example.go.id/a/#top");
        g.add_node("https://example.go.id/a");
        assert_eq!(g.node_count(), 2);
        assert!(g.orphan_pages("https://example.go.id/").is_empty());
    }

    #[test]
    fn test_self_links_do_not_count() {
        let mut g = LinkGraph::new();
        g.add_node(H);
        g.add_edge(C, C);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.orphan_pages(H), vec![C.to_string()]);
    }

    #[test]
    fn test_empty_graph_has_homepage_only() {
        let result = LinkGraph::new().analyze(H);
        assert_eq!(result.total_nodes, 1);
        assert!(result.orphan_pages.is_empty());
        assert!(result.isolated_clusters.is_empty());
    }

    #[test]
    fn test_cluster_reached_from_homepage_is_not_isolated() {
        let mut g = LinkGraph::new();
        g.add_edge(H, D);
        g.add_edge(D, E);
        g.add_edge(E, D);
        assert!(g.isolated_clusters(H).is_empty());
    }
}

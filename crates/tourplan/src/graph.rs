//! Directed multigraph storage for transition models.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

/// Anything usable as a node identifier.
///
/// Blanket-implemented for every `Clone + Eq + Hash + Display` type, so
/// `&str`, `String` and integer ids all work out of the box.
pub trait Node: Clone + Eq + Hash + fmt::Display {}

impl<T: Clone + Eq + Hash + fmt::Display> Node for T {}

/// Identifier of a single edge, unique for the lifetime of a [`MultiDigraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeKey(pub u64);

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed arc `from -> to`, distinguished from its parallel siblings by `key`.
///
/// Graph accessors hand out `Edge<&N>` views; call [`Edge::cloned`] to own one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge<N> {
    pub from: N,
    pub to: N,
    pub key: EdgeKey,
}

impl<N: PartialEq> Edge<N> {
    /// True when this edge goes from `from` to `to`, whatever its key.
    pub fn relates(&self, from: &N, to: &N) -> bool {
        self.from == *from && self.to == *to
    }
}

impl<N: Clone> Edge<&N> {
    pub fn cloned(&self) -> Edge<N> {
        Edge {
            from: self.from.clone(),
            to: self.to.clone(),
            key: self.key,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Arc {
    source: usize,
    target: usize,
}

/// A directed multigraph with stable, never-reused edge keys.
///
/// Nodes and each node's out/in edge lists keep insertion order, which is
/// what makes shortest-path tie-breaking and tour output deterministic.
///
/// # Examples
///
/// ```
/// use tourplan::v1::MultiDigraph;
///
/// let mut g = MultiDigraph::new();
/// let first = g.add_edge("b", "c");
/// let second = g.add_edge("b", "c");
/// assert_ne!(first, second);
/// assert_eq!(g.out_degree(&"b"), 2);
/// assert_eq!(g.in_degree(&"c"), 2);
///
/// // Removing by endpoints drops the most recently inserted parallel edge.
/// assert_eq!(g.remove_edge(&"b", &"c"), Some(second));
/// assert_eq!(g.edge_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MultiDigraph<N> {
    nodes: Vec<N>,
    index: HashMap<N, usize>,
    arcs: BTreeMap<EdgeKey, Arc>,
    outgoing: Vec<Vec<EdgeKey>>,
    incoming: Vec<Vec<EdgeKey>>,
    next_key: u64,
}

impl<N> Default for MultiDigraph<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            arcs: BTreeMap::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            next_key: 0,
        }
    }
}

impl<N: Node> MultiDigraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(from, to)` pairs; keys are assigned 0, 1, … in input order.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (N, N)>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    /// Add `node` if absent. Returns `true` when it was newly inserted.
    pub fn add_node(&mut self, node: N) -> bool {
        let before = self.nodes.len();
        self.ensure_node(node);
        self.nodes.len() != before
    }

    /// Insert an edge with a freshly assigned key.
    pub fn add_edge(&mut self, from: N, to: N) -> EdgeKey {
        let source = self.ensure_node(from);
        let target = self.ensure_node(to);
        self.add_edge_ix(source, target)
    }

    /// Insert an edge under a caller-chosen key.
    ///
    /// Fails if the key is already in use. Later auto-assigned keys continue
    /// above the largest key ever seen, so keys are never handed out twice.
    pub fn add_edge_with_key(&mut self, from: N, to: N, key: EdgeKey) -> Result<EdgeKey> {
        if self.arcs.contains_key(&key) {
            return Err(Error::invalid_graph(format!("edge key {key} is already in use")));
        }
        let source = self.ensure_node(from);
        let target = self.ensure_node(to);
        self.insert_arc(source, target, key);
        self.next_key = self.next_key.max(key.0 + 1);
        Ok(key)
    }

    /// Remove one `from -> to` edge, preferring the most recently inserted
    /// parallel copy. Returns the removed key.
    pub fn remove_edge(&mut self, from: &N, to: &N) -> Option<EdgeKey> {
        let source = self.node_ix(from)?;
        let target = self.node_ix(to)?;
        let key = self.outgoing[source]
            .iter()
            .rev()
            .copied()
            .find(|key| self.arcs[key].target == target)?;
        self.remove_edge_by_key(key);
        Some(key)
    }

    /// Remove exactly the edge stored under `key`.
    pub fn remove_edge_by_key(&mut self, key: EdgeKey) -> Option<Edge<N>> {
        let arc = self.arcs.remove(&key)?;
        self.outgoing[arc.source].retain(|k| *k != key);
        self.incoming[arc.target].retain(|k| *k != key);
        Some(Edge {
            from: self.nodes[arc.source].clone(),
            to: self.nodes[arc.target].clone(),
            key,
        })
    }

    pub fn contains_node(&self, node: &N) -> bool {
        self.index.contains_key(node)
    }

    pub fn contains_edge(&self, key: EdgeKey) -> bool {
        self.arcs.contains_key(&key)
    }

    pub fn edge(&self, key: EdgeKey) -> Option<Edge<&N>> {
        self.arcs.get(&key).map(|arc| self.view(key, *arc))
    }

    /// Out-edges of `node` in insertion order. Empty for unknown nodes.
    pub fn out_edges<'a>(
        &'a self,
        node: &N,
    ) -> impl Iterator<Item = Edge<&'a N>> + use<'a, N> {
        let keys: &'a [EdgeKey] = match self.node_ix(node) {
            Some(ix) => &self.outgoing[ix],
            None => &[],
        };
        keys.iter().map(move |key| self.view(*key, self.arcs[key]))
    }

    /// In-edges of `node` in insertion order. Empty for unknown nodes.
    pub fn in_edges<'a>(
        &'a self,
        node: &N,
    ) -> impl Iterator<Item = Edge<&'a N>> + use<'a, N> {
        let keys: &'a [EdgeKey] = match self.node_ix(node) {
            Some(ix) => &self.incoming[ix],
            None => &[],
        };
        keys.iter().map(move |key| self.view(*key, self.arcs[key]))
    }

    pub fn out_degree(&self, node: &N) -> usize {
        self.node_ix(node).map_or(0, |ix| self.outgoing[ix].len())
    }

    pub fn in_degree(&self, node: &N) -> usize {
        self.node_ix(node).map_or(0, |ix| self.incoming[ix].len())
    }

    /// All edges, ordered by key.
    pub fn edges(&self) -> impl Iterator<Item = Edge<&N>> {
        self.arcs.iter().map(|(key, arc)| self.view(*key, *arc))
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.arcs.len()
    }

    /// A graph is empty when it has no edges, regardless of isolated nodes.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    pub(crate) fn node_ix(&self, node: &N) -> Option<usize> {
        self.index.get(node).copied()
    }

    pub(crate) fn node_at(&self, ix: usize) -> &N {
        &self.nodes[ix]
    }

    pub(crate) fn outgoing_ix(&self, ix: usize) -> &[EdgeKey] {
        &self.outgoing[ix]
    }

    pub(crate) fn out_degree_ix(&self, ix: usize) -> usize {
        self.outgoing[ix].len()
    }

    pub(crate) fn in_degree_ix(&self, ix: usize) -> usize {
        self.incoming[ix].len()
    }

    pub(crate) fn successors_ix(&self, ix: usize) -> impl Iterator<Item = usize> + '_ {
        self.outgoing[ix].iter().map(|key| self.arcs[key].target)
    }

    pub(crate) fn target_ix(&self, key: EdgeKey) -> usize {
        self.arcs[&key].target
    }

    /// `(source, target)` node indices of the edge under `key`.
    pub(crate) fn endpoints_ix(&self, key: EdgeKey) -> Option<(usize, usize)> {
        self.arcs.get(&key).map(|arc| (arc.source, arc.target))
    }

    pub(crate) fn add_edge_ix(&mut self, source: usize, target: usize) -> EdgeKey {
        let key = EdgeKey(self.next_key);
        self.next_key += 1;
        self.insert_arc(source, target, key);
        key
    }

    fn ensure_node(&mut self, node: N) -> usize {
        if let Some(ix) = self.index.get(&node) {
            return *ix;
        }
        let ix = self.nodes.len();
        self.index.insert(node.clone(), ix);
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        ix
    }

    fn insert_arc(&mut self, source: usize, target: usize, key: EdgeKey) {
        self.arcs.insert(key, Arc { source, target });
        self.outgoing[source].push(key);
        self.incoming[target].push(key);
    }

    fn view(&self, key: EdgeKey, arc: Arc) -> Edge<&N> {
        Edge {
            from: &self.nodes[arc.source],
            to: &self.nodes[arc.target],
            key,
        }
    }
}

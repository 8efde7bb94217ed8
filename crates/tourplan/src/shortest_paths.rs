//! All-pairs hop-count distances with path reconstruction (Floyd–Warshall).

use crate::error::{Error, Result};
use crate::graph::{MultiDigraph, Node};

/// Frozen all-pairs shortest-path oracle over a borrowed [`MultiDigraph`].
///
/// Every edge costs one hop; parallel edges do not shorten anything. The
/// table borrows the graph, so the graph cannot change while the table is
/// alive. Rebuild it after mutating the graph.
///
/// Nodes are visited in graph insertion order and a distance is only
/// replaced by a strictly shorter one, so among equally short paths the
/// first one discovered wins and [`ShortestPathTable::path`] is
/// deterministic.
///
/// # Examples
///
/// ```
/// use tourplan::v1::{MultiDigraph, ShortestPathTable};
///
/// let g = MultiDigraph::from_edges([("a", "b"), ("b", "c"), ("c", "a")]);
/// let table = ShortestPathTable::new(&g).unwrap();
///
/// assert_eq!(table.length(&"a", &"c").unwrap(), Some(2));
/// assert_eq!(table.path(&"c", &"b").unwrap(), Some(vec!["c", "a", "b"]));
/// assert!(table.length(&"a", &"nope").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ShortestPathTable<'g, N> {
    graph: &'g MultiDigraph<N>,
    size: usize,
    distances: Vec<Option<u32>>,
    predecessors: Vec<Option<usize>>,
}

impl<'g, N: Node> ShortestPathTable<'g, N> {
    /// Compute the table. Fails with [`Error::InvalidGraph`] when the graph has no edges.
    pub fn new(graph: &'g MultiDigraph<N>) -> Result<Self> {
        if graph.is_empty() {
            return Err(Error::invalid_graph("multigraph is empty"));
        }

        let size = graph.node_count();
        let mut table = Self {
            graph,
            size,
            distances: vec![None; size * size],
            predecessors: vec![None; size * size],
        };
        table.seed();
        table.relax();

        log::debug!(
            "shortest_paths: built nodes={} edges={}",
            size,
            graph.edge_count()
        );
        Ok(table)
    }

    /// The graph snapshot this table was computed from.
    pub fn graph(&self) -> &'g MultiDigraph<N> {
        self.graph
    }

    /// Hop count of the shortest `from -> to` path, or `None` when unreachable.
    pub fn length(&self, from: &N, to: &N) -> Result<Option<u32>> {
        let (src, end) = self.lookup(from, to)?;
        Ok(self.distance_ix(src, end))
    }

    /// Node sequence of one shortest `from -> to` path, both ends included.
    ///
    /// Returns `None` when `to` is unreachable from `from`.
    pub fn path(&self, from: &N, to: &N) -> Result<Option<Vec<N>>> {
        let (src, end) = self.lookup(from, to)?;
        Ok(self.path_ix(src, end).map(|ixs| {
            ixs.into_iter()
                .map(|ix| self.graph.node_at(ix).clone())
                .collect()
        }))
    }

    pub(crate) fn distance_ix(&self, src: usize, end: usize) -> Option<u32> {
        self.distances[self.cell(src, end)]
    }

    pub(crate) fn path_ix(&self, src: usize, end: usize) -> Option<Vec<usize>> {
        let mut nodes = vec![end];
        let mut cur = end;
        while let Some(prev) = self.predecessors[self.cell(src, cur)] {
            nodes.push(prev);
            cur = prev;
        }

        // A chain that does not lead back to `src` means there is no path.
        if cur != src {
            return None;
        }

        nodes.reverse();
        Some(nodes)
    }

    fn lookup(&self, from: &N, to: &N) -> Result<(usize, usize)> {
        let src = self
            .graph
            .node_ix(from)
            .ok_or_else(|| Error::unknown_node(from))?;
        let end = self
            .graph
            .node_ix(to)
            .ok_or_else(|| Error::unknown_node(to))?;
        Ok((src, end))
    }

    fn cell(&self, src: usize, end: usize) -> usize {
        src * self.size + end
    }

    fn seed(&mut self) {
        for node in 0..self.size {
            let own = self.cell(node, node);
            self.distances[own] = Some(0);

            for child in self.graph.successors_ix(node) {
                if child == node {
                    continue;
                }
                let cell = self.cell(node, child);
                self.distances[cell] = Some(1);
                self.predecessors[cell] = Some(node);
            }
        }
    }

    fn relax(&mut self) {
        let size = self.size;
        for mid in 0..size {
            for src in 0..size {
                let Some(to_mid) = self.distances[self.cell(src, mid)] else {
                    continue;
                };
                for end in 0..size {
                    if src == end {
                        continue;
                    }
                    let Some(from_mid) = self.distances[self.cell(mid, end)] else {
                        continue;
                    };

                    let candidate = to_mid + from_mid;
                    let cell = self.cell(src, end);
                    if self.distances[cell].is_none_or(|current| candidate < current) {
                        let spliced = self.predecessors[self.cell(mid, end)];
                        self.distances[cell] = Some(candidate);
                        self.predecessors[cell] = spliced;
                    }
                }
            }
        }
    }
}

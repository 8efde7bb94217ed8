//! Balancing a transition graph and walking every edge of it.

use crate::error::{Error, Result};
use crate::graph::{Edge, EdgeKey, MultiDigraph, Node};
use crate::matching::ImbalanceMatcher;
use crate::shortest_paths::ShortestPathTable;
use std::collections::{BTreeSet, HashSet};

/// How [`TourBuilder`] walks the balanced graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkStrategy {
    /// Hierholzer's algorithm: linear time, always succeeds on a balanced,
    /// connected graph.
    #[default]
    Hierholzer,
    /// Depth-first search over unused edges that backtracks on dead ends.
    /// Always tries out-edges in insertion order, so it favours finishing one
    /// lap before starting the next. Exponential in the worst case.
    Backtracking,
}

/// Computes a shortest edge-covering tour of a transition graph.
///
/// The graph must already contain a synthetic `end -> start` edge. It lets
/// shortest paths "restart" from the beginning while balancing, and is
/// removed again before the walk so it is never forced into the tour.
/// Duplicated copies of the relation stay and mark lap boundaries.
#[derive(Debug)]
pub struct TourBuilder<N> {
    graph: MultiDigraph<N>,
    start: N,
    end: N,
    return_key: EdgeKey,
    strategy: WalkStrategy,
}

impl<N: Node> TourBuilder<N> {
    /// Adopt the most recently inserted `end -> start` edge as the synthetic
    /// return edge.
    pub fn new(graph: MultiDigraph<N>, start: N, end: N) -> Result<Self> {
        check_endpoints(&graph, &start, &end)?;
        let return_key = graph
            .out_edges(&end)
            .filter(|edge| *edge.to == start)
            .map(|edge| edge.key)
            .last()
            .ok_or_else(|| {
                Error::invalid_graph(format!("missing return edge {end} -> {start}"))
            })?;

        Ok(Self {
            graph,
            start,
            end,
            return_key,
            strategy: WalkStrategy::default(),
        })
    }

    /// Use the edge stored under `return_key` as the synthetic return edge.
    pub fn with_return_edge(
        graph: MultiDigraph<N>,
        start: N,
        end: N,
        return_key: EdgeKey,
    ) -> Result<Self> {
        check_endpoints(&graph, &start, &end)?;
        match graph.edge(return_key) {
            Some(edge) if edge.relates(&&end, &&start) => {}
            _ => {
                return Err(Error::invalid_graph(format!(
                    "edge {return_key} is not a {end} -> {start} edge"
                )));
            }
        }

        Ok(Self {
            graph,
            start,
            end,
            return_key,
            strategy: WalkStrategy::default(),
        })
    }

    pub fn strategy(mut self, strategy: WalkStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Balance the graph, drop the return edge and walk every remaining edge once.
    pub fn run(self) -> Result<Tour<N>> {
        let Self {
            mut graph,
            start,
            end,
            return_key,
            strategy,
        } = self;

        // The table and matcher borrow the graph; both are gone before it changes.
        let paths = {
            let table = ShortestPathTable::new(&graph)?;
            let matcher = ImbalanceMatcher::new(&graph, Some(&table))?;
            let mut paths = Vec::with_capacity(matcher.plan().len());
            for (deficit, surplus) in matcher.plan().pairs() {
                let path = table.path(deficit, surplus)?.ok_or_else(|| {
                    Error::infeasible(deficit, format!("no path to surplus node {surplus}"))
                })?;
                paths.push(path);
            }
            paths
        };

        let mut duplicated = BTreeSet::new();
        for path in &paths {
            for hop in path.windows(2) {
                duplicated.insert(graph.add_edge(hop[0].clone(), hop[1].clone()));
            }
        }
        log::debug!(
            "tour: duplicated pairings={} edges={}",
            paths.len(),
            duplicated.len()
        );

        check_balanced(&graph)?;
        graph.remove_edge_by_key(return_key);

        let start_ix = graph
            .node_ix(&start)
            .ok_or_else(|| Error::unknown_node(&start))?;
        check_reachable(&graph, start_ix)?;

        let keys = match strategy {
            WalkStrategy::Hierholzer => hierholzer(&graph, start_ix),
            WalkStrategy::Backtracking => backtrack(&graph, start_ix)?,
        };
        check_walk(&graph, start_ix, &keys)?;

        let edges: Vec<Edge<N>> = keys
            .iter()
            .filter_map(|key| graph.edge(*key).map(|edge| edge.cloned()))
            .collect();
        log::debug!(
            "tour: walked edges={} strategy={:?}",
            edges.len(),
            strategy
        );

        Ok(Tour {
            edges,
            start,
            end,
            duplicated,
            graph,
        })
    }
}

/// Build the shortest tour of `graph`, which must contain a synthetic
/// `end -> start` edge.
///
/// # Examples
///
/// ```
/// use tourplan::v1::{MultiDigraph, build_tour};
///
/// let mut g = MultiDigraph::from_edges([
///     ("start", "login"),
///     ("login", "end"),
///     ("login", "error"),
///     ("error", "end"),
/// ]);
/// g.add_edge("end", "start");
///
/// let tour = build_tour(g, "start", "end").unwrap();
/// let laps = tour.laps();
/// assert_eq!(laps.len(), 2);
/// assert_eq!(tour.duplicated().len(), 2);
/// ```
pub fn build_tour<N: Node>(graph: MultiDigraph<N>, start: N, end: N) -> Result<Tour<N>> {
    TourBuilder::new(graph, start, end)?.run()
}

/// A walk that uses every edge of the balanced graph exactly once.
#[derive(Debug, Clone)]
pub struct Tour<N> {
    edges: Vec<Edge<N>>,
    start: N,
    end: N,
    duplicated: BTreeSet<EdgeKey>,
    graph: MultiDigraph<N>,
}

impl<N: Node> Tour<N> {
    pub fn edges(&self) -> &[Edge<N>] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<Edge<N>> {
        self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn start(&self) -> &N {
        &self.start
    }

    pub fn end(&self) -> &N {
        &self.end
    }

    /// Split the tour at every `end -> start` edge.
    ///
    /// The separating edges belong to no lap. There is always at least one
    /// lap, possibly empty.
    pub fn laps(&self) -> Vec<&[Edge<N>]> {
        self.edges
            .split(|edge| edge.relates(&self.end, &self.start))
            .collect()
    }

    /// Keys of edges added while balancing the graph.
    pub fn duplicated(&self) -> &BTreeSet<EdgeKey> {
        &self.duplicated
    }

    pub fn is_duplicate(&self, key: EdgeKey) -> bool {
        self.duplicated.contains(&key)
    }

    /// The balanced graph the tour walks, without the synthetic return edge.
    pub fn graph(&self) -> &MultiDigraph<N> {
        &self.graph
    }
}

fn check_endpoints<N: Node>(graph: &MultiDigraph<N>, start: &N, end: &N) -> Result<()> {
    if graph.is_empty() {
        return Err(Error::invalid_graph("multigraph is empty"));
    }
    for node in [start, end] {
        if !graph.contains_node(node) {
            return Err(Error::invalid_graph(format!(
                "node {node} is not contained in graph"
            )));
        }
    }
    Ok(())
}

fn check_balanced<N: Node>(graph: &MultiDigraph<N>) -> Result<()> {
    for ix in 0..graph.node_count() {
        if graph.out_degree_ix(ix) != graph.in_degree_ix(ix) {
            return Err(Error::infeasible(
                graph.node_at(ix),
                "node is still unbalanced after duplication",
            ));
        }
    }
    Ok(())
}

fn check_reachable<N: Node>(graph: &MultiDigraph<N>, start: usize) -> Result<()> {
    let mut seen = vec![false; graph.node_count()];
    let mut stack = vec![start];
    seen[start] = true;
    while let Some(node) = stack.pop() {
        for next in graph.successors_ix(node) {
            if !seen[next] {
                seen[next] = true;
                stack.push(next);
            }
        }
    }

    for ix in 0..graph.node_count() {
        if graph.out_degree_ix(ix) > 0 && !seen[ix] {
            return Err(Error::infeasible(
                graph.node_at(ix),
                format!("not reachable from start node {}", graph.node_at(start)),
            ));
        }
    }
    Ok(())
}

/// Iterative Hierholzer walk from `start`, consuming out-edges in insertion order.
fn hierholzer<N: Node>(graph: &MultiDigraph<N>, start: usize) -> Vec<EdgeKey> {
    let mut cursor = vec![0usize; graph.node_count()];
    let mut stack: Vec<(usize, Option<EdgeKey>)> = vec![(start, None)];
    let mut trail = Vec::with_capacity(graph.edge_count());

    while let Some(&(node, via)) = stack.last() {
        let outgoing = graph.outgoing_ix(node);
        if let Some(&key) = outgoing.get(cursor[node]) {
            cursor[node] += 1;
            stack.push((graph.target_ix(key), Some(key)));
        } else {
            stack.pop();
            if let Some(key) = via {
                trail.push(key);
            }
        }
    }

    trail.reverse();
    trail
}

struct Frame {
    node: usize,
    next: usize,
}

/// Depth-first edge-disjoint search that backtracks until every edge is used.
fn backtrack<N: Node>(graph: &MultiDigraph<N>, start: usize) -> Result<Vec<EdgeKey>> {
    let total = graph.edge_count();
    let mut used: HashSet<EdgeKey> = HashSet::with_capacity(total);
    let mut path: Vec<EdgeKey> = Vec::with_capacity(total);
    let mut frames = vec![Frame {
        node: start,
        next: 0,
    }];
    let mut deepest = 0;

    while path.len() < total {
        let Some(frame) = frames.last_mut() else {
            return Err(Error::TourConstruction {
                walked: deepest,
                total,
            });
        };

        let outgoing = graph.outgoing_ix(frame.node);
        let candidate = outgoing[frame.next..]
            .iter()
            .position(|key| !used.contains(key))
            .map(|offset| frame.next + offset);

        match candidate {
            Some(ix) => {
                frame.next = ix + 1;
                let key = outgoing[ix];
                used.insert(key);
                path.push(key);
                deepest = deepest.max(path.len());
                frames.push(Frame {
                    node: graph.target_ix(key),
                    next: 0,
                });
            }
            None => {
                frames.pop();
                if let Some(key) = path.pop() {
                    used.remove(&key);
                }
            }
        }
    }

    Ok(path)
}

fn check_walk<N: Node>(graph: &MultiDigraph<N>, start: usize, keys: &[EdgeKey]) -> Result<()> {
    let total = graph.edge_count();
    let failed = || Error::TourConstruction {
        walked: keys.len(),
        total,
    };

    if keys.len() != total {
        return Err(failed());
    }

    let mut seen = HashSet::with_capacity(total);
    let mut at = start;
    for key in keys {
        let (source, target) = graph.endpoints_ix(*key).ok_or_else(failed)?;
        if source != at || !seen.insert(*key) {
            return Err(failed());
        }
        at = target;
    }
    Ok(())
}

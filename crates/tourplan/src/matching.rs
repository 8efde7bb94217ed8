//! Degree-imbalance analysis and the duplication plan that removes it.

use crate::assignment;
use crate::error::{Error, Result};
use crate::graph::{MultiDigraph, Node};
use crate::shortest_paths::ShortestPathTable;

/// One unit of deficit or surplus at `node`; `ordinal` tells repeated units apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnbalancedCopy<N> {
    pub node: N,
    pub ordinal: usize,
}

/// For each deficit node, the surplus nodes it must walk to, one entry per
/// unit of deficit.
///
/// Deficit nodes appear in graph insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicationPlan<N> {
    entries: Vec<(N, Vec<N>)>,
    total_cost: u64,
}

impl<N: Node> DuplicationPlan<N> {
    /// Surplus partners of `deficit`, if it has any.
    pub fn get(&self, deficit: &N) -> Option<&[N]> {
        self.entries
            .iter()
            .find(|(node, _)| node == deficit)
            .map(|(_, partners)| partners.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&N, &[N])> {
        self.entries
            .iter()
            .map(|(node, partners)| (node, partners.as_slice()))
    }

    /// Every `(deficit, surplus)` pairing, flattened.
    pub fn pairs(&self) -> impl Iterator<Item = (&N, &N)> {
        self.entries
            .iter()
            .flat_map(|(node, partners)| partners.iter().map(move |partner| (node, partner)))
    }

    /// Number of pairings.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, partners)| partners.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of shortest-path lengths over all pairings: the number of edges
    /// duplication will add.
    pub fn total_cost(&self) -> u64 {
        self.total_cost
    }
}

/// Pairs every unit of in-degree excess with a unit of out-degree excess at
/// minimum total walking distance.
///
/// A node with surplus `out - in < 0` ends walks more often than it starts
/// them; it must be left again, so it becomes a deficit copy that is routed
/// to some surplus node along a shortest path. The pairing is a minimum-cost
/// perfect assignment over [`ShortestPathTable`] distances.
///
/// # Examples
///
/// ```
/// use tourplan::v1::{ImbalanceMatcher, MultiDigraph};
///
/// // b has two ways in and one way out; a has the opposite problem.
/// let g = MultiDigraph::from_edges([("a", "b"), ("a", "b"), ("b", "a")]);
/// let matcher = ImbalanceMatcher::new(&g, None).unwrap();
///
/// assert_eq!(matcher.degree_surplus(&"b").unwrap(), -1);
/// assert_eq!(matcher.plan().get(&"b"), Some(&["a"][..]));
/// assert_eq!(matcher.plan().total_cost(), 1);
/// ```
#[derive(Debug)]
pub struct ImbalanceMatcher<'g, N> {
    graph: &'g MultiDigraph<N>,
    surplus: Vec<i64>,
    deficits: Vec<UnbalancedCopy<N>>,
    surpluses: Vec<UnbalancedCopy<N>>,
    plan: DuplicationPlan<N>,
}

impl<'g, N: Node> ImbalanceMatcher<'g, N> {
    /// Analyse `graph` and solve the assignment.
    ///
    /// Pass a table already built over the same graph to avoid recomputing
    /// it; a table built over a different graph is rejected.
    pub fn new(
        graph: &'g MultiDigraph<N>,
        table: Option<&ShortestPathTable<'g, N>>,
    ) -> Result<Self> {
        if graph.is_empty() {
            return Err(Error::invalid_graph("multigraph is empty"));
        }

        let owned;
        let table = match table {
            Some(table) => {
                if !std::ptr::eq(table.graph(), graph) {
                    return Err(Error::invalid_graph(
                        "shortest path table was built over a different graph",
                    ));
                }
                table
            }
            None => {
                owned = ShortestPathTable::new(graph)?;
                &owned
            }
        };

        let surplus: Vec<i64> = (0..graph.node_count())
            .map(|ix| graph.out_degree_ix(ix) as i64 - graph.in_degree_ix(ix) as i64)
            .collect();

        let mut deficit_ixs = Vec::new();
        let mut surplus_ixs = Vec::new();
        for (ix, count) in surplus.iter().enumerate() {
            for ordinal in 0..count.unsigned_abs() as usize {
                if *count < 0 {
                    deficit_ixs.push((ix, ordinal));
                } else {
                    surplus_ixs.push((ix, ordinal));
                }
            }
        }

        if deficit_ixs.len() != surplus_ixs.len() {
            return Err(Error::invalid_graph(format!(
                "degree bookkeeping is inconsistent: {} deficit vs {} surplus units",
                deficit_ixs.len(),
                surplus_ixs.len()
            )));
        }

        let plan = Self::assign(graph, table, &deficit_ixs, &surplus_ixs)?;

        log::debug!(
            "matcher: deficits={} surpluses={} cost={}",
            deficit_ixs.len(),
            surplus_ixs.len(),
            plan.total_cost
        );

        let to_copies = |ixs: &[(usize, usize)]| -> Vec<UnbalancedCopy<N>> {
            ixs.iter()
                .map(|(ix, ordinal)| UnbalancedCopy {
                    node: graph.node_at(*ix).clone(),
                    ordinal: *ordinal,
                })
                .collect()
        };

        Ok(Self {
            graph,
            surplus,
            deficits: to_copies(&deficit_ixs),
            surpluses: to_copies(&surplus_ixs),
            plan,
        })
    }

    /// `out_degree - in_degree` of `node`.
    pub fn degree_surplus(&self, node: &N) -> Result<i64> {
        self.graph
            .node_ix(node)
            .map(|ix| self.surplus[ix])
            .ok_or_else(|| Error::unknown_node(node))
    }

    /// Degree surplus of every node, in graph insertion order.
    pub fn degree_surpluses(&self) -> impl Iterator<Item = (&N, i64)> {
        self.graph.nodes().zip(self.surplus.iter().copied())
    }

    /// Nodes with more ways in than out, one copy per unit.
    pub fn deficits(&self) -> &[UnbalancedCopy<N>] {
        &self.deficits
    }

    /// Nodes with more ways out than in, one copy per unit.
    pub fn surpluses(&self) -> &[UnbalancedCopy<N>] {
        &self.surpluses
    }

    pub fn plan(&self) -> &DuplicationPlan<N> {
        &self.plan
    }

    pub fn into_plan(self) -> DuplicationPlan<N> {
        self.plan
    }

    fn assign(
        graph: &MultiDigraph<N>,
        table: &ShortestPathTable<'_, N>,
        deficits: &[(usize, usize)],
        surpluses: &[(usize, usize)],
    ) -> Result<DuplicationPlan<N>> {
        let distances: Vec<Vec<Option<u32>>> = deficits
            .iter()
            .map(|(d, _)| {
                surpluses
                    .iter()
                    .map(|(s, _)| table.distance_ix(*d, *s))
                    .collect()
            })
            .collect();

        // Price unreachable pairs above any assignment made of reachable ones.
        let longest = distances
            .iter()
            .flatten()
            .flatten()
            .copied()
            .max()
            .unwrap_or(0) as i64;
        let blocked = (longest + 1) * deficits.len() as i64 + 1;
        let costs: Vec<Vec<i64>> = distances
            .iter()
            .map(|row| {
                row.iter()
                    .map(|d| d.map_or(blocked, i64::from))
                    .collect()
            })
            .collect();

        let assignment = assignment::solve(&costs);

        let mut entries: Vec<(N, Vec<N>)> = Vec::new();
        let mut total_cost = 0u64;
        for (row, col) in assignment.into_iter().enumerate() {
            let (deficit, _) = deficits[row];
            let (partner, _) = surpluses[col];
            let Some(cost) = distances[row][col] else {
                return Err(Error::infeasible(
                    graph.node_at(deficit),
                    format!(
                        "imbalance cannot be resolved, no path to surplus node {}",
                        graph.node_at(partner)
                    ),
                ));
            };
            total_cost += u64::from(cost);

            let deficit = graph.node_at(deficit);
            let partner = graph.node_at(partner).clone();
            match entries.last_mut() {
                Some((node, partners)) if node == deficit => partners.push(partner),
                _ => entries.push((deficit.clone(), vec![partner])),
            }
        }

        Ok(DuplicationPlan {
            entries,
            total_cost,
        })
    }
}

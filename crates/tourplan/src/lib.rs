#![doc = include_str!("../README.md")]

mod assignment;
mod error;
mod graph;
mod matching;
mod model;
mod shortest_paths;
mod tour;

pub use error::{Error, Result};

pub mod v1 {
    //! Versioned public API for tour planning.
    //!
    //! Everything you need is re-exported from this module.
    //!
    //! # Graphs
    //!
    //! - [`MultiDigraph`]: directed multigraph with stable edge keys
    //! - [`Edge`], [`EdgeKey`]: one keyed arc and its identifier
    //! - [`Node`]: bound satisfied by any `Clone + Eq + Hash + Display` id
    //!
    //! # Algorithms
    //!
    //! - [`ShortestPathTable`]: all-pairs hop distances and paths
    //! - [`ImbalanceMatcher`]: which nodes to connect to balance the graph
    //! - [`TourBuilder`], [`build_tour`]: the shortest edge-covering walk
    //!
    //! # Documents
    //!
    //! - [`TestModel`], [`Transition`]: JSON input
    //! - [`TestPlan`], [`Response`]: JSON output
    //!
    //! # Example: tour of a login flow
    //!
    //! ```
    //! use tourplan::v1::*;
    //!
    //! let mut g = MultiDigraph::from_edges([
    //!     ("start", "form"),
    //!     ("form", "form"),
    //!     ("form", "home"),
    //!     ("form", "locked"),
    //!     ("locked", "start"),
    //!     ("home", "end"),
    //! ]);
    //! g.add_edge("end", "start");
    //!
    //! let tour = TourBuilder::new(g, "start", "end").unwrap().run().unwrap();
    //! assert_eq!(tour.edges()[0].from, "start");
    //! assert_eq!(tour.edges().last().map(|e| e.to), Some("end"));
    //! // "locked" sends the user back to start, so start -> form is walked twice.
    //! assert_eq!(tour.duplicated().len(), 1);
    //! assert_eq!(tour.len(), 7);
    //! ```

    pub use crate::error::{Error, Result};
    pub use crate::graph::{Edge, EdgeKey, MultiDigraph, Node};
    pub use crate::matching::{DuplicationPlan, ImbalanceMatcher, UnbalancedCopy};
    pub use crate::model::{InvalidFields, Response, TestModel, TestPlan, Transition};
    pub use crate::shortest_paths::ShortestPathTable;
    pub use crate::tour::{Tour, TourBuilder, WalkStrategy, build_tour};
}

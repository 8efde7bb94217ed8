//! Generate Graphviz DOT visualizations of transition graphs and tours.
//!
//! The start state is filled green and the end state red. When a tour is
//! rendered, every edge is labelled with its position in the walk and edges
//! added while balancing the graph are drawn dashed.
//!
//! # Example
//!
//! ```
//! use tourplan::v1::{MultiDigraph, build_tour};
//! use tourplan_dot::{RenderOptions, render_tour};
//!
//! let mut g = MultiDigraph::from_edges([("start", "a"), ("a", "end"), ("a", "a")]);
//! g.add_edge("end", "start");
//! let tour = build_tour(g, "start", "end").unwrap();
//!
//! let dot = render_tour(&tour, &RenderOptions::default());
//! assert!(dot.contains("digraph tourplan"));
//! assert!(dot.contains("\"a\" -> \"a\" [label=\"2\"]"));
//! ```
//!
//! Pipe the output through Graphviz to produce images:
//!
//! ```bash
//! tourplan render -i model.json | dot -Tpng -o tour.png
//! ```

use std::collections::{BTreeSet, HashMap};

use tourplan::v1::{EdgeKey, MultiDigraph, Node, Tour};

const START_FILL: &str = "#ccffcc";
const END_FILL: &str = "#ffcccc";
const START_END_FILL: &str = "#ffffcc";
const DUPLICATE_COLOR: &str = "#cc0000";

/// Options controlling what information is rendered in the DOT output.
pub struct RenderOptions {
    /// Label each edge with its 1-based position in the tour.
    pub show_order: bool,
    /// Draw edges added while balancing dashed and red.
    pub highlight_duplicates: bool,
    /// Append the edge key to every edge label.
    pub show_keys: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_order: true,
            highlight_duplicates: true,
            show_keys: false,
        }
    }
}

/// Render a transition graph with its start and end states marked.
pub fn render_graph<N: Node>(
    graph: &MultiDigraph<N>,
    start: &N,
    end: &N,
    options: &RenderOptions,
) -> String {
    render_inner(graph, start, end, &HashMap::new(), &BTreeSet::new(), options)
}

/// Render the balanced graph of a [`Tour`], annotated with the walk.
pub fn render_tour<N: Node>(tour: &Tour<N>, options: &RenderOptions) -> String {
    let positions: HashMap<EdgeKey, usize> = tour
        .edges()
        .iter()
        .enumerate()
        .map(|(ix, edge)| (edge.key, ix + 1))
        .collect();
    render_inner(
        tour.graph(),
        tour.start(),
        tour.end(),
        &positions,
        tour.duplicated(),
        options,
    )
}

fn render_inner<N: Node>(
    graph: &MultiDigraph<N>,
    start: &N,
    end: &N,
    positions: &HashMap<EdgeKey, usize>,
    duplicated: &BTreeSet<EdgeKey>,
    options: &RenderOptions,
) -> String {
    let mut dot = String::new();
    dot.push_str("digraph tourplan {\n");
    dot.push_str("  rankdir=LR;\n");
    dot.push_str("  node [shape=ellipse, fontname=\"Helvetica\"];\n");
    dot.push_str("  edge [color=\"#666666\", fontname=\"Helvetica\", fontsize=10];\n\n");

    for node in graph.nodes() {
        let id = escape_dot(&node.to_string());
        let fill = match (node == start, node == end) {
            (true, true) => Some(START_END_FILL),
            (true, false) => Some(START_FILL),
            (false, true) => Some(END_FILL),
            (false, false) => None,
        };
        match fill {
            Some(fill) => dot.push_str(&format!(
                "  \"{}\" [style=filled, fillcolor=\"{}\", penwidth=2];\n",
                id, fill
            )),
            None => dot.push_str(&format!("  \"{}\";\n", id)),
        }
    }
    dot.push('\n');

    for edge in graph.edges() {
        let mut attrs = Vec::new();

        let mut label = Vec::new();
        if options.show_order
            && let Some(position) = positions.get(&edge.key)
        {
            label.push(position.to_string());
        }
        if options.show_keys {
            label.push(format!("k{}", edge.key));
        }
        if !label.is_empty() {
            attrs.push(format!("label=\"{}\"", label.join(" ")));
        }

        if options.highlight_duplicates && duplicated.contains(&edge.key) {
            attrs.push("style=dashed".to_string());
            attrs.push(format!("color=\"{}\"", DUPLICATE_COLOR));
        }

        let from = escape_dot(&edge.from.to_string());
        let to = escape_dot(&edge.to.to_string());
        if attrs.is_empty() {
            dot.push_str(&format!("  \"{}\" -> \"{}\";\n", from, to));
        } else {
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [{}];\n",
                from,
                to,
                attrs.join(", ")
            ));
        }
    }

    dot.push_str("}\n");
    dot
}

/// Escape a string for use in DOT label attributes (double-quoted context).
pub fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourplan::v1::{TourBuilder, WalkStrategy, build_tour};

    fn login_graph() -> MultiDigraph<&'static str> {
        let mut g = MultiDigraph::from_edges([
            ("start", "form"),
            ("form", "home"),
            ("form", "error"),
            ("error", "start"),
            ("home", "end"),
        ]);
        g.add_edge("end", "start");
        g
    }

    // ── escape_dot ─────────────────────────────────────────────────────

    #[test]
    fn test_escape_dot_quotes() {
        assert_eq!(escape_dot(r#"say "hello""#), r#"say \"hello\""#);
    }

    #[test]
    fn test_escape_dot_backslash() {
        assert_eq!(escape_dot(r"C:\states"), r"C:\\states");
    }

    #[test]
    fn test_escape_dot_newline() {
        assert_eq!(escape_dot("line1\nline2"), r"line1\nline2");
    }

    // ── render_graph ───────────────────────────────────────────────────

    #[test]
    fn test_render_graph_marks_start_and_end() {
        let g = login_graph();
        let dot = render_graph(&g, &"start", &"end", &RenderOptions::default());
        assert!(dot.starts_with("digraph tourplan {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("\"start\" [style=filled, fillcolor=\"#ccffcc\", penwidth=2];"));
        assert!(dot.contains("\"end\" [style=filled, fillcolor=\"#ffcccc\", penwidth=2];"));
        assert!(dot.contains("  \"error\";\n"));
    }

    #[test]
    fn test_render_graph_has_no_order_labels() {
        let g = login_graph();
        let dot = render_graph(&g, &"start", &"end", &RenderOptions::default());
        assert!(!dot.contains("label="));
        assert_eq!(dot.matches(" -> ").count(), g.edge_count());
    }

    #[test]
    fn test_render_graph_start_equals_end() {
        let g = MultiDigraph::from_edges([("idle", "busy"), ("busy", "idle")]);
        let dot = render_graph(&g, &"idle", &"idle", &RenderOptions::default());
        assert!(dot.contains("\"idle\" [style=filled, fillcolor=\"#ffffcc\""));
    }

    #[test]
    fn test_render_escapes_node_names() {
        let g = MultiDigraph::from_edges([("say \"hi\"", "done")]);
        let dot = render_graph(&g, &"say \"hi\"", &"done", &RenderOptions::default());
        assert!(dot.contains(r#""say \"hi\"" -> "done";"#));
    }

    #[test]
    fn test_show_keys() {
        let g = MultiDigraph::from_edges([("a", "b"), ("a", "b")]);
        let options = RenderOptions {
            show_keys: true,
            ..RenderOptions::default()
        };
        let dot = render_graph(&g, &"a", &"b", &options);
        assert!(dot.contains("\"a\" -> \"b\" [label=\"k0\"];"));
        assert!(dot.contains("\"a\" -> \"b\" [label=\"k1\"];"));
    }

    // ── render_tour ────────────────────────────────────────────────────

    #[test]
    fn test_render_tour_labels_every_edge_once() {
        let tour = build_tour(login_graph(), "start", "end").unwrap();
        let dot = render_tour(&tour, &RenderOptions::default());
        for position in 1..=tour.len() {
            assert_eq!(
                dot.matches(&format!("label=\"{position}\"")).count(),
                1,
                "position {position}"
            );
        }
    }

    #[test]
    fn test_render_tour_dashes_duplicates() {
        let tour = build_tour(login_graph(), "start", "end").unwrap();
        assert!(!tour.duplicated().is_empty());
        let dot = render_tour(&tour, &RenderOptions::default());
        assert_eq!(
            dot.matches("style=dashed").count(),
            tour.duplicated().len()
        );
        assert!(dot.contains("color=\"#cc0000\""));
    }

    #[test]
    fn test_render_tour_without_annotations() {
        let tour = TourBuilder::new(login_graph(), "start", "end")
            .unwrap()
            .strategy(WalkStrategy::Backtracking)
            .run()
            .unwrap();
        let options = RenderOptions {
            show_order: false,
            highlight_duplicates: false,
            show_keys: false,
        };
        let dot = render_tour(&tour, &options);
        assert!(!dot.contains("label="));
        assert!(!dot.contains("dashed"));
        assert_eq!(dot.matches(" -> ").count(), tour.len());
    }

    #[test]
    fn test_render_tour_order_follows_walk() {
        let tour = TourBuilder::new(login_graph(), "start", "end")
            .unwrap()
            .strategy(WalkStrategy::Backtracking)
            .run()
            .unwrap();
        let dot = render_tour(&tour, &RenderOptions::default());
        assert!(dot.contains("\"start\" -> \"form\" [label=\"1\"];"));
    }
}

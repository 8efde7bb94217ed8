//! JSON documents: test models in, test plans and response envelopes out.

use crate::error::{Error, Result};
use crate::graph::{Edge, EdgeKey, MultiDigraph};
use crate::tour::{TourBuilder, WalkStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const REQUIRED: &str = "This field is required.";

/// One transition of the system under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(default, alias = "from")]
    pub from_node: String,
    #[serde(default, alias = "to")]
    pub to_node: String,
}

impl Transition {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from_node: from.into(),
            to_node: to.into(),
        }
    }
}

/// A state-transition model to derive test paths from.
///
/// Missing fields deserialize as empty and are reported by
/// [`TestModel::field_errors`] instead of failing the parse.
///
/// # Examples
///
/// ```
/// use tourplan::v1::TestModel;
///
/// let model = TestModel::from_json(r#"{
///     "start": "logged_out",
///     "end": "logged_out",
///     "edges": [
///         {"from": "logged_out", "to": "logged_in"},
///         {"from": "logged_in", "to": "logged_out"}
///     ]
/// }"#).unwrap();
///
/// let plan = model.plan(Default::default()).unwrap();
/// assert_eq!(plan.paths, vec![vec![
///     ["logged_out".to_string(), "logged_in".to_string()],
///     ["logged_in".to_string(), "logged_out".to_string()],
/// ]]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestModel {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub edges: Vec<Transition>,
    #[serde(default)]
    pub verbose: bool,
}

impl TestModel {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Messages per offending field, keyed like `start` or `edges-2-to_node`.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let mut errors = BTreeMap::new();
        let mut require = |field: String, value: &str| {
            if value.trim().is_empty() {
                errors.insert(field, vec![REQUIRED.to_string()]);
            }
        };

        require("start".to_string(), &self.start);
        require("end".to_string(), &self.end);
        for (ix, edge) in self.edges.iter().enumerate() {
            require(format!("edges-{ix}-from_node"), &edge.from_node);
            require(format!("edges-{ix}-to_node"), &edge.to_node);
        }
        if self.edges.is_empty() {
            errors.insert("edges".to_string(), vec![REQUIRED.to_string()]);
        }
        errors
    }

    pub fn validate(&self) -> Result<()> {
        let errors = self.field_errors();
        if errors.is_empty() {
            return Ok(());
        }
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        Err(Error::invalid_graph(format!(
            "invalid fields: {}",
            fields.join(", ")
        )))
    }

    /// Build the transition graph. Edge `i` of the model gets key `i`; the
    /// returned key is the appended `end -> start` return edge.
    pub fn to_graph(&self) -> Result<(MultiDigraph<String>, EdgeKey)> {
        self.validate()?;
        let mut graph = MultiDigraph::new();
        for edge in &self.edges {
            graph.add_edge(edge.from_node.clone(), edge.to_node.clone());
        }
        let return_key = graph.add_edge(self.end.clone(), self.start.clone());
        Ok((graph, return_key))
    }

    /// Compute the test paths: one per lap of the shortest tour.
    pub fn plan(&self, strategy: WalkStrategy) -> Result<TestPlan> {
        let (graph, return_key) = self.to_graph()?;
        let tour = TourBuilder::with_return_edge(
            graph,
            self.start.clone(),
            self.end.clone(),
            return_key,
        )?
        .strategy(strategy)
        .run()?;

        let paths = tour
            .laps()
            .into_iter()
            .map(|lap| {
                lap.iter()
                    .map(|edge| [edge.from.clone(), edge.to.clone()])
                    .collect()
            })
            .collect();
        let graph = tour.graph().edges().map(|edge| edge.cloned()).collect();

        Ok(TestPlan { paths, graph })
    }
}

/// Test paths derived from a [`TestModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestPlan {
    /// Each path starts at the model's start node; every step is `[from, to]`.
    pub paths: Vec<Vec<[String; 2]>>,
    /// The balanced graph the tour was walked on.
    pub graph: Vec<Edge<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidFields {
    #[serde(rename = "invalid fields")]
    pub fields: BTreeMap<String, Vec<String>>,
}

/// The JSON envelope returned for one planning request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<Vec<[String; 2]>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<InvalidFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<TestModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<Vec<Edge<String>>>,
}

impl Response {
    /// Validate and plan `model`, folding every failure into the envelope.
    pub fn for_model(model: &TestModel, strategy: WalkStrategy) -> Self {
        let fields = model.field_errors();
        if !fields.is_empty() {
            return Self {
                errors: Some(InvalidFields { fields }),
                ..Self::default()
            };
        }

        let (mut response, graph) = match model.plan(strategy) {
            Ok(plan) => (
                Self {
                    success: true,
                    paths: Some(plan.paths),
                    ..Self::default()
                },
                Some(plan.graph),
            ),
            Err(err) => {
                log::error!("model: plan failed error={err}");
                let graph = model
                    .to_graph()
                    .ok()
                    .map(|(graph, _)| graph.edges().map(|edge| edge.cloned()).collect());
                (Self::failure(&err), graph)
            }
        };

        if model.verbose {
            response.form = Some(model.clone());
            response.graph = graph;
        }
        response
    }

    pub fn failure(error: &dyn std::fmt::Display) -> Self {
        Self {
            error: Some(format!("Unable to complete request: {error}")),
            ..Self::default()
        }
    }

    /// Number of test paths, zero on failure.
    pub fn path_count(&self) -> usize {
        self.paths.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKFLOW: &str = r#"{
        "start": "start",
        "end": "end",
        "edges": [
            {"from_node": "start", "to_node": "a"},
            {"from_node": "a", "to_node": "b"},
            {"from_node": "b", "to_node": "c"},
            {"from_node": "b", "to_node": "c"},
            {"from_node": "c", "to_node": "d"},
            {"from_node": "c", "to_node": "e"},
            {"from_node": "c", "to_node": "f"},
            {"from_node": "c", "to_node": "g"},
            {"from_node": "d", "to_node": "h"},
            {"from_node": "f", "to_node": "h"},
            {"from_node": "g", "to_node": "h"},
            {"from_node": "h", "to_node": "e"},
            {"from_node": "h", "to_node": "b"},
            {"from_node": "e", "to_node": "end"}
        ]
    }"#;

    fn step(from: &str, to: &str) -> [String; 2] {
        [from.to_string(), to.to_string()]
    }

    #[test]
    fn test_from_json_accepts_short_aliases() {
        let model = TestModel::from_json(
            r#"{"start": "s", "end": "e", "edges": [{"from": "s", "to": "e"}]}"#,
        )
        .unwrap();
        assert_eq!(model.edges, vec![Transition::new("s", "e")]);
        assert!(!model.verbose);
    }

    #[test]
    fn test_from_json_rejects_malformed_documents() {
        let err = TestModel::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_field_errors_name_each_missing_field() {
        let model = TestModel::from_json(
            r#"{"start": "", "edges": [{"from": "a"}, {"from": "a", "to": "b"}]}"#,
        )
        .unwrap();
        let errors = model.field_errors();
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["edges-0-to_node", "end", "start"]);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_empty_edge_list_is_invalid() {
        let model = TestModel {
            start: "s".into(),
            end: "e".into(),
            ..TestModel::default()
        };
        let err = model.to_graph().unwrap_err();
        assert!(err.to_string().contains("edges"));
    }

    #[test]
    fn test_to_graph_appends_return_edge() {
        let model = TestModel::from_json(WORKFLOW).unwrap();
        let (graph, return_key) = model.to_graph().unwrap();
        assert_eq!(graph.edge_count(), 15);
        assert_eq!(return_key, EdgeKey(14));
        let edge = graph.edge(return_key).unwrap();
        assert_eq!((edge.from.as_str(), edge.to.as_str()), ("end", "start"));
    }

    #[test]
    fn test_plan_splits_tour_into_paths() {
        let model = TestModel::from_json(WORKFLOW).unwrap();
        let plan = model.plan(WalkStrategy::Backtracking).unwrap();
        assert_eq!(plan.paths.len(), 2);
        assert_eq!(
            plan.paths[0],
            vec![
                step("start", "a"),
                step("a", "b"),
                step("b", "c"),
                step("c", "d"),
                step("d", "h"),
                step("h", "e"),
                step("e", "end"),
            ]
        );
        let steps: usize = plan.paths.iter().map(Vec::len).sum();
        assert_eq!(steps, 20);
        assert_eq!(plan.graph.len(), 21);
    }

    #[test]
    fn test_every_path_runs_start_to_end() {
        let model = TestModel::from_json(WORKFLOW).unwrap();
        let plan = model.plan(WalkStrategy::Hierholzer).unwrap();
        for path in &plan.paths {
            assert_eq!(path.first().map(|s| s[0].as_str()), Some("start"));
            assert_eq!(path.last().map(|s| s[1].as_str()), Some("end"));
        }
    }

    #[test]
    fn test_explicit_return_transition_is_kept() {
        let model = TestModel {
            start: "s".into(),
            end: "e".into(),
            edges: vec![Transition::new("s", "e"), Transition::new("e", "s")],
            verbose: false,
        };
        let plan = model.plan(WalkStrategy::default()).unwrap();
        // The model's own e -> s is walked and separates two one-step paths;
        // s -> e is walked a second time to get back to e.
        assert_eq!(plan.paths, vec![vec![step("s", "e")], vec![step("s", "e")]]);
        assert_eq!(plan.graph.len(), 3);
        assert!(plan.graph.iter().any(|edge| edge.key == EdgeKey(1)));
        assert!(plan.graph.iter().all(|edge| edge.key != EdgeKey(2)));
    }

    #[test]
    fn test_response_success_envelope() {
        let model = TestModel::from_json(WORKFLOW).unwrap();
        let response = Response::for_model(&model, WalkStrategy::default());
        assert!(response.success);
        assert_eq!(response.path_count(), 2);
        assert!(response.form.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
        assert!(json.get("graph").is_none());
    }

    #[test]
    fn test_response_verbose_carries_form_and_graph() {
        let mut model = TestModel::from_json(WORKFLOW).unwrap();
        model.verbose = true;
        let response = Response::for_model(&model, WalkStrategy::default());
        assert_eq!(response.form.as_ref(), Some(&model));
        assert_eq!(response.graph.as_ref().map(Vec::len), Some(21));
    }

    #[test]
    fn test_response_invalid_fields_envelope() {
        let model = TestModel::from_json(r#"{"end": "e"}"#).unwrap();
        let response = Response::for_model(&model, WalkStrategy::default());
        assert!(!response.success);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json["errors"]["invalid fields"]["start"][0],
            "This field is required."
        );
        assert!(json["errors"]["invalid fields"]["edges"].is_array());
    }

    #[test]
    fn test_response_infeasible_model() {
        let model = TestModel {
            start: "s".into(),
            end: "e".into(),
            edges: vec![
                Transition::new("s", "e"),
                Transition::new("s", "crashed"),
            ],
            verbose: true,
        };
        let response = Response::for_model(&model, WalkStrategy::default());
        assert!(!response.success);
        let error = response.error.as_deref().unwrap();
        assert!(error.starts_with("Unable to complete request: "));
        assert!(error.contains("crashed"));
        // Verbose failures still show the graph that was attempted.
        assert_eq!(response.graph.as_ref().map(Vec::len), Some(3));
    }
}

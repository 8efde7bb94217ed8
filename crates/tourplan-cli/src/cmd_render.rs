use anyhow::{Context, Result};
use std::path::PathBuf;
use tourplan::v1::{TestModel, TourBuilder};
use tourplan_dot::RenderOptions;

pub fn run(input: PathBuf, options: &RenderOptions, model_only: bool) -> Result<()> {
    let content = crate::read_input(&input)?;
    let model =
        TestModel::from_json(&content).with_context(|| format!("Failed to parse {:?}", input))?;
    print!("{}", render(&model, options, model_only)?);
    Ok(())
}

fn render(model: &TestModel, options: &RenderOptions, model_only: bool) -> Result<String> {
    let (graph, return_key) = model.to_graph()?;
    if model_only {
        return Ok(tourplan_dot::render_graph(
            &graph,
            &model.start,
            &model.end,
            options,
        ));
    }

    let tour = TourBuilder::with_return_edge(
        graph,
        model.start.clone(),
        model.end.clone(),
        return_key,
    )?
    .run()
    .context("Failed to plan a tour")?;
    Ok(tourplan_dot::render_tour(&tour, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MODEL: &str = r#"{
        "start": "idle",
        "end": "idle",
        "edges": [
            {"from_node": "idle", "to_node": "busy"},
            {"from_node": "busy", "to_node": "busy"},
            {"from_node": "busy", "to_node": "idle"}
        ]
    }"#;

    #[test]
    fn test_render_tour() {
        let model = TestModel::from_json(MODEL).unwrap();
        let dot = render(&model, &RenderOptions::default(), false).unwrap();
        assert!(dot.contains("digraph tourplan"));
        assert!(dot.contains("\"idle\" -> \"busy\" [label=\"1\"];"));
        // The synthetic idle -> idle return edge is not part of the tour.
        assert!(!dot.contains("\"idle\" -> \"idle\""));
    }

    #[test]
    fn test_render_model_only_keeps_return_edge() {
        let model = TestModel::from_json(MODEL).unwrap();
        let dot = render(&model, &RenderOptions::default(), true).unwrap();
        assert!(dot.contains("\"idle\" -> \"idle\";"));
        assert!(!dot.contains("label="));
    }

    #[test]
    fn test_render_infeasible_model_fails() {
        let model = TestModel::from_json(
            r#"{"start": "s", "end": "e", "edges": [
                {"from": "s", "to": "e"},
                {"from": "s", "to": "stuck"}
            ]}"#,
        )
        .unwrap();
        assert!(render(&model, &RenderOptions::default(), false).is_err());
    }

    #[test]
    fn test_run_with_file() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", MODEL).unwrap();
        f.flush().unwrap();
        assert!(run(f.path().to_path_buf(), &RenderOptions::default(), false).is_ok());
    }

    #[test]
    fn test_run_rejects_bad_json() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        f.flush().unwrap();
        assert!(run(f.path().to_path_buf(), &RenderOptions::default(), false).is_err());
    }
}

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tourplan::v1::TestModel;

pub fn run(input: PathBuf) -> Result<()> {
    let content = crate::read_input(&input)?;
    println!("{}", check(&content).with_context(|| format!("Invalid model in {:?}", input))?);
    Ok(())
}

fn check(content: &str) -> Result<String> {
    let model = TestModel::from_json(content)?;
    let errors = model.field_errors();
    if !errors.is_empty() {
        let fields: Vec<String> = errors
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        bail!("{}", fields.join("; "));
    }
    Ok(format!(
        "Valid: {} transitions, start={}, end={}",
        model.edges.len(),
        model.start,
        model.end
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_check_valid_model() {
        let summary = check(
            r#"{"start": "a", "end": "b", "edges": [
                {"from": "a", "to": "b"},
                {"from": "b", "to": "a"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(summary, "Valid: 2 transitions, start=a, end=b");
    }

    #[test]
    fn test_check_lists_invalid_fields() {
        let err = check(r#"{"start": "a", "edges": [{"from": "a"}]}"#).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("edges-0-to_node: This field is required."));
        assert!(message.contains("end: This field is required."));
    }

    #[test]
    fn test_run_valid_file() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"start": "a", "end": "a", "edges": [{{"from": "a", "to": "a"}}]}}"#
        )
        .unwrap();
        f.flush().unwrap();
        assert!(run(f.path().to_path_buf()).is_ok());
    }

    #[test]
    fn test_run_invalid_json() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        f.flush().unwrap();
        assert!(run(f.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_run_nonexistent_file() {
        assert!(run(PathBuf::from("/nonexistent/file.json")).is_err());
    }
}

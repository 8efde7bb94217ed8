use anyhow::{Result, bail};
use std::path::PathBuf;
use tourplan::v1::{Response, TestModel, WalkStrategy};

pub fn run(input: PathBuf, verbose: bool, strategy: WalkStrategy, pretty: bool) -> Result<()> {
    let content = crate::read_input(&input)?;
    let response = respond(&content, verbose, strategy);

    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", json);

    if !response.success {
        match &response.error {
            Some(error) => bail!("{}", error),
            None => bail!("Invalid model in {:?}", input),
        }
    }
    Ok(())
}

/// Parse and plan one model document; every failure becomes an error envelope.
fn respond(content: &str, verbose: bool, strategy: WalkStrategy) -> Response {
    let mut model = match TestModel::from_json(content) {
        Ok(model) => model,
        Err(err) => return Response::failure(&err),
    };
    model.verbose |= verbose;

    log::info!(
        "plan: model transitions={} start={} end={}",
        model.edges.len(),
        model.start,
        model.end
    );
    let response = Response::for_model(&model, strategy);
    log::info!(
        "plan: done success={} paths={}",
        response.success,
        response.path_count()
    );
    response
}

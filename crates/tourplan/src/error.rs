pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    #[error("node not contained in graph: {0}")]
    UnknownNode(String),

    #[error("no tour exists: {reason} (node {node})")]
    InfeasibleGraph { node: String, reason: String },

    #[error("tour construction failed: walked {walked} of {total} edges")]
    TourConstruction { walked: usize, total: usize },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_graph(message: impl Into<String>) -> Self {
        Self::InvalidGraph(message.into())
    }

    pub fn unknown_node(node: impl ToString) -> Self {
        Self::UnknownNode(node.to_string())
    }

    pub fn infeasible(node: impl ToString, reason: impl Into<String>) -> Self {
        Self::InfeasibleGraph {
            node: node.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("type of {owner}: {source}")]
    Type {
        owner: String,
        #[source]
        source: strata_api::ParseTypeError,
    },

    #[error("row {row}, value {index}: {detail}")]
    Value { row: usize, index: usize, detail: String },

    #[error("{0}")]
    Row(#[from] strata_api::RowError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

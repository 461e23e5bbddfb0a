use viewcatalog::CatalogError;

#[derive(Debug, thiserror::Error)]
pub enum SchemaViewsError {
    /// Scanner used before `initialize`, or initialized twice.
    #[error("Scanner not initialized: {0}")]
    NotInitialized(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Output requested a column this table doesn't have.
    #[error("Unknown column index {index} for table with {num_columns} columns")]
    UnknownColumn { index: usize, num_columns: usize },

    #[error(transparent)]
    CatalogUnavailable(CatalogError),

    #[error(transparent)]
    AuthorizationError(CatalogError),
}

impl From<CatalogError> for SchemaViewsError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Unauthorized { .. } => Self::AuthorizationError(err),
            CatalogError::InvalidPattern { .. } => Self::InvalidArgument(err.to_string()),
            CatalogError::Unavailable(_) | CatalogError::Load(_) => Self::CatalogUnavailable(err),
        }
    }
}

pub type Result<T, E = SchemaViewsError> = std::result::Result<T, E>;

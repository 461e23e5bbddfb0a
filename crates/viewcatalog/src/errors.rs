#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Transport or backend failure while talking to the catalog.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// The principal is not allowed to see the requested objects.
    #[error("Access denied for {principal}: {reason}")]
    Unauthorized { principal: String, reason: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Failed to load catalog: {0}")]
    Load(String),
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

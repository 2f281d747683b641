//! Ledger error taxonomy.

/// Errors surfaced by the ledger store and the balance engine.
#[derive(Debug)]
pub enum LedgerError {
    /// Invalid input, rejected before any store interaction.
    Validation(String),
    /// Backing store unreachable or a query failed. Not retried.
    DataAccess(rusqlite::Error),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::Validation(msg) => write!(f, "validation error: {}", msg),
            LedgerError::DataAccess(e) => write!(f, "data access error: {}", e),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Validation(_) => None,
            LedgerError::DataAccess(e) => Some(e),
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::DataAccess(e)
    }
}

//! Error types for relframe.

use thiserror::Error;

/// The main error type for relframe operations.
///
/// Every variant carries enough context for the caller to fix the expression
/// or declaration that triggered it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed filter expression text
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    /// A referenced column does not exist on the implied table
    #[error("Unknown column '{column}' (searched {table})")]
    UnknownColumn { column: String, table: String },

    /// A qualifier names a relation that does not exist
    #[error("Unknown relation '{relation}' on table '{table}'")]
    UnknownRelation { relation: String, table: String },

    /// An unqualified column matches more than one reachable table
    #[error(
        "Column '{column}' is ambiguous, it exists in tables [{}]; qualify it as <relation>.{column}",
        .candidates.join(", ")
    )]
    AmbiguousColumn {
        column: String,
        candidates: Vec<String>,
    },

    /// The planner found no relation path to a table the resolver returned
    #[error("Table '{table}' is not reachable from the home table")]
    UnreachableTable { table: String },

    /// A relation with this name already exists on the table
    #[error("Relation '{relation}' is already declared on table '{table}'")]
    DuplicateRelationName { relation: String, table: String },

    /// A table with this name is already registered
    #[error("Table '{0}' is already registered")]
    DuplicateTableName(String),

    /// A table id that is not registered in the catalog
    #[error("Unknown table id {0}")]
    UnknownTable(usize),

    /// Two handles from different workspaces were combined
    #[error("Tables belong to different workspaces")]
    ForeignTable,

    /// Malformed table construction or projection
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Input rejected before parsing
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Joining would materialize more rows than the configured limit
    #[error("Join frame of {rows} rows exceeds the limit of {limit}")]
    FrameTooLarge { rows: usize, limit: usize },

    /// A lock was poisoned (internal error)
    #[error("Lock poisoned")]
    LockPoisoned,
}

impl Error {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Error::SyntaxError {
            position,
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for relframe operations.
pub type Result<T> = std::result::Result<T, Error>;

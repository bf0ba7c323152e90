//! Categorized error taxonomy for the generator.
//!
//! Every anomaly during generation is fatal to the overall run, but the
//! categories below stay typed so a caller can inspect *why* instead of just
//! catching a single opaque failure. Only `sqlch-cli` converts one of these
//! into a printed diagnostic and a process exit; nothing below this
//! boundary calls `process::exit`.

use thiserror::Error;

/// A directive, SQL, or semantic anomaly encountered while building the IR.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("directive `{directive}` failed: {message}")]
    Directive { directive: String, message: String },

    #[error("unable to prepare statement: {sql} [{message}]")]
    Sql { sql: String, message: String },

    #[error(
        "authorizer invariant violated while preparing statement: {sql} [{message}]"
    )]
    AuthorizerInvariant { sql: String, message: String },

    #[error("unknown type: {sql_type}")]
    UnknownType { sql_type: String },

    #[error("unable to get type for variable: {name}")]
    UnresolvedVariable { name: String },

    #[error("unable to get create statement for table: {table}")]
    UnknownTable { table: String },

    #[error("unable to get type for column: {column}, table: {table}")]
    UnknownColumn { table: String, column: String },
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Non-fatal anomalies the builder records but does not abort on (an
/// unrecognized directive is a warning, not a failure), plus the
/// retained-but-surfaced prefix-matching ambiguity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnknownDirective { directive: String },
    AmbiguousPrefixMatch {
        variable: String,
        chosen_column: String,
        other_candidates: Vec<String>,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDirective { directive } => {
                write!(f, "unhandled metacommand: [{directive}]")
            }
            Self::AmbiguousPrefixMatch {
                variable,
                chosen_column,
                other_candidates,
            } => write!(
                f,
                "variable `{variable}` prefix-matches column `{chosen_column}` and also {:?}; keeping first match",
                other_candidates
            ),
        }
    }
}

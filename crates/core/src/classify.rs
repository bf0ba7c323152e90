//! The seam between the Module Builder (this crate) and the SQLite
//! Introspector (`sqlch-introspect`). Core defines the trait; the
//! introspector crate implements it.

use crate::error::CoreResult;
use crate::ir::Action;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    /// Originating table, recovered from driver column-table-name metadata;
    /// empty if the driver could not report it.
    pub table: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub is_pk: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// `None` when the authorizer never classified the statement (the
    /// "anything else" / bare READ-PRAGMA-FUNCTION-REINDEX case) — the
    /// Module Builder ignores such statements.
    pub action: Option<Action>,
    pub primary_table: String,
    pub result_columns: Vec<ResultColumn>,
    pub bound_params: Vec<String>,
}

/// Implemented by the SQLite-backed Introspector. Kept as a trait here so
/// `sqlch-core` never depends on `rusqlite`.
pub trait SqlClassifier {
    /// Prepares `sql` against the live schema, binds `1` to `limit_param`/
    /// `offset_param` if present, single steps it, and classifies the
    /// result.
    fn classify(
        &mut self,
        sql: &str,
        limit_param: Option<&str>,
        offset_param: Option<&str>,
    ) -> CoreResult<Classification>;

    /// `PRAGMA table_info(tname)` follow-up run after a CREATE.
    fn table_columns(&mut self, tname: &str) -> CoreResult<Vec<ColumnInfo>>;
}

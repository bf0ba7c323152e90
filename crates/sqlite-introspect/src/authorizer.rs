//! The authorizer guard table. SQLite calls this hook once per object
//! touched while `Connection::prepare` compiles a statement; we use it
//! purely for classification, never to deny anything — every arm ends by
//! returning `Authorization::Allow`. Violations of the expected
//! last-actioncode transitions are recorded as a recoverable
//! `CoreError::AuthorizerInvariant` instead of asserted away.

use std::sync::{Arc, Mutex};

use rusqlite::hooks::{AuthAction, AuthContext, Authorization};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum LastAction {
    #[default]
    None,
    CreateTable,
    CreateIndex,
    Insert,
    Update,
    Delete,
    Select,
}

impl LastAction {
    /// Statements for which the Module Builder never supplies a pending
    /// LIMIT/OFFSET bind — the bind only applies to non-DDL statements.
    pub(crate) fn is_ddl(self) -> bool {
        matches!(self, LastAction::CreateTable | LastAction::CreateIndex)
    }

    pub(crate) fn to_core_action(self) -> Option<sqlch_core::Action> {
        match self {
            LastAction::None => None,
            LastAction::CreateTable => Some(sqlch_core::Action::CreateTable),
            LastAction::CreateIndex => Some(sqlch_core::Action::CreateIndex),
            LastAction::Insert => Some(sqlch_core::Action::Insert),
            LastAction::Update => Some(sqlch_core::Action::Update),
            LastAction::Delete => Some(sqlch_core::Action::Delete),
            LastAction::Select => Some(sqlch_core::Action::Select),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct AuthorizerState {
    pub(crate) last_action: LastAction,
    pub(crate) primary_table: String,
    pub(crate) violation: Option<String>,
}

impl AuthorizerState {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    fn record_violation(&mut self, message: impl Into<String>) {
        if self.violation.is_none() {
            self.violation = Some(message.into());
        }
    }
}

const SYSTEM_PREFIX: &str = "sqlite_";

/// Installed via `Connection::authorizer`; owns a clone of the shared state
/// so the `Introspector` can reset it before each `classify()` call without
/// re-registering the hook.
pub(crate) fn authorize(state: &Arc<Mutex<AuthorizerState>>, ctx: AuthContext<'_>) -> Authorization {
    let mut st = state.lock().expect("authorizer state mutex poisoned");
    match ctx.action {
        AuthAction::CreateTable { table_name } => {
            if st.last_action != LastAction::None {
                st.record_violation("CREATE TABLE seen after another statement was already classified");
            } else {
                st.last_action = LastAction::CreateTable;
                st.primary_table = table_name.to_string();
            }
        }
        AuthAction::CreateIndex { index_name, .. } => {
            if !index_name.starts_with(SYSTEM_PREFIX) {
                if !matches!(st.last_action, LastAction::None | LastAction::CreateTable) {
                    st.record_violation("CREATE INDEX seen after a non-CREATE statement was already classified");
                } else {
                    st.last_action = LastAction::CreateIndex;
                    st.primary_table = index_name.to_string();
                }
            }
        }
        AuthAction::Insert { table_name } => {
            if !table_name.starts_with(SYSTEM_PREFIX) {
                if st.last_action != LastAction::None {
                    st.record_violation("INSERT seen after another statement was already classified");
                } else {
                    st.last_action = LastAction::Insert;
                    st.primary_table = table_name.to_string();
                }
            }
        }
        AuthAction::Update { table_name, .. } => {
            if !table_name.starts_with(SYSTEM_PREFIX) {
                if !matches!(st.last_action, LastAction::None | LastAction::Update) {
                    st.record_violation("UPDATE seen after a different statement was already classified");
                } else {
                    st.last_action = LastAction::Update;
                    st.primary_table = table_name.to_string();
                }
            }
        }
        AuthAction::Delete { table_name } => {
            if !table_name.starts_with(SYSTEM_PREFIX) {
                if st.last_action != LastAction::None {
                    st.record_violation("DELETE seen after another statement was already classified");
                } else {
                    st.last_action = LastAction::Delete;
                    st.primary_table = table_name.to_string();
                }
            }
        }
        AuthAction::Select => {
            if st.last_action != LastAction::None {
                st.record_violation("SELECT seen after another statement was already classified");
            } else {
                st.last_action = LastAction::Select;
            }
        }
        AuthAction::Read { .. } | AuthAction::Pragma { .. } | AuthAction::Function { .. } | AuthAction::Reindex { .. } => {
            // These ride along with whatever statement is being classified
            // and never change `last_actioncode` themselves.
        }
        _ => {
            if st.last_action != LastAction::None {
                st.record_violation("unexpected authorizer callback after a statement was already classified");
            }
        }
    }
    Authorization::Allow
}

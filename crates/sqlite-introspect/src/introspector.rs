//! `Introspector`: a live, schema-only SQLite connection implementing
//! `sqlch_core::SqlClassifier`. Every DDL and DML statement the Module
//! Builder feeds it is actually prepared against an in-memory database
//! seeded by the prior CREATE TABLE/INDEX statements in the same source
//! file — this is how column types, primary keys, and result-column table
//! origins get recovered without a hand-rolled SQL parser.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use sqlch_core::{Classification, ColumnInfo, CoreError, CoreResult, ResultColumn, SqlClassifier};

use crate::authorizer::{authorize, AuthorizerState};

pub struct Introspector {
    conn: Connection,
    state: Arc<Mutex<AuthorizerState>>,
}

impl Introspector {
    pub fn new() -> CoreResult<Self> {
        let mut conn = Connection::open_in_memory().map_err(|e| CoreError::Sql {
            sql: "<open in-memory database>".to_string(),
            message: e.to_string(),
        })?;

        let state = Arc::new(Mutex::new(AuthorizerState::default()));
        let hook_state = Arc::clone(&state);
        conn.authorizer(Some(move |ctx| authorize(&hook_state, ctx)));

        Ok(Self { conn, state })
    }

    fn bind_one(stmt: &mut rusqlite::Statement<'_>, sql: &str, name: &str) -> CoreResult<()> {
        let idx = stmt
            .parameter_index(name)
            .map_err(|e| CoreError::Sql {
                sql: sql.to_string(),
                message: e.to_string(),
            })?
            .ok_or_else(|| CoreError::Sql {
                sql: sql.to_string(),
                message: format!("no bound parameter named `{name}` to apply LIMIT/OFFSET to"),
            })?;
        stmt.raw_bind_parameter(idx, 1i64).map_err(|e| CoreError::Sql {
            sql: sql.to_string(),
            message: e.to_string(),
        })
    }
}

impl SqlClassifier for Introspector {
    fn classify(
        &mut self,
        sql: &str,
        limit_param: Option<&str>,
        offset_param: Option<&str>,
    ) -> CoreResult<Classification> {
        self.state.lock().expect("authorizer state mutex poisoned").reset();

        let mut stmt = self.conn.prepare(sql).map_err(|e| CoreError::Sql {
            sql: sql.to_string(),
            message: e.to_string(),
        })?;

        let (action, primary_table) = {
            let st = self.state.lock().expect("authorizer state mutex poisoned");
            if let Some(message) = &st.violation {
                return Err(CoreError::AuthorizerInvariant {
                    sql: sql.to_string(),
                    message: message.clone(),
                });
            }
            (st.last_action, st.primary_table.clone())
        };

        if !action.is_ddl() {
            if let Some(name) = limit_param {
                Self::bind_one(&mut stmt, sql, name)?;
            }
            if let Some(name) = offset_param {
                Self::bind_one(&mut stmt, sql, name)?;
            }
        }

        {
            let mut rows = stmt.raw_query();
            rows.next().map_err(|e| CoreError::Sql {
                sql: sql.to_string(),
                message: e.to_string(),
            })?;
        }

        let column_count = stmt.column_count();
        let mut result_columns = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let name = stmt
                .column_name(i)
                .map_err(|e| CoreError::Sql {
                    sql: sql.to_string(),
                    message: e.to_string(),
                })?
                .to_string();
            let table = stmt.column_table_name(i).unwrap_or_default().to_string();
            result_columns.push(ResultColumn { table, name });
        }

        let param_count = stmt.parameter_count();
        let mut bound_params = Vec::with_capacity(param_count);
        for i in 1..=param_count {
            if let Some(name) = stmt.parameter_name(i) {
                bound_params.push(name.trim_start_matches(':').to_string());
            }
        }

        Ok(Classification {
            action: action.to_core_action(),
            primary_table,
            result_columns,
            bound_params,
        })
    }

    fn table_columns(&mut self, tname: &str) -> CoreResult<Vec<ColumnInfo>> {
        let sql = format!("PRAGMA table_info('{tname}')");
        let mut stmt = self.conn.prepare(&sql).map_err(|e| CoreError::Sql {
            sql: sql.clone(),
            message: e.to_string(),
        })?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get::<_, String>(1)?,
                    declared_type: row.get::<_, String>(2)?,
                    is_pk: row.get::<_, i64>(5)? != 0,
                })
            })
            .map_err(|e| CoreError::Sql {
                sql: sql.clone(),
                message: e.to_string(),
            })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| CoreError::Sql {
                sql: sql.clone(),
                message: e.to_string(),
            })?);
        }
        Ok(out)
    }
}

pub mod builder;
pub mod classify;
pub mod error;
pub mod ir;
pub mod lex;
pub mod types;

pub use builder::ModuleBuilder;
pub use classify::{Classification, ColumnInfo, ResultColumn, SqlClassifier};
pub use error::{CoreError, CoreResult, Diagnostic};
pub use ir::{
    Action, Column, Database, EnumType, Interface, Module, Statement, Variable,
    DEFAULT_PK_TYPE, MULTI_TABLE_SENTINEL,
};
pub use lex::{Lexer, Line, LineKind};
pub use types::TypeRegistry;

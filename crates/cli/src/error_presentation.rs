//! CLI-boundary error taxonomy: the one place a categorized error becomes a
//! printed diagnostic and a process exit instead of propagating with `?`.
//! Every anomaly below this module is a `sqlch_core::CoreError`; this module
//! only adds the I/O and usage failures specific to the CLI shell around it,
//! then renders everything to a single `Error:`-prefixed stdout line.

use std::path::PathBuf;

use sqlch_core::CoreError;
use thiserror::Error;

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("no input files")]
    NoInputFiles,

    #[error("unable to read file:{path}:{source}")]
    ReadFile { path: PathBuf, source: std::io::Error },

    #[error("unable to open file:{path}:{source}")]
    WriteFile { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Category tag on the `Error:` line, so a build script scraping stdout
/// can still tell anomaly classes apart.
fn category(error: &CliError) -> &'static str {
    match error {
        CliError::NoInputFiles => "usage",
        CliError::ReadFile { .. } | CliError::WriteFile { .. } => "io",
        CliError::Core(CoreError::Directive { .. }) => "directive",
        CliError::Core(CoreError::Sql { .. } | CoreError::AuthorizerInvariant { .. }) => "sql",
        CliError::Core(
            CoreError::UnknownType { .. }
            | CoreError::UnresolvedVariable { .. }
            | CoreError::UnknownTable { .. }
            | CoreError::UnknownColumn { .. },
        ) => "semantic",
    }
}

/// Printed to **stdout**, prefixed `Error:`, exactly this shape.
pub(crate) fn render_runtime_error(error: &CliError) -> String {
    format!("Error:[{}] {error}", category(error))
}

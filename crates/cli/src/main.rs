//! `sqlch-gen`: command-line front end wiring the Lexer/Module Builder
//! (`sqlch-core`), the live SQLite Introspector (`sqlch-introspect`), and the
//! Emitter (`sqlch-emitter`) into a single run.

mod error_presentation;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};
use sqlch_core::ModuleBuilder;
use sqlch_emitter::Emitter;
use sqlch_introspect::Introspector;

use error_presentation::{render_runtime_error, CliError, CliResult};

/// Generates a C++ client-binding header/source pair from an annotated SQL
/// schema file.
#[derive(Parser, Debug)]
#[command(name = "sqlch-gen", version, about)]
struct Cli {
    /// Directory the generated `<module>.hpp`/`.cpp` pair is written into.
    #[arg(short = 'd', long = "outdir", default_value = ".")]
    outdir: PathBuf,

    /// Annotated SQL schema file. Only the last positional given is used as
    /// input; earlier ones are accepted but ignored, matching the original
    /// tool's `argv` handling. Not marked `required`: a missing input is a
    /// categorized `CliError::NoInputFiles`, reported like every other
    /// anomaly (`Error:` on stdout, exit 1), not a clap usage failure on
    /// stderr with exit 2.
    #[arg(trailing_var_arg = true)]
    input: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{}", render_runtime_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> CliResult<()> {
    let input = cli.input.last().ok_or(CliError::NoInputFiles)?;
    for extra in &cli.input[..cli.input.len() - 1] {
        debug!("ignoring extra positional argument: {}", extra.display());
    }

    let module_name = module_name(input);
    info!("processing: {}", input.display());

    let source = fs::read_to_string(input).map_err(|e| CliError::ReadFile {
        path: input.clone(),
        source: e,
    })?;

    let mut builder = ModuleBuilder::new(module_name.clone());
    let mut introspector = Introspector::new()?;
    builder.process(&source, &mut introspector)?;
    let (module, diagnostics) = builder.finish();
    for d in &diagnostics {
        log::warn!("{d}");
    }

    let artifacts = Emitter::new(&module).emit();

    let hpp_path = cli.outdir.join(format!("{module_name}.hpp"));
    let cpp_path = cli.outdir.join(format!("{module_name}.cpp"));
    println!("Generating:[{}] and [{}]", hpp_path.display(), cpp_path.display());

    fs::write(&hpp_path, artifacts.header).map_err(|e| CliError::WriteFile {
        path: hpp_path.clone(),
        source: e,
    })?;
    fs::write(&cpp_path, artifacts.source).map_err(|e| CliError::WriteFile {
        path: cpp_path.clone(),
        source: e,
    })?;

    Ok(())
}

/// Strips any directory prefix and the final extension.
fn module_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_name_strips_directory_and_extension() {
        assert_eq!(module_name(Path::new("schema/auth.sqlch")), "auth");
        assert_eq!(module_name(Path::new("auth.sql")), "auth");
        assert_eq!(module_name(Path::new("/abs/path/to/db.schema.sql")), "db.schema");
    }
}

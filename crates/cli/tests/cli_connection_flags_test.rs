//! Argument-shape behavior for `sqlch-gen`'s single `-d/--outdir` flag plus
//! its trailing-positional-input handling: only the last positional given
//! is treated as the input file, as if each one overwrote a single
//! "current file" slot.

use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn run_sqlch_gen(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_sqlch-gen"))
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("failed to run sqlch-gen: {error}"))
}

const SCHEMA: &str = "---DEFINE DATABASE D; CREATE TABLE T(a INTEGER PRIMARY KEY);";

#[test]
fn default_outdir_is_the_current_directory() {
    let dir = tempdir().unwrap();
    let schema_path = dir.path().join("t.sqlch");
    fs::write(&schema_path, SCHEMA).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_sqlch-gen"))
        .arg(&schema_path)
        .current_dir(dir.path())
        .output()
        .unwrap_or_else(|error| panic!("failed to run sqlch-gen: {error}"));

    assert_eq!(output.status.code(), Some(0));
    assert!(dir.path().join("t.hpp").exists());
    assert!(dir.path().join("t.cpp").exists());
}

#[test]
fn short_outdir_flag_places_output_there() {
    let dir = tempdir().unwrap();
    let schema_path = dir.path().join("t.sqlch");
    fs::write(&schema_path, SCHEMA).unwrap();
    let outdir = dir.path().join("out");
    fs::create_dir(&outdir).unwrap();

    let output = run_sqlch_gen(&[
        "-d",
        outdir.to_str().unwrap(),
        schema_path.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(outdir.join("t.hpp").exists());
}

#[test]
fn long_outdir_flag_places_output_there() {
    let dir = tempdir().unwrap();
    let schema_path = dir.path().join("t.sqlch");
    fs::write(&schema_path, SCHEMA).unwrap();
    let outdir = dir.path().join("out-long");
    fs::create_dir(&outdir).unwrap();

    let output = run_sqlch_gen(&[
        "--outdir",
        outdir.to_str().unwrap(),
        schema_path.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert!(outdir.join("t.cpp").exists());
}

#[test]
fn only_the_last_positional_argument_is_used_as_input() {
    let dir = tempdir().unwrap();
    let decoy_path = dir.path().join("decoy.sqlch");
    fs::write(&decoy_path, "this is not valid SQL and must never be read").unwrap();
    let real_path = dir.path().join("real.sqlch");
    fs::write(&real_path, SCHEMA).unwrap();

    let output = run_sqlch_gen(&[
        "-d",
        dir.path().to_str().unwrap(),
        decoy_path.to_str().unwrap(),
        real_path.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(dir.path().join("real.hpp").exists());
    assert!(!dir.path().join("decoy.hpp").exists());
}

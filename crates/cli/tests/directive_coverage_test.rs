//! Coverage for directives and statement kinds not already covered by
//! `cli_shape_test.rs`: `---ENUM`, CREATE INDEX passthrough, and
//! UPDATE/DELETE emission.

use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn run_sqlch_gen(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_sqlch-gen"))
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("failed to run sqlch-gen: {error}"))
}

#[test]
fn enum_directive_emits_enum_class_and_to_string() {
    let dir = tempdir().unwrap();
    let schema_path = dir.path().join("e.sqlch");
    fs::write(
        &schema_path,
        "---ENUM Color ( RED GREEN BLUE );\n\
         ---DEFINE DATABASE D; CREATE TABLE T(a INTEGER PRIMARY KEY);\n",
    )
    .unwrap();

    let output = run_sqlch_gen(&[
        "-d",
        dir.path().to_str().unwrap(),
        schema_path.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let header = fs::read_to_string(dir.path().join("e.hpp")).unwrap();
    let source = fs::read_to_string(dir.path().join("e.cpp")).unwrap();
    assert!(header.contains("enum class Color {"));
    assert!(header.contains("RED"));
    assert!(header.contains("std::string to_string(const Color& val);"));
    assert!(source.contains("case Color::RED: return \"RED\";"));
}

#[test]
fn create_index_is_emitted_but_does_not_become_a_struct_or_method() {
    let dir = tempdir().unwrap();
    let schema_path = dir.path().join("idx.sqlch");
    fs::write(
        &schema_path,
        "---DEFINE DATABASE D;\n\
         CREATE TABLE T(a INTEGER PRIMARY KEY, b TEXT);\n\
         CREATE INDEX idx_t_b ON T(b);\n",
    )
    .unwrap();

    let output = run_sqlch_gen(&[
        "-d",
        dir.path().to_str().unwrap(),
        schema_path.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let source = fs::read_to_string(dir.path().join("idx.cpp")).unwrap();
    assert!(source.contains("db.exec(createT_s());"));
    assert!(!source.contains("struct idx_t_b"));
}

#[test]
fn update_and_delete_statements_emit_void_methods() {
    let dir = tempdir().unwrap();
    let schema_path = dir.path().join("ud.sqlch");
    fs::write(
        &schema_path,
        "---DEFINE DATABASE D;\n\
         CREATE TABLE T(id INTEGER PRIMARY KEY, v TEXT);\n\
         ---DEFINE INTERFACE RW;\n\
         UPDATE T SET v = :v WHERE id = :id;\n\
         DELETE FROM T WHERE id = :id;\n",
    )
    .unwrap();

    let output = run_sqlch_gen(&[
        "-d",
        dir.path().to_str().unwrap(),
        schema_path.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let header = fs::read_to_string(dir.path().join("ud.hpp")).unwrap();
    let source = fs::read_to_string(dir.path().join("ud.cpp")).unwrap();
    assert!(header.contains("void updateT"), "expected an update method:\n{header}");
    assert!(header.contains("void deleteT"), "expected a delete method:\n{header}");
    assert!(source.contains(".xdelete();"));
}

//! Emitter: renders the generated header/source pair from a frozen `Module`.
//! Everything here is text assembly — no validation happens at this layer,
//! since the Module Builder already guaranteed the IR is internally
//! consistent.

mod base;
mod iface;
mod stmt;

use std::fmt::Write as _;

use log::info;
use sqlch_core::Module;

/// The generated header (`.hpp`) and source (`.cpp`) text, keyed to the
/// module's chosen output basename by the caller.
pub struct Artifacts {
    pub header: String,
    pub source: String,
}

pub struct Emitter<'a> {
    module: &'a Module,
}

impl<'a> Emitter<'a> {
    pub fn new(module: &'a Module) -> Self {
        Self { module }
    }

    pub fn emit(&self) -> Artifacts {
        info!("emitting bindings for module `{}`", self.module.name);
        let module = self.module;
        let mut header = String::new();
        let mut source = String::new();

        self.emit_prelude(&mut header, &mut source);
        base::emit_declarations(module, &mut header);

        let ns = self.namespace_prefix();
        self.open_namespace(&mut header);
        self.emit_enums(&ns, &mut header);

        base::emit_definitions(module, &mut source);
        self.emit_enum_definitions(&ns, &mut source);

        for db in &module.databases {
            for i in &db.interfaces {
                iface::emit_forward_decl(i, &mut header);
            }
        }
        for db in &module.databases {
            for i in &db.interfaces {
                iface::emit_interface(module, db, i, &ns, &mut header, &mut source);
            }
        }

        if let Some(dec_sql) = &module.dec_sql {
            writeln!(header, "  std::string {dec_sql}(const std::string& sql);").unwrap();
        }
        writeln!(header).unwrap();

        self.close_namespace(&mut header);

        writeln!(header, "{}", module.hcode).unwrap();
        writeln!(header).unwrap();

        Artifacts { header, source }
    }

    fn emit_prelude(&self, header: &mut String, source: &mut String) {
        writeln!(header, "#pragma once").unwrap();
        writeln!(header).unwrap();
        writeln!(header, "#include <string>").unwrap();
        writeln!(header, "#include <vector>").unwrap();
        writeln!(header, "#include <sqlite3.h>").unwrap();
        for inc in &self.module.include_list {
            writeln!(header, "#include \"{inc}\"").unwrap();
        }
        writeln!(header).unwrap();

        writeln!(source, "#include <iostream>").unwrap();
        for imp in &self.module.import_list {
            writeln!(source, "#include \"{imp}\"").unwrap();
        }
        writeln!(source, "#include \"{}.hpp\"", self.module.name).unwrap();
        writeln!(source).unwrap();
    }

    /// Fully-qualified namespace prefix (e.g. `"a::b::"`), empty if the
    /// module declares no namespace.
    fn namespace_prefix(&self) -> String {
        if self.module.namespace.is_empty() {
            String::new()
        } else {
            format!("{}::", self.module.namespace.join("::"))
        }
    }

    fn open_namespace(&self, header: &mut String) {
        if self.module.namespace.is_empty() {
            return;
        }
        for n in &self.module.namespace {
            write!(header, "namespace {n} {{ ").unwrap();
        }
        writeln!(header).unwrap();
    }

    fn close_namespace(&self, header: &mut String) {
        if self.module.namespace.is_empty() {
            return;
        }
        for _ in &self.module.namespace {
            write!(header, " }}").unwrap();
        }
        writeln!(header, " /* namespace {} */", self.module.namespace.join("::")).unwrap();
        writeln!(header).unwrap();
    }

    fn emit_enums(&self, _ns: &str, header: &mut String) {
        for e in &self.module.enums {
            writeln!(header, "  enum class {} {{", e.name).unwrap();
            let mut sep = " ";
            for v in &e.values {
                writeln!(header, "    {sep}{v}").unwrap();
                sep = ",";
            }
            writeln!(header, "  }}; // enum{}", e.name).unwrap();
            writeln!(header, "  std::string to_string(const {}& val);", e.name).unwrap();
            writeln!(header, "  inline std::ostream& operator<<(std::ostream& os, const {}& val) {{", e.name).unwrap();
            writeln!(header, "    os << to_string(val);").unwrap();
            writeln!(header, "    return os;").unwrap();
            writeln!(header, "  }}").unwrap();
        }
    }

    fn emit_enum_definitions(&self, ns: &str, source: &mut String) {
        for e in &self.module.enums {
            writeln!(source, "std::string {ns}to_string(const {}& val) {{", e.name).unwrap();
            writeln!(source, "  switch (val) {{").unwrap();
            for v in &e.values {
                writeln!(source, "    case {ns}{}::{v}: return \"{v}\";", e.name).unwrap();
            }
            writeln!(source, "  }}").unwrap();
            writeln!(
                source,
                "  return \"<UNKNOWN-ENUM:{}>:\" + std::to_string(static_cast<int>(val));",
                e.name
            )
            .unwrap();
            writeln!(source, "}}").unwrap();
            writeln!(source).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlch_core::{Action, Column, Statement, Variable};

    fn sample_module() -> Module {
        let mut module = Module::new("auth");
        module.add_database("Auth");
        let mut create = Statement::new(Action::CreateTable, "CREATE TABLE UserMaster(id INTEGER PRIMARY KEY, uname TEXT)".to_string());
        create.tname = "UserMaster".to_string();
        create.qname = "createUserMaster".to_string();
        create.columns.push(Column {
            tname: "UserMaster".to_string(),
            cname: "id".to_string(),
            stype: "INTEGER".to_string(),
            ctype: "int64_t".to_string(),
            ntype: "uint64_t".to_string(),
            is_pk: true,
        });
        create.columns.push(Column {
            tname: "UserMaster".to_string(),
            cname: "uname".to_string(),
            stype: "TEXT".to_string(),
            ctype: "std::string".to_string(),
            ntype: "std::string".to_string(),
            is_pk: false,
        });
        module.current_database_mut().db_interface_mut().statements.push(create);

        module.current_database_mut().add_interface("UserRW");
        let mut insert = Statement::new(Action::Insert, "INSERT INTO UserMaster(uname) VALUES(:uname)".to_string());
        insert.tname = "UserMaster".to_string();
        insert.qname = "insertUserMaster".to_string();
        insert.pktype = "uint64_t".to_string();
        insert.variables.push(Variable {
            name: "uname".to_string(),
            ctype: "std::string".to_string(),
            ntype: "std::string".to_string(),
        });
        module.current_database_mut().current_interface_mut().statements.push(insert);

        module
    }

    #[test]
    fn emits_includes_and_pragma_once() {
        let module = sample_module();
        let out = Emitter::new(&module).emit();
        assert!(out.header.starts_with("#pragma once"));
        assert!(out.header.contains("#include <sqlite3.h>"));
        assert!(out.source.contains("#include \"auth.hpp\""));
    }

    #[test]
    fn emits_create_table_struct_and_insert_method() {
        let module = sample_module();
        let out = Emitter::new(&module).emit();
        assert!(out.header.contains("struct UserMaster {"));
        assert!(out.header.contains("uint64_t id;"));
        assert!(out.header.contains("uint64_t insertUserMaster(const std::string& uname);"));
        assert!(out.source.contains("return insertUserMaster_.insert();"));
    }

    #[test]
    fn autoincrement_off_makes_insert_return_void() {
        let mut module = sample_module();
        module.is_autoincrement = false;
        let out = Emitter::new(&module).emit();
        assert!(out.header.contains("void insertUserMaster(const std::string& uname);"));
    }

    #[test]
    fn namespace_wraps_header_declarations() {
        let mut module = sample_module();
        module.namespace = vec!["app".to_string(), "db".to_string()];
        let out = Emitter::new(&module).emit();
        assert!(out.header.contains("namespace app { namespace db { "));
        assert!(out.header.contains("/* namespace app::db */"));
    }
}

//! Per-interface struct emission: the db-interface holds the `database`
//! value and one connection-pool member per client interface; each client
//! interface holds a `database&` reference, a statement slot per DML/SELECT
//! method, and `open()`/`create()` bodies.

use std::fmt::Write as _;

use sqlch_core::{Action, Database, Interface, Module};

use crate::stmt;

pub(crate) fn emit_forward_decl(iface: &Interface, header: &mut String) {
    if iface.is_db {
        return;
    }
    writeln!(header, "  struct {};", iface.name).unwrap();
}

pub(crate) fn emit_interface(
    module: &Module,
    db: &Database,
    iface: &Interface,
    ns: &str,
    header: &mut String,
    source: &mut String,
) {
    let base_ns = &module.generate_base_ns;

    writeln!(header, "  struct {} {{", iface.name).unwrap();
    if iface.is_db {
        writeln!(header, "    {base_ns}::database db;").unwrap();
        writeln!(header, "    std::string name;").unwrap();
    } else {
        writeln!(
            header,
            "    typedef {base_ns}::pool<{}, {}>::guard guard;",
            db.name, iface.name
        )
        .unwrap();
        writeln!(header, "    {}& db;", db.name).unwrap();
    }

    for s in &iface.statements {
        match s.action {
            Action::CreateTable => stmt::emit_create_table(s, header),
            Action::CreateIndex => {}
            Action::Insert | Action::Update => {
                stmt::emit_insert_or_update(module, &iface.name, s, ns, header, source)
            }
            Action::Delete => stmt::emit_delete(module, &iface.name, s, ns, header, source),
            Action::Select => stmt::emit_select(module, &iface.name, s, ns, header, source),
        }
    }

    if iface.is_db {
        writeln!(header, "    void create(const std::string& filename, const char* vfs = nullptr);").unwrap();
        writeln!(header, "    void openrw(const std::string& filename, const char* vfs = nullptr);").unwrap();
        writeln!(header, "    void openro(const std::string& filename, const char* vfs = nullptr);").unwrap();
    } else {
        writeln!(header, "    void open();").unwrap();
    }
    writeln!(header, "    inline {0}& operator=(const {0}&) = delete;", iface.name).unwrap();
    writeln!(header, "    inline {0}(const {0}&) = delete;", iface.name).unwrap();
    writeln!(header, "    inline {0}& operator=({0}&&) = delete;", iface.name).unwrap();
    writeln!(header, "    inline {0}({0}&&) = delete;", iface.name).unwrap();

    let client_ifaces: Vec<&Interface> = db.interfaces.iter().filter(|i| !i.is_db).collect();
    if iface.is_db {
        write!(header, "    inline {}()", iface.name).unwrap();
        let mut sep = ":";
        for ci in &client_ifaces {
            write!(header, "{sep}{}Pool(*this)", ci.name).unwrap();
            sep = ",";
        }
        writeln!(header, " {{}}").unwrap();
        for ci in &client_ifaces {
            writeln!(header, "    {base_ns}::pool<{}, {}> {}Pool;", iface.name, ci.name, ci.name).unwrap();
        }
    } else {
        write!(header, "    inline {}({}& d, const bool& doOpen = true) : db(d)", iface.name, db.name).unwrap();
        for s in &iface.statements {
            if !matches!(s.action, Action::CreateTable | Action::CreateIndex) {
                write!(header, ", {}_(db.db)", s.qname).unwrap();
            }
        }
        writeln!(header, " {{if (doOpen) {{open();}}}}").unwrap();
    }
    writeln!(header, "  }};").unwrap();
    writeln!(header).unwrap();

    for s in &iface.statements {
        stmt::emit_sql_helper(module, s, source);
    }

    if iface.is_db {
        writeln!(source, "void {ns}{}::create(const std::string& filename, const char* vfs) {{", iface.name).unwrap();
        writeln!(source, "  FILE* fp = ::fopen(filename.c_str(), \"r\");").unwrap();
        writeln!(source, "  if (fp) {{").unwrap();
        writeln!(source, "    ::fclose(fp);").unwrap();
        writeln!(source, "    ::remove(filename.c_str());").unwrap();
        writeln!(source, "  }}").unwrap();
        writeln!(source, "  db.create(filename, vfs);").unwrap();
        writeln!(source, "  db.exec(\"PRAGMA page_size = 4096;\");").unwrap();
        writeln!(source, "  {base_ns}::transaction t(db);").unwrap();
        for s in &iface.statements {
            if matches!(s.action, Action::CreateTable | Action::CreateIndex) {
                writeln!(source, "  db.exec({}_s());", s.qname).unwrap();
            }
        }
        writeln!(source, "  t.commit();").unwrap();
        writeln!(source, "  if (name.size() == 0) {{").unwrap();
        writeln!(source, "    name = filename;").unwrap();
        writeln!(source, "  }}").unwrap();
        writeln!(source, "}}").unwrap();
        writeln!(source).unwrap();

        for (method, call) in [("openrw", "openrw"), ("openro", "openro")] {
            writeln!(source, "void {ns}{}::{method}(const std::string& filename, const char* vfs) {{", iface.name).unwrap();
            writeln!(source, "  db.{call}(filename, vfs);").unwrap();
            writeln!(source, "  if (name.size() == 0) {{").unwrap();
            writeln!(source, "    name = filename;").unwrap();
            writeln!(source, "  }}").unwrap();
            writeln!(source, "}}").unwrap();
            writeln!(source).unwrap();
        }
    } else {
        writeln!(source, "void {ns}{}::open() {{", iface.name).unwrap();
        for s in &iface.statements {
            if !matches!(s.action, Action::CreateTable | Action::CreateIndex) {
                writeln!(source, "  {}_.open({}_s());", s.qname, s.qname).unwrap();
            }
        }
        writeln!(source, "}}").unwrap();
        writeln!(source).unwrap();
    }
    writeln!(source).unwrap();
}

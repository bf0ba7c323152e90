//! Per-statement emission: the nested CREATE TABLE record type, the
//! INSERT/UPDATE/DELETE/SELECT method signature+body pair, and the
//! `<qname>_s()` static SQL-text helper.

use std::fmt::Write as _;

use sqlch_core::{Module, Statement};

/// `const <ctype>` cast, or empty when the application type already matches
/// the storage type.
fn cast_prefix(ntype: &str, ctype: &str) -> String {
    if ntype == ctype {
        String::new()
    } else {
        format!("static_cast<{ctype}>")
    }
}

pub(crate) fn emit_create_table(stmt: &Statement, header: &mut String) {
    writeln!(header, "      struct {} {{", stmt.tname).unwrap();
    for c in &stmt.columns {
        writeln!(header, "        {} {};", c.ntype, c.cname).unwrap();
    }
    writeln!(header, "      }};").unwrap();
}

/// Shared by INSERT and UPDATE: both reset an `exstatement` slot, bind every
/// variable, and return `insert()`'s result.
pub(crate) fn emit_insert_or_update(
    module: &Module,
    iface_name: &str,
    stmt: &Statement,
    ns: &str,
    header: &mut String,
    source: &mut String,
) {
    let base_ns = &module.generate_base_ns;
    let ret = if module.is_autoincrement { stmt.pktype.as_str() } else { "void" };

    writeln!(header, "    {base_ns}::exstatement {}_;", stmt.qname).unwrap();
    write!(header, "    {ret} {}(", stmt.qname).unwrap();
    write_params(header, stmt);
    writeln!(header, ");").unwrap();
    writeln!(header).unwrap();

    write!(source, "{ret} {ns}{iface_name}::{}(", stmt.qname).unwrap();
    write_params(source, stmt);
    writeln!(source, ") {{").unwrap();
    writeln!(source, "  {}_.reset();", stmt.qname).unwrap();
    for v in &stmt.variables {
        let cast = cast_prefix(&v.ntype, &v.ctype);
        writeln!(
            source,
            "  {}_.setParam<{}>(\":{}\", {cast}({}));",
            stmt.qname, v.ctype, v.name, v.name
        )
        .unwrap();
    }
    writeln!(source, "  return {}_.insert();", stmt.qname).unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();
}

pub(crate) fn emit_delete(
    module: &Module,
    iface_name: &str,
    stmt: &Statement,
    ns: &str,
    header: &mut String,
    source: &mut String,
) {
    let base_ns = &module.generate_base_ns;

    writeln!(header, "    {base_ns}::exstatement {}_;", stmt.qname).unwrap();
    write!(header, "    void {}(", stmt.qname).unwrap();
    write_params(header, stmt);
    writeln!(header, ");").unwrap();
    writeln!(header).unwrap();

    write!(source, "void {ns}{iface_name}::{}(", stmt.qname).unwrap();
    write_params(source, stmt);
    writeln!(source, ") {{").unwrap();
    writeln!(source, "  {}_.reset();", stmt.qname).unwrap();
    for v in &stmt.variables {
        let cast = cast_prefix(&v.ntype, &v.ctype);
        writeln!(
            source,
            "  {}_.setParam<{}>(\":{}\", {cast}({}));",
            stmt.qname, v.ctype, v.name, v.name
        )
        .unwrap();
    }
    writeln!(source, "  {}_.xdelete();", stmt.qname).unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();
}

pub(crate) fn emit_select(
    module: &Module,
    iface_name: &str,
    stmt: &Statement,
    ns: &str,
    header: &mut String,
    source: &mut String,
) {
    let base_ns = &module.generate_base_ns;
    let multi_sourced = stmt.sname == sqlch_core::MULTI_TABLE_SENTINEL;
    let fqname = format!("{ns}{iface_name}::{}", stmt.qname);
    let rname = if multi_sourced {
        format!("{fqname}_c::row")
    } else {
        format!("{ns}{}", stmt.sname)
    };

    writeln!(header, "    struct {}_c : public {base_ns}::statement {{", stmt.qname).unwrap();
    writeln!(header, "      friend struct {iface_name};").unwrap();
    if multi_sourced {
        writeln!(header, "      struct row {{").unwrap();
        for c in &stmt.columns {
            writeln!(header, "        {} {};", c.ntype, c.cname).unwrap();
        }
        writeln!(header, "      }};").unwrap();
    }
    writeln!(header, "      inline {}_c({base_ns}::database& pdb) : statement(pdb) {{}}", stmt.qname).unwrap();
    writeln!(header, "    }};").unwrap();
    writeln!(header, "    {0}_c {0}_;", stmt.qname).unwrap();

    write!(header, "    std::vector<{rname}> {}(", stmt.qname).unwrap();
    write_params(header, stmt);
    writeln!(header, ");").unwrap();
    writeln!(header).unwrap();

    write!(source, "std::vector<{rname}> {fqname}(").unwrap();
    write_params(source, stmt);
    writeln!(source, ") {{").unwrap();
    writeln!(source, "  {base_ns}::guard lk(db.db);").unwrap();
    writeln!(source, "  {}_.reset();", stmt.qname).unwrap();
    for v in &stmt.variables {
        let cast = cast_prefix(&v.ntype, &v.ctype);
        writeln!(
            source,
            "  {}_.setParam<{}>(\":{}\", {cast}({}));",
            stmt.qname, v.ctype, v.name, v.name
        )
        .unwrap();
    }
    writeln!(source, "  std::vector<{rname}> rv;").unwrap();
    writeln!(source, "  while ({}_.next()) {{", stmt.qname).unwrap();
    writeln!(source, "    rv.push_back({rname}());").unwrap();
    writeln!(source, "    auto& s = rv.back();").unwrap();
    for (idx, c) in stmt.columns.iter().enumerate() {
        let cast = cast_prefix(&c.ctype, &c.ntype);
        writeln!(
            source,
            "    s.{} = {cast}({}_.getColumn<{}>({idx}));",
            c.cname, stmt.qname, c.ctype
        )
        .unwrap();
    }
    writeln!(source, "  }}").unwrap();
    writeln!(source, "  return rv;").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();
}

fn write_params(out: &mut String, stmt: &Statement) {
    let mut sep = "";
    for v in &stmt.variables {
        write!(out, "{sep}const {}& {}", v.ntype, v.name).unwrap();
        sep = ", ";
    }
}

/// `<qname>_s()` static SQL-text helper. Plain literal, line-broken at
/// CR/LF, unless `decSql` names a decryption function — then the bytes are
/// emitted as a byte array with the raw text in a comment.
pub(crate) fn emit_sql_helper(module: &Module, stmt: &Statement, source: &mut String) {
    writeln!(source, "static inline std::string {}_s() {{", stmt.qname).unwrap();
    match &module.dec_sql {
        None => {
            writeln!(source, "    return \"{}\";", escape_broken(&stmt.sql)).unwrap();
        }
        Some(dec_sql) => {
            writeln!(source, "/*").unwrap();
            writeln!(source, "    \"{}\"", escape_broken(&stmt.sql)).unwrap();
            writeln!(source, "*/").unwrap();
            writeln!(source, "    static const unsigned char arr[] = {{").unwrap();
            let bytes = stmt.sql.as_bytes();
            for chunk in bytes.chunks(8) {
                let line: String = chunk.iter().map(|b| format!("0x{b:02x}, ")).collect();
                writeln!(source, "      {line}").unwrap();
            }
            writeln!(source, "    }};").unwrap();
            let ns = &module.generate_base_ns;
            writeln!(
                source,
                "    return {ns}::{dec_sql}(std::string((const char*)arr, sizeof(arr)));"
            )
            .unwrap();
        }
    }
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();
}

/// Breaks `text` into `"..." "\r\n"`-style concatenated literals at CR/LF
/// boundaries.
fn escape_broken(text: &str) -> String {
    let mut out = String::new();
    let mut in_ws = false;
    for c in text.chars() {
        if c == '\r' || c == '\n' {
            if !in_ws {
                out.push_str("\\r\\n\"\n");
                in_ws = true;
            }
        } else {
            if in_ws {
                out.push_str("      \"");
                in_ws = false;
            }
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out
}

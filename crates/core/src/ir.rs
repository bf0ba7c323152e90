//! Intermediate representation. `Module` owns `Database`s owns `Interface`s
//! owns `Statement`s in a plain tree; there are no raw-pointer or `Rc`
//! back-references. Code that needs to find a `Statement`'s owning
//! `Interface`/`Database` threads the relevant index through its call
//! arguments instead of storing an inverse link.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreateTable,
    CreateIndex,
    Insert,
    Update,
    Delete,
    Select,
}

impl Action {
    pub fn verb(self) -> &'static str {
        match self {
            Action::CreateTable | Action::CreateIndex => "create",
            Action::Insert => "insert",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Select => "select",
        }
    }

    pub fn is_ddl(self) -> bool {
        matches!(self, Action::CreateTable | Action::CreateIndex)
    }
}

/// Sentinel `sname` value for a SELECT spanning more than one source table.
pub const MULTI_TABLE_SENTINEL: &str = "+";

/// Default application type for a primary key with no explicit `is_pk` column.
pub const DEFAULT_PK_TYPE: &str = "uint64_t";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub tname: String,
    pub cname: String,
    pub stype: String,
    pub ctype: String,
    pub ntype: String,
    pub is_pk: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub ctype: String,
    pub ntype: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub action: Action,
    /// Original SQL text, padded so `sql.len() % 8 == 0`; exists to
    /// cooperate with optional downstream encryption and is kept regardless
    /// of whether `decSql` is set.
    pub sql: String,
    pub tname: String,
    /// SELECT only: `db::table` if single-sourced, `"+"` if multi-sourced,
    /// empty otherwise.
    pub sname: String,
    pub columns: Vec<Column>,
    pub variables: Vec<Variable>,
    pub qname: String,
    pub pktype: String,
}

impl Statement {
    pub fn new(action: Action, sql: String) -> Self {
        let mut sql = sql;
        while sql.len() % 8 != 0 {
            sql.push(' ');
        }
        Self {
            action,
            sql,
            tname: String::new(),
            sname: String::new(),
            columns: Vec::new(),
            variables: Vec::new(),
            qname: String::new(),
            pktype: DEFAULT_PK_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub is_db: bool,
    pub statements: Vec<Statement>,
}

impl Interface {
    pub fn new(name: impl Into<String>, is_db: bool) -> Self {
        Self {
            name: name.into(),
            is_db,
            statements: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    pub name: String,
    pub interfaces: Vec<Interface>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        // The first interface is the distinguished db-interface.
        let name = name.into();
        Self {
            interfaces: vec![Interface::new(name.clone(), true)],
            name,
        }
    }

    pub fn db_interface(&self) -> &Interface {
        &self.interfaces[0]
    }

    pub fn db_interface_mut(&mut self) -> &mut Interface {
        &mut self.interfaces[0]
    }

    pub fn current_interface(&self) -> &Interface {
        self.interfaces.last().expect("database always has a db-interface")
    }

    pub fn current_interface_mut(&mut self) -> &mut Interface {
        self.interfaces
            .last_mut()
            .expect("database always has a db-interface")
    }

    pub fn add_interface(&mut self, name: impl Into<String>) {
        self.interfaces.push(Interface::new(name, false));
    }

    pub fn find_create_table(&self, tname: &str) -> Option<&Statement> {
        self.db_interface()
            .statements
            .iter()
            .find(|s| s.action == Action::CreateTable && s.tname == tname)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub include_list: Vec<String>,
    pub import_list: Vec<String>,
    pub namespace: Vec<String>,
    pub enums: Vec<EnumType>,
    pub hcode: String,
    pub scode: String,
    pub generate_base: bool,
    pub generate_base_ns: String,
    pub on_error: String,
    pub on_trace: String,
    pub on_open: String,
    pub on_opened: String,
    pub dec_sql: Option<String>,
    pub mutex_name: Option<String>,
    pub is_autoincrement: bool,
    pub databases: Vec<Database>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            include_list: Vec::new(),
            import_list: Vec::new(),
            namespace: Vec::new(),
            enums: Vec::new(),
            hcode: String::new(),
            scode: String::new(),
            generate_base: true,
            generate_base_ns: "sqlch".to_string(),
            on_error: "on_Error".to_string(),
            on_trace: String::new(),
            on_open: "on_Open".to_string(),
            on_opened: "on_Opened".to_string(),
            dec_sql: None,
            mutex_name: None,
            is_autoincrement: true,
            databases: Vec::new(),
        }
    }

    pub fn add_database(&mut self, name: impl Into<String>) {
        self.databases.push(Database::new(name));
    }

    pub fn current_database(&self) -> &Database {
        self.databases.last().expect("DEFINE DATABASE must precede statements")
    }

    pub fn current_database_mut(&mut self) -> &mut Database {
        self.databases
            .last_mut()
            .expect("DEFINE DATABASE must precede statements")
    }

    pub fn find_create_table(&self, tname: &str) -> Option<&Statement> {
        self.current_database().find_create_table(tname)
    }
}

//! The base runtime surface: `database`, `statement`/`exstatement`, `guard`,
//! `pool<DbT, ConnT>` with its nested RAII `pool::guard`, and `transaction`.
//! Only emitted when `module.generate_base` is set and wrapped in an
//! include-once guard so two generated headers can both be included from the
//! same translation unit.

use std::fmt::Write as _;

use sqlch_core::Module;

pub(crate) fn emit_declarations(module: &Module, header: &mut String) {
    if !module.generate_base {
        return;
    }
    let ns = &module.generate_base_ns;
    let insert_ret = if module.is_autoincrement { "uint64_t" } else { "void" };

    writeln!(header, "#if !defined(SQLCH_COMMON)").unwrap();
    writeln!(header, "#define SQLCH_COMMON 1").unwrap();
    writeln!(header, "namespace {ns} {{").unwrap();
    writeln!(header, "  std::string error(sqlite3* db);").unwrap();
    writeln!(header, "  struct database;").unwrap();
    writeln!(header, "  struct statement {{").unwrap();
    writeln!(header, "    database& db_;").unwrap();
    writeln!(header, "    sqlite3_stmt* val_;").unwrap();
    writeln!(header, "    void open(const std::string& sql);").unwrap();
    writeln!(header, "    void close();").unwrap();
    writeln!(header, "    bool next();").unwrap();
    writeln!(header, "    {insert_ret} insert();").unwrap();
    writeln!(header, "    void xdelete();").unwrap();
    writeln!(header, "    void reset();").unwrap();
    writeln!(header, "    size_t getColumnCount();").unwrap();
    writeln!(header, "    int getColumnType(const size_t& idx);").unwrap();
    writeln!(header, "    void setParamFloat(const std::string& key, const double& val);").unwrap();
    writeln!(header, "    double getColumnFloat(const int& idx);").unwrap();
    writeln!(header, "    void setParamLong(const std::string& key, const int64_t& val);").unwrap();
    writeln!(header, "    int64_t getColumnLong(const int& idx);").unwrap();
    writeln!(header, "    void setParamText(const std::string& key, const std::string& val);").unwrap();
    writeln!(header, "    std::string getColumnText(const int& idx);").unwrap();
    writeln!(header, "    template <typename T> inline void setParam(const std::string& key, const T& val);").unwrap();
    writeln!(header, "    template <typename T> inline T getColumn(const int& idx);").unwrap();
    writeln!(header, "  protected:").unwrap();
    writeln!(header, "    inline statement(database& db) : db_(db), val_(nullptr) {{}}").unwrap();
    writeln!(header, "    inline statement(const statement&) = delete;").unwrap();
    writeln!(header, "    inline statement(statement&&) = delete;").unwrap();
    writeln!(header, "    inline ~statement() {{close();}}").unwrap();
    writeln!(header, "  }};").unwrap();
    writeln!(header, "  template <> inline void statement::setParam<double>(const std::string& key, const double& val) {{ return setParamFloat(key, val); }}").unwrap();
    writeln!(header, "  template <> inline double statement::getColumn<double>(const int& idx) {{ return getColumnFloat(idx); }}").unwrap();
    writeln!(header, "  template <> inline void statement::setParam<int64_t>(const std::string& key, const int64_t& val) {{ return setParamLong(key, val); }}").unwrap();
    writeln!(header, "  template <> inline int64_t statement::getColumn<int64_t>(const int& idx) {{ return getColumnLong(idx); }}").unwrap();
    writeln!(header, "  template <> inline void statement::setParam<std::string>(const std::string& key, const std::string& val) {{ return setParamText(key, val); }}").unwrap();
    writeln!(header, "  template <> inline std::string statement::getColumn<std::string>(const int& idx) {{ return getColumnText(idx); }}").unwrap();
    writeln!(header).unwrap();

    writeln!(header, "  struct exstatement : public statement {{").unwrap();
    writeln!(header, "    inline exstatement(database& db) : statement(db) {{}}").unwrap();
    writeln!(header, "  }};").unwrap();
    writeln!(header).unwrap();

    writeln!(header, "  struct database {{").unwrap();
    writeln!(header, "    sqlite3* val_;").unwrap();
    writeln!(header, "    exstatement beginTx_;").unwrap();
    writeln!(header, "    exstatement commitTx_;").unwrap();
    writeln!(header, "    std::string filename_;").unwrap();
    writeln!(header, "    inline database(const database&) = delete;").unwrap();
    writeln!(header, "    inline database(database&&) = delete;").unwrap();
    writeln!(header, "    void open(const std::string& filename, const int& flags, const char* vfs);").unwrap();
    writeln!(header, "    void close();").unwrap();
    writeln!(header, "    inline void begin() {{beginTx_.reset();beginTx_.next();}}").unwrap();
    writeln!(header, "    inline void commit() {{commitTx_.reset();commitTx_.next();}}").unwrap();
    writeln!(header, "    void exec(const std::string& sqls);").unwrap();
    writeln!(header, "    inline void create(const std::string& filename, const char* vfs) {{open(filename, SQLITE_OPEN_CREATE | SQLITE_OPEN_READWRITE, vfs);}}").unwrap();
    writeln!(header, "    inline void openro(const std::string& filename, const char* vfs) {{open(filename, SQLITE_OPEN_READONLY, vfs);}}").unwrap();
    writeln!(header, "    inline void openrw(const std::string& filename, const char* vfs) {{open(filename, SQLITE_OPEN_READWRITE, vfs);}}").unwrap();
    writeln!(header, "    inline auto isOpen() {{return (val_ != nullptr);}}").unwrap();
    writeln!(header, "    inline auto& filename() const {{return filename_;}}").unwrap();
    writeln!(header, "    inline database() : val_(nullptr), beginTx_(*this), commitTx_(*this) {{}}").unwrap();
    writeln!(header, "    inline ~database() {{close();}}").unwrap();
    writeln!(header, "  }};").unwrap();
    writeln!(header).unwrap();

    writeln!(header, "  struct guard {{").unwrap();
    writeln!(header, "    inline guard(database&) {{}}").unwrap();
    writeln!(header, "  }};").unwrap();
    writeln!(header).unwrap();

    writeln!(header, "  template <typename DbT, typename ConnT>").unwrap();
    writeln!(header, "  class pool {{").unwrap();
    writeln!(header, "    DbT& db_;").unwrap();
    writeln!(header, "    std::vector<std::unique_ptr<ConnT>> pool_;").unwrap();
    writeln!(header, "    std::vector<ConnT*> free_;").unwrap();
    if let Some(mutex) = &module.mutex_name {
        writeln!(header, "#if {mutex}").unwrap();
        writeln!(header, "    std::mutex mx_;").unwrap();
        writeln!(header, "#endif // {mutex}").unwrap();
    }
    writeln!(header, "  public:").unwrap();
    writeln!(header, "    inline ConnT* get() {{").unwrap();
    if let Some(mutex) = &module.mutex_name {
        writeln!(header, "#if {mutex}").unwrap();
        writeln!(header, "      std::lock_guard<std::mutex> lg(mx_);").unwrap();
        writeln!(header, "#endif // {mutex}").unwrap();
    }
    writeln!(header, "      if (free_.size() > 0) {{").unwrap();
    writeln!(header, "        auto r = free_.back();").unwrap();
    writeln!(header, "        free_.pop_back();").unwrap();
    writeln!(header, "        return r;").unwrap();
    writeln!(header, "      }}").unwrap();
    writeln!(header, "      std::unique_ptr<ConnT> ro(new ConnT(db_));").unwrap();
    writeln!(header, "      ro->open();").unwrap();
    writeln!(header, "      pool_.push_back(std::move(ro));").unwrap();
    writeln!(header, "      return pool_.back().get();").unwrap();
    writeln!(header, "    }}").unwrap();
    writeln!(header, "    inline void release(ConnT* r) {{").unwrap();
    if let Some(mutex) = &module.mutex_name {
        writeln!(header, "#if {mutex}").unwrap();
        writeln!(header, "      std::lock_guard<std::mutex> lg(mx_);").unwrap();
        writeln!(header, "#endif // {mutex}").unwrap();
    }
    writeln!(header, "      free_.push_back(r);").unwrap();
    writeln!(header, "    }}").unwrap();
    writeln!(header, "    inline pool(DbT& db) : db_(db) {{}}").unwrap();
    writeln!(header, "    class guard {{").unwrap();
    writeln!(header, "      pool& cp_;").unwrap();
    writeln!(header, "      ConnT* iface_;").unwrap();
    writeln!(header, "    public:").unwrap();
    writeln!(header, "      inline guard(pool& cp) : cp_(cp), iface_(nullptr) {{iface_ = cp_.get();}}").unwrap();
    writeln!(header, "      inline ~guard() {{cp_.release(iface_);}}").unwrap();
    writeln!(header, "      inline auto& conn() {{return *iface_;}}").unwrap();
    writeln!(header, "      inline operator bool() {{return (iface_ == nullptr);}}").unwrap();
    writeln!(header, "    }};").unwrap();
    writeln!(header, "  }};").unwrap();
    writeln!(header).unwrap();

    writeln!(header, "  struct transaction {{").unwrap();
    writeln!(header, "    database& db_;").unwrap();
    writeln!(header, "    bool committed_;").unwrap();
    writeln!(header, "    inline void begin() {{db_.begin();}}").unwrap();
    writeln!(header, "    inline void commit() {{db_.commit();committed_ = true;}}").unwrap();
    writeln!(header, "    inline void rollback() {{db_.exec(\"ROLLBACK;\");}}").unwrap();
    writeln!(header, "    inline transaction& operator=(const transaction& src) = delete;").unwrap();
    writeln!(header, "    inline transaction(database& db) : db_(db), committed_(false) {{ begin(); }}").unwrap();
    writeln!(header, "    inline ~transaction() {{ if (!committed_) rollback(); }}").unwrap();
    writeln!(header, "  }};").unwrap();
    writeln!(header).unwrap();
    writeln!(header, "}} // namespace {ns}").unwrap();
    writeln!(header, "#endif // !defined(SQLCH_COMMON)").unwrap();
    writeln!(header).unwrap();
}

pub(crate) fn emit_definitions(module: &Module, source: &mut String) {
    if !module.generate_base {
        return;
    }
    let ns = &module.generate_base_ns;

    if !module.scode.is_empty() {
        writeln!(source, "{}", module.scode).unwrap();
        writeln!(source).unwrap();
    }

    writeln!(source, "namespace {{").unwrap();
    if module.on_error == "on_Error" {
        writeln!(source, "  inline int on_Error(const std::string& db, const std::string& src, int rc, const std::string& msg) {{").unwrap();
        writeln!(source, "    std::cout << \"(\" << db << \"):sqlite error:\" << msg << \"(\" << rc << \") in \" << src << \", aborting.\" << std::endl;").unwrap();
        writeln!(source, "    exit(1);").unwrap();
        writeln!(source, "  }}").unwrap();
        writeln!(source).unwrap();
    }
    if !module.on_trace.is_empty() {
        writeln!(source, "  void on_Trace(void* /*context*/, const char* /*sql*/) {{}}").unwrap();
        writeln!(source).unwrap();
    }
    if module.on_open == "on_Open" {
        writeln!(source, "  inline void on_Open(const std::string& /*filename*/, const int& /*flags*/) {{}}").unwrap();
        writeln!(source).unwrap();
    }
    if module.on_opened == "on_Opened" {
        writeln!(source, "  inline void on_Opened({ns}::database& /*db*/) {{}}").unwrap();
        writeln!(source).unwrap();
    }
    writeln!(source, "  inline int getParamIndex({ns}::statement& stmt, const std::string& key) {{").unwrap();
    writeln!(source, "    if (stmt.val_ == nullptr) {{").unwrap();
    writeln!(source, "      {}(stmt.db_.filename_, \"get_index\", SQLITE_MISUSE, \"uninitialized statement\");", module.on_error).unwrap();
    writeln!(source, "    }}").unwrap();
    writeln!(source, "    int idx = ::sqlite3_bind_parameter_index(stmt.val_, key.c_str());").unwrap();
    writeln!(source, "    if (idx == 0) {{").unwrap();
    writeln!(source, "      {}(stmt.db_.filename_, \"unknown_param\", SQLITE_MISUSE, key);", module.on_error).unwrap();
    writeln!(source, "    }}").unwrap();
    writeln!(source, "    return idx;").unwrap();
    writeln!(source, "  }}").unwrap();
    writeln!(source, "}} // namespace").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "std::string {ns}::error(sqlite3* db) {{").unwrap();
    writeln!(source, "  return ::sqlite3_errmsg(db);").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "void {ns}::database::open(const std::string& filename, const int& flags, const char* vfs) {{").unwrap();
    if let Some(mutex) = &module.mutex_name {
        writeln!(source, "#if {mutex}").unwrap();
        writeln!(source, "  ::sqlite3_config(SQLITE_CONFIG_SERIALIZED);").unwrap();
        writeln!(source, "#else // {mutex}").unwrap();
        writeln!(source, "  ::sqlite3_config(SQLITE_CONFIG_SINGLETHREAD);").unwrap();
        writeln!(source, "#endif // {mutex}").unwrap();
    }
    writeln!(source, "  if (val_ != nullptr) {{close();}}").unwrap();
    writeln!(source, "  {}(filename, flags);", module.on_open).unwrap();
    writeln!(source, "  int rc = ::sqlite3_open_v2(filename.c_str(), &val_, flags, vfs);").unwrap();
    writeln!(source, "  if (rc != SQLITE_OK) {{").unwrap();
    writeln!(source, "    rc={}(filename, \"open_db:\" + filename, rc, error(val_));", module.on_error).unwrap();
    writeln!(source, "    val_ = nullptr;").unwrap();
    writeln!(source, "    return;").unwrap();
    writeln!(source, "  }}").unwrap();
    if !module.on_trace.is_empty() {
        writeln!(source, "  sqlite3_trace(val_, &on_Trace, NULL);").unwrap();
    }
    writeln!(source, "  beginTx_.open(\"BEGIN EXCLUSIVE\");").unwrap();
    writeln!(source, "  commitTx_.open(\"COMMIT\");").unwrap();
    writeln!(source, "  ::sqlite3_busy_timeout(val_, 5000);").unwrap();
    writeln!(source, "  filename_ = filename;").unwrap();
    writeln!(source, "  {}(*this);", module.on_opened).unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "void {ns}::database::close() {{").unwrap();
    writeln!(source, "  if (val_) {{").unwrap();
    writeln!(source, "    beginTx_.close();").unwrap();
    writeln!(source, "    commitTx_.close();").unwrap();
    writeln!(source, "    int rc = SQLITE_BUSY;").unwrap();
    writeln!(source, "    for (int i = 0; ((i < 10) && (rc == SQLITE_BUSY)); ++i) {{").unwrap();
    writeln!(source, "      rc = ::sqlite3_close(val_);").unwrap();
    writeln!(source, "    }}").unwrap();
    writeln!(source, "    if (rc > 0) {{").unwrap();
    writeln!(source, "      {}(filename_, \"close_db\", rc, error(val_));", module.on_error).unwrap();
    writeln!(source, "    }}").unwrap();
    writeln!(source, "  }}").unwrap();
    writeln!(source, "  val_ = nullptr;").unwrap();
    writeln!(source, "  filename_ = \"\";").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "void {ns}::database::exec(const std::string& sqls) {{").unwrap();
    writeln!(source, "  char* err = nullptr;").unwrap();
    writeln!(source, "  int rc = sqlite3_exec(val_, sqls.c_str(), nullptr, nullptr, &err);").unwrap();
    writeln!(source, "  if (rc != SQLITE_OK) {{").unwrap();
    writeln!(source, "    std::string msg(err);").unwrap();
    writeln!(source, "    sqlite3_free(err);").unwrap();
    writeln!(source, "    {}(filename_, \"exec[\" + sqls + \"]\", rc, msg);", module.on_error).unwrap();
    writeln!(source, "  }}").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "void {ns}::statement::open(const std::string& sql) {{").unwrap();
    writeln!(source, "  if (db_.val_ == nullptr) {{").unwrap();
    writeln!(source, "    {}(db_.filename_, \"prepare\", SQLITE_MISUSE, \"[\" + sql + \"]:database not open\");", module.on_error).unwrap();
    writeln!(source, "    return;").unwrap();
    writeln!(source, "  }}").unwrap();
    writeln!(source, "  int rc = ::sqlite3_prepare_v2(db_.val_, sql.c_str(), -1, &(val_), nullptr);").unwrap();
    writeln!(source, "  if (rc != SQLITE_OK) {{").unwrap();
    writeln!(source, "    {}(db_.filename_, \"prepare\", rc, \"[\" + sql + \"]:\" + error(db_.val_));", module.on_error).unwrap();
    writeln!(source, "    return;").unwrap();
    writeln!(source, "  }}").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "void {ns}::statement::close() {{").unwrap();
    writeln!(source, "  if (val_) {{").unwrap();
    writeln!(source, "    ::sqlite3_finalize(val_);").unwrap();
    writeln!(source, "    val_ = nullptr;").unwrap();
    writeln!(source, "  }}").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "void {ns}::statement::reset() {{").unwrap();
    writeln!(source, "  ::sqlite3_reset(val_);").unwrap();
    writeln!(source, "  ::sqlite3_clear_bindings(val_);").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "bool {ns}::statement::next() {{").unwrap();
    writeln!(source, "  int rc = ::sqlite3_step(val_);").unwrap();
    writeln!(source, "  if (rc == SQLITE_ROW) {{ return true; }}").unwrap();
    writeln!(source, "  if (rc == SQLITE_DONE) {{ return false; }}").unwrap();
    writeln!(source, "  {}(db_.filename_, \"step\", rc, error(db_.val_));", module.on_error).unwrap();
    writeln!(source, "  return false;").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    let insert_ret = if module.is_autoincrement { "uint64_t" } else { "void" };
    writeln!(source, "{insert_ret} {ns}::statement::insert() {{").unwrap();
    writeln!(source, "  next();").unwrap();
    if module.is_autoincrement {
        writeln!(source, "  return static_cast<uint64_t>(::sqlite3_last_insert_rowid(db_.val_));").unwrap();
    }
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "void {ns}::statement::xdelete() {{").unwrap();
    writeln!(source, "  next();").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "size_t {ns}::statement::getColumnCount() {{").unwrap();
    writeln!(source, "  return static_cast<size_t>(::sqlite3_column_count(val_));").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "int {ns}::statement::getColumnType(const size_t& idx) {{").unwrap();
    writeln!(source, "  return ::sqlite3_column_type(val_, static_cast<int>(idx));").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "void {ns}::statement::setParamFloat(const std::string& key, const double& val) {{").unwrap();
    writeln!(source, "  int idx = getParamIndex(*this, key);").unwrap();
    writeln!(source, "  ::sqlite3_bind_double(val_, idx, val);").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "double {ns}::statement::getColumnFloat(const int& idx) {{").unwrap();
    writeln!(source, "  double val = ::sqlite3_column_double(val_, idx);").unwrap();
    writeln!(source, "  return val;").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "void {ns}::statement::setParamLong(const std::string& key, const int64_t& val) {{").unwrap();
    writeln!(source, "  int idx = getParamIndex(*this, key);").unwrap();
    writeln!(source, "  ::sqlite3_bind_int64(val_, idx, val);").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "int64_t {ns}::statement::getColumnLong(const int& idx) {{").unwrap();
    writeln!(source, "  int64_t val = ::sqlite3_column_int64(val_, idx);").unwrap();
    writeln!(source, "  return val;").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "void {ns}::statement::setParamText(const std::string& key, const std::string& val) {{").unwrap();
    writeln!(source, "  int idx = getParamIndex(*this, key);").unwrap();
    writeln!(source, "  ::sqlite3_bind_text(val_, idx, val.c_str(), static_cast<int>(val.length()), SQLITE_TRANSIENT);").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();

    writeln!(source, "std::string {ns}::statement::getColumnText(const int& idx) {{").unwrap();
    writeln!(source, "  int len = ::sqlite3_column_bytes(val_, idx);").unwrap();
    writeln!(source, "  const void* valp = static_cast<const void*>(::sqlite3_column_text(val_, idx));").unwrap();
    writeln!(source, "  const char* val = static_cast<const char*>(valp);").unwrap();
    writeln!(source, "  if (val == nullptr) {{").unwrap();
    writeln!(source, "    {}(db_.filename_, \"get_text\", SQLITE_ERROR, error(db_.val_));", module.on_error).unwrap();
    writeln!(source, "  }}").unwrap();
    writeln!(source, "  return std::string(val, static_cast<size_t>(len));").unwrap();
    writeln!(source, "}}").unwrap();
    writeln!(source).unwrap();
}

// ==========================================
// 儿童生长数据校验系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，保证外键约束始终生效
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建库（幂等），记录 schema_version
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id    TEXT PRIMARY KEY,
    scope_type  TEXT NOT NULL,
    scope_key   TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL REFERENCES config_scope(scope_id),
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS analysis_job (
    job_id                TEXT PRIMARY KEY,
    status                TEXT NOT NULL,
    default_gender        TEXT NOT NULL,
    field_data_path       TEXT NOT NULL,
    reference_path        TEXT NOT NULL,
    summary_json          TEXT,
    config_snapshot_json  TEXT,
    result_sheet_path     TEXT,
    summary_sheet_path    TEXT,
    workbook_path         TEXT,
    report_path           TEXT,
    context_path          TEXT,
    error_message         TEXT,
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS child (
    child_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id      TEXT NOT NULL REFERENCES analysis_job(job_id) ON DELETE CASCADE,
    seq_no      INTEGER NOT NULL,
    nik         TEXT,
    name        TEXT NOT NULL,
    birth_date  TEXT,
    gender      TEXT NOT NULL,
    UNIQUE (job_id, seq_no)
);

CREATE TABLE IF NOT EXISTS measurement (
    measurement_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    child_id            INTEGER NOT NULL REFERENCES child(child_id) ON DELETE CASCADE,
    seq_no              INTEGER NOT NULL,
    month_label         TEXT NOT NULL,
    measured_date       TEXT,
    age_months          INTEGER,
    weight_kg           REAL,
    height_cm           REAL,
    measurement_method  TEXT,
    weight_status       TEXT NOT NULL,
    height_status       TEXT NOT NULL,
    validation_level    TEXT NOT NULL,
    remark              TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_child_job ON child(job_id);
CREATE INDEX IF NOT EXISTS idx_measurement_child ON measurement(child_id);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
VALUES ('global', 'GLOBAL', 'global');
"#;

/// 建库（幂等）并写入当前 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

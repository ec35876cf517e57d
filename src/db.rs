// ==========================================
// 产线生产跟踪 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表 (CREATE TABLE IF NOT EXISTS)
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

/// 打开内存库并建表（测试与临时场景）
pub fn open_in_memory_with_schema() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 初始化 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS user_profile (
            username TEXT PRIMARY KEY,
            shift_code TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS production_record (
            record_id TEXT PRIMARY KEY,
            recorded_at TEXT NOT NULL,
            line_no INTEGER NOT NULL,
            product_name TEXT NOT NULL,
            operator TEXT NOT NULL,
            shift_code TEXT NOT NULL,
            palettes_produced INTEGER NOT NULL DEFAULT 0 CHECK (palettes_produced >= 0),
            palettes_non_conforming INTEGER NOT NULL DEFAULT 0
                CHECK (palettes_non_conforming >= 0 AND palettes_non_conforming <= palettes_produced),
            boxes_produced INTEGER NOT NULL DEFAULT 0,
            waste_boxes INTEGER NOT NULL DEFAULT 0 CHECK (waste_boxes >= 0),
            nc_cause TEXT,
            disposition_status TEXT NOT NULL DEFAULT 'pending',
            nc_controlled_at TEXT,
            nc_resolution_comment TEXT,
            recovered_bundles INTEGER NOT NULL DEFAULT 0,
            stoppage_minutes INTEGER NOT NULL DEFAULT 0,
            stoppage_cause TEXT,
            comments TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_production_record_recorded_at
            ON production_record (recorded_at DESC);
        CREATE INDEX IF NOT EXISTS idx_production_record_line
            ON production_record (line_no, recorded_at DESC);
        CREATE INDEX IF NOT EXISTS idx_production_record_operator
            ON production_record (operator, recorded_at DESC);
        CREATE INDEX IF NOT EXISTS idx_production_record_status
            ON production_record (disposition_status);

        CREATE TABLE IF NOT EXISTS alert (
            alert_id TEXT PRIMARY KEY,
            record_id TEXT NOT NULL REFERENCES production_record(record_id) ON DELETE CASCADE,
            kind TEXT NOT NULL DEFAULT 'other',
            priority TEXT NOT NULL DEFAULT 'medium',
            message TEXT NOT NULL,
            created_at TEXT NOT NULL,
            is_resolved INTEGER NOT NULL DEFAULT 0,
            resolved_at TEXT,
            resolved_by TEXT,
            resolution_comment TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_alert_open
            ON alert (is_resolved, created_at DESC);
        "#,
    )?;

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

// ==========================================
// 产线生产跟踪 - 用户班次档案仓储
// ==========================================
// 对齐: user_profile 表
// ==========================================

use crate::domain::types::ShiftWindow;
use crate::domain::user::UserShiftAssignment;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_ts};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct UserProfileRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserProfileRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或更新档案 (按 username)
    pub fn upsert(&self, profile: &UserShiftAssignment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO user_profile (username, shift_code, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(username) DO UPDATE SET
                shift_code = excluded.shift_code,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
            params![
                profile.username,
                profile.shift.map(|s| s.to_db_str()),
                profile.is_active,
                format_ts(&profile.created_at),
                format_ts(&profile.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_username(&self, username: &str) -> RepositoryResult<Option<UserShiftAssignment>> {
        let conn = self.get_conn()?;
        let profile = conn
            .query_row(
                "SELECT username, shift_code, is_active, created_at, updated_at
                 FROM user_profile WHERE username = ?1",
                params![username],
                map_profile_row,
            )
            .optional()?;
        Ok(profile)
    }

    /// 全部在职档案, 按用户名排序
    pub fn find_active(&self) -> RepositoryResult<Vec<UserShiftAssignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT username, shift_code, is_active, created_at, updated_at
             FROM user_profile WHERE is_active = 1 ORDER BY username ASC",
        )?;
        let profiles = stmt
            .query_map([], map_profile_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(profiles)
    }
}

fn map_profile_row(row: &Row<'_>) -> rusqlite::Result<UserShiftAssignment> {
    // 未识别的班次编码视为未分配
    let shift_code: Option<String> = row.get(1)?;
    let shift = shift_code.as_deref().and_then(|code| {
        let parsed = ShiftWindow::from_db_str(code);
        if parsed.is_none() {
            tracing::warn!(shift_code = code, "未识别的班次编码，按未分配处理");
        }
        parsed
    });

    Ok(UserShiftAssignment {
        username: row.get(0)?,
        shift,
        is_active: row.get(2)?,
        created_at: parse_ts(3, &row.get::<_, String>(3)?)?,
        updated_at: parse_ts(4, &row.get::<_, String>(4)?)?,
    })
}

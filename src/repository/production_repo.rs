// ==========================================
// 产线生产跟踪 - 生产记录数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 处置的读-改-写在同一事务内完成, 闭包失败即回滚
// ==========================================

use crate::domain::alert::Alert;
use crate::domain::production::ProductionRecord;
use crate::domain::types::{DispositionStatus, ShiftWindow};
use crate::repository::alert_repo::insert_alert_row;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_opt_ts, parse_ts};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    record_id, recorded_at, line_no, product_name, operator, shift_code,
    palettes_produced, palettes_non_conforming, boxes_produced, waste_boxes,
    nc_cause, disposition_status, nc_controlled_at, nc_resolution_comment, recovered_bundles,
    stoppage_minutes, stoppage_cause, comments, created_at, updated_at
"#;

// ==========================================
// ProductionRecordRepository - 生产记录仓储
// ==========================================
pub struct ProductionRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionRecordRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入生产记录
    pub fn insert(&self, record: &ProductionRecord) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_record_row(&conn, record)?;
        Ok(record.record_id.clone())
    }

    /// 插入生产记录及其自动告警 (同一事务)
    pub fn insert_with_alerts(
        &self,
        record: &ProductionRecord,
        alerts: &[Alert],
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        insert_record_row(&tx, record)?;
        for alert in alerts {
            insert_alert_row(&tx, alert)?;
        }

        tx.commit()?;
        Ok(record.record_id.clone())
    }

    /// 在事务内读取 → 修改 → 写回一条记录
    ///
    /// # 参数
    /// - `record_id`: 记录ID
    /// - `f`: 修改闭包; 返回 Err 时事务回滚, 库中记录保持不变
    ///
    /// # 返回
    /// - `Ok(T)`: 闭包返回值 (已提交)
    /// - `Err(E)`: 记录不存在 / 闭包失败 / 数据库错误
    pub fn update_in_tx<T, E, F>(&self, record_id: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut ProductionRecord) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction().map_err(RepositoryError::from)?;

        let mut record = find_record_row(&tx, record_id)
            .map_err(RepositoryError::from)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ProductionRecord".to_string(),
                id: record_id.to_string(),
            })?;

        let out = f(&mut record)?;

        update_record_row(&tx, &record).map_err(RepositoryError::from)?;
        tx.commit().map_err(RepositoryError::from)?;
        Ok(out)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<ProductionRecord>> {
        let conn = self.get_conn()?;
        Ok(find_record_row(&conn, record_id)?)
    }

    /// 查询时间范围 [from, to) 内的记录, 按时间倒序
    pub fn find_by_range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_record WHERE recorded_at >= ?1 AND recorded_at < ?2 ORDER BY recorded_at DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![format_ts(&from), format_ts(&to)], map_record_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// 查询某操作员最近的记录
    pub fn find_recent_by_operator(
        &self,
        operator: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_record WHERE operator = ?1 ORDER BY recorded_at DESC LIMIT ?2",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![operator, limit as i64], map_record_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// 查询仍待处置的记录 (pending / partial 且不合格托数 > 0)
    pub fn find_awaiting_disposition(&self) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_record
             WHERE palettes_non_conforming > 0 AND disposition_status IN (?1, ?2)
             ORDER BY recorded_at ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(
                params![
                    DispositionStatus::Pending.to_db_str(),
                    DispositionStatus::Partial.to_db_str()
                ],
                map_record_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

// ==========================================
// 行映射 (事务与非事务共用)
// ==========================================

fn insert_record_row(conn: &Connection, r: &ProductionRecord) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        INSERT INTO production_record (
            record_id, recorded_at, line_no, product_name, operator, shift_code,
            palettes_produced, palettes_non_conforming, boxes_produced, waste_boxes,
            nc_cause, disposition_status, nc_controlled_at, nc_resolution_comment, recovered_bundles,
            stoppage_minutes, stoppage_cause, comments, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
        "#,
        params![
            r.record_id,
            format_ts(&r.recorded_at),
            r.line_no,
            r.product_name,
            r.operator,
            r.shift.to_db_str(),
            r.palettes_produced,
            r.palettes_non_conforming,
            r.boxes_produced,
            r.waste_boxes,
            r.nc_cause,
            r.disposition_status.to_db_str(),
            r.nc_controlled_at.as_ref().map(format_ts),
            r.nc_resolution_comment,
            r.recovered_bundles,
            r.stoppage_minutes,
            r.stoppage_cause,
            r.comments,
            format_ts(&r.created_at),
            format_ts(&r.updated_at),
            r.line_no,
            r.product_name,
        ],
    )
}

/// 写回可变字段 (处置 / 修订)
fn update_record_row(conn: &Connection, r: &ProductionRecord) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        UPDATE production_record SET
            palettes_produced = ?2,
            palettes_non_conforming = ?3,
            boxes_produced = ?4,
            waste_boxes = ?5,
            nc_cause = ?6,
            disposition_status = ?7,
            nc_controlled_at = ?8,
            nc_resolution_comment = ?9,
            recovered_bundles = ?10,
            stoppage_minutes = ?11,
            stoppage_cause = ?12,
            comments = ?13,
            updated_at = ?14,
            line_no = ?15,
            product_name = ?16
        WHERE record_id = ?1
        "#,
        params![
            r.record_id,
            r.palettes_produced,
            r.palettes_non_conforming,
            r.boxes_produced,
            r.waste_boxes,
            r.nc_cause,
            r.disposition_status.to_db_str(),
            r.nc_controlled_at.as_ref().map(format_ts),
            r.nc_resolution_comment,
            r.recovered_bundles,
            r.stoppage_minutes,
            r.stoppage_cause,
            r.comments,
            format_ts(&r.updated_at),
        ],
    )
}

fn find_record_row(conn: &Connection, record_id: &str) -> rusqlite::Result<Option<ProductionRecord>> {
    let sql = format!(
        "SELECT {} FROM production_record WHERE record_id = ?1",
        SELECT_COLUMNS
    );
    conn.query_row(&sql, params![record_id], map_record_row)
        .optional()
}

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<ProductionRecord> {
    let shift_code: String = row.get(5)?;
    let status_code: String = row.get(11)?;

    Ok(ProductionRecord {
        record_id: row.get(0)?,
        recorded_at: parse_ts(1, &row.get::<_, String>(1)?)?,
        line_no: row.get(2)?,
        product_name: row.get(3)?,
        operator: row.get(4)?,
        shift: ShiftWindow::from_db_str(&shift_code)
            .ok_or_else(|| invalid_code(5, "shift_code", &shift_code))?,
        palettes_produced: row.get(6)?,
        palettes_non_conforming: row.get(7)?,
        boxes_produced: row.get(8)?,
        waste_boxes: row.get(9)?,
        nc_cause: row.get(10)?,
        disposition_status: DispositionStatus::from_db_str(&status_code)
            .ok_or_else(|| invalid_code(11, "disposition_status", &status_code))?,
        nc_controlled_at: parse_opt_ts(12, row.get(12)?)?,
        nc_resolution_comment: row.get(13)?,
        recovered_bundles: row.get(14)?,
        stoppage_minutes: row.get(15)?,
        stoppage_cause: row.get(16)?,
        comments: row.get(17)?,
        created_at: parse_ts(18, &row.get::<_, String>(18)?)?,
        updated_at: parse_ts(19, &row.get::<_, String>(19)?)?,
    })
}

fn invalid_code(idx: usize, column: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("{} 非法取值: {}", column, value).into(),
    )
}

// ==========================================
// 产线生产跟踪 - 告警数据仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::domain::alert::Alert;
use crate::domain::types::{AlertKind, AlertPriority};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_opt_ts, parse_ts};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    alert_id, record_id, kind, priority, message, created_at,
    is_resolved, resolved_at, resolved_by, resolution_comment
"#;

// ==========================================
// AlertRepository - 告警仓储
// ==========================================
pub struct AlertRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AlertRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入告警
    pub fn insert(&self, alert: &Alert) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_alert_row(&conn, alert)?;
        Ok(alert.alert_id.clone())
    }

    /// 按ID查询
    pub fn find_by_id(&self, alert_id: &str) -> RepositoryResult<Option<Alert>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM alert WHERE alert_id = ?1", SELECT_COLUMNS);
        let alert = conn
            .query_row(&sql, params![alert_id], map_alert_row)
            .optional()?;
        Ok(alert)
    }

    /// 查询某条生产记录的全部告警
    pub fn find_by_record(&self, record_id: &str) -> RepositoryResult<Vec<Alert>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM alert WHERE record_id = ?1 ORDER BY created_at DESC, kind ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let alerts = stmt
            .query_map(params![record_id], map_alert_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alerts)
    }

    /// 查询未关闭告警 (最新在前)
    pub fn find_unresolved(&self, limit: usize) -> RepositoryResult<Vec<Alert>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM alert WHERE is_resolved = 0 ORDER BY created_at DESC LIMIT ?1",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let alerts = stmt
            .query_map(params![limit as i64], map_alert_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(alerts)
    }

    /// 未关闭告警数量
    pub fn count_unresolved(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM alert WHERE is_resolved = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// 写回关闭信息
    pub fn update_resolution(&self, alert: &Alert) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE alert SET
                is_resolved = ?2, resolved_at = ?3, resolved_by = ?4, resolution_comment = ?5
            WHERE alert_id = ?1
            "#,
            params![
                alert.alert_id,
                alert.is_resolved,
                alert.resolved_at.as_ref().map(format_ts),
                alert.resolved_by,
                alert.resolution_comment,
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Alert".to_string(),
                id: alert.alert_id.clone(),
            });
        }
        Ok(())
    }
}

/// 插入一行告警 (供生产记录事务复用)
pub(crate) fn insert_alert_row(conn: &Connection, a: &Alert) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        INSERT INTO alert (
            alert_id, record_id, kind, priority, message, created_at,
            is_resolved, resolved_at, resolved_by, resolution_comment
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            a.alert_id,
            a.record_id,
            a.kind.to_db_str(),
            a.priority.to_db_str(),
            a.message,
            format_ts(&a.created_at),
            a.is_resolved,
            a.resolved_at.as_ref().map(format_ts),
            a.resolved_by,
            a.resolution_comment,
        ],
    )
}

fn map_alert_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        alert_id: row.get(0)?,
        record_id: row.get(1)?,
        kind: AlertKind::from_db_str(&row.get::<_, String>(2)?),
        priority: AlertPriority::from_db_str(&row.get::<_, String>(3)?),
        message: row.get(4)?,
        created_at: parse_ts(5, &row.get::<_, String>(5)?)?,
        is_resolved: row.get(6)?,
        resolved_at: parse_opt_ts(7, row.get(7)?)?,
        resolved_by: row.get(8)?,
        resolution_comment: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::production::{NewProductionReading, ProductionRecord};
    use crate::domain::types::ShiftWindow;
    use crate::repository::ProductionRecordRepository;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn setup() -> AlertRepository {
        let conn = Arc::new(Mutex::new(crate::db::open_in_memory_with_schema().unwrap()));
        let records = ProductionRecordRepository::new(conn.clone());
        records
            .insert(&ProductionRecord::from_reading(
                "r1".to_string(),
                "op1",
                ShiftWindow::Morning,
                NewProductionReading {
                    line_no: 1,
                    product_name: "P".to_string(),
                    ..Default::default()
                },
                at(8),
            ))
            .unwrap();
        AlertRepository::new(conn)
    }

    #[test]
    fn test_insert_resolve_and_count() {
        let repo = setup();
        let a1 = Alert::new("a1".into(), "r1".into(), AlertKind::Stoppage, "m1".into(), at(8));
        let a2 = Alert::new("a2".into(), "r1".into(), AlertKind::HighWaste, "m2".into(), at(9))
            .with_priority(AlertPriority::High);
        repo.insert(&a1).unwrap();
        repo.insert(&a2).unwrap();
        assert_eq!(repo.count_unresolved().unwrap(), 2);

        let open = repo.find_unresolved(10).unwrap();
        assert_eq!(open[0].alert_id, "a2");
        assert_eq!(open[0].priority, AlertPriority::High);

        let mut a1 = repo.find_by_id("a1").unwrap().unwrap();
        a1.resolve("chef", Some("réparé".to_string()), at(10));
        repo.update_resolution(&a1).unwrap();

        assert_eq!(repo.count_unresolved().unwrap(), 1);
        let stored = repo.find_by_id("a1").unwrap().unwrap();
        assert_eq!(stored, a1);
        assert_eq!(repo.find_by_record("r1").unwrap().len(), 2);
    }

    #[test]
    fn test_alert_requires_existing_record() {
        let repo = setup();
        let orphan = Alert::new("a9".into(), "ghost".into(), AlertKind::Other, "m".into(), at(8));
        assert!(matches!(
            repo.insert(&orphan),
            Err(RepositoryError::ForeignKeyViolation(_))
        ));
    }

    #[test]
    fn test_update_resolution_missing_alert() {
        let repo = setup();
        let mut ghost = Alert::new("zz".into(), "r1".into(), AlertKind::Other, "m".into(), at(8));
        ghost.resolve("chef", None, at(9));
        assert!(matches!(
            repo.update_resolution(&ghost),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}

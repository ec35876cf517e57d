// ==========================================
// 产线生产跟踪 - 仓储层错误类型
// ==========================================
// 来源: rusqlite 错误按约束类型归类, 再由 API 层映射为 ApiError
// 约束: production_record 的数量 CHECK, alert.record_id 外键,
//       各表主键唯一; 存量编码 (shift_code / disposition_status) 读取失败
// ==========================================

use thiserror::Error;

/// 仓储层错误
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 按主键查不到记录 / 告警 / 档案
    #[error("{entity}(id={id}) 不存在")]
    NotFound { entity: String, id: String },

    /// 共享连接的 Mutex 已中毒
    #[error("数据库连接锁不可用: {0}")]
    LockError(String),

    #[error("SQLite 执行失败: {0}")]
    DatabaseQueryError(String),

    /// 重复的 record_id / alert_id / username
    #[error("主键重复: {0}")]
    UniqueConstraintViolation(String),

    /// 告警指向不存在的生产记录
    #[error("告警关联的生产记录不存在: {0}")]
    ForeignKeyViolation(String),

    /// 数量越界, 如不合格托数超过生产托数
    #[error("生产数量约束违反: {0}")]
    CheckConstraintViolation(String),

    /// 库中存量值无法还原为领域类型
    #[error("存量字段无法解析 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else if msg.contains("CHECK") {
                    RepositoryError::CheckConstraintViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::FromSqlConversionFailure(idx, _, cause) => {
                RepositoryError::FieldValueError {
                    field: format!("column#{}", idx),
                    message: cause.to_string(),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory_with_schema;

    const INSERT_RECORD: &str = "INSERT INTO production_record \
        (record_id, recorded_at, line_no, product_name, operator, shift_code, \
         palettes_produced, palettes_non_conforming, created_at, updated_at) \
        VALUES (?1, '2025-03-10 09:00:00', 1, 'P', 'op1', ?2, ?3, ?4, \
                '2025-03-10 09:00:00', '2025-03-10 09:00:00')";

    #[test]
    fn test_constraint_failures_are_classified() {
        let conn = open_in_memory_with_schema().unwrap();
        conn.execute(INSERT_RECORD, rusqlite::params!["r1", "6-14", 10, 2])
            .unwrap();

        let dup = conn
            .execute(INSERT_RECORD, rusqlite::params!["r1", "6-14", 10, 2])
            .unwrap_err();
        assert!(matches!(
            RepositoryError::from(dup),
            RepositoryError::UniqueConstraintViolation(_)
        ));

        let too_many_nc = conn
            .execute(INSERT_RECORD, rusqlite::params!["r2", "6-14", 2, 3])
            .unwrap_err();
        assert!(matches!(
            RepositoryError::from(too_many_nc),
            RepositoryError::CheckConstraintViolation(_)
        ));

        let orphan = conn
            .execute(
                "INSERT INTO alert (alert_id, record_id, message, created_at) \
                 VALUES ('a1', 'absent', 'arrêt', '2025-03-10 09:00:00')",
                [],
            )
            .unwrap_err();
        assert!(matches!(
            RepositoryError::from(orphan),
            RepositoryError::ForeignKeyViolation(_)
        ));
    }

    #[test]
    fn test_conversion_failure_names_column() {
        let err = rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            "shift_code 非法取值: 7-15".into(),
        );
        match RepositoryError::from(err) {
            RepositoryError::FieldValueError { field, message } => {
                assert_eq!(field, "column#5");
                assert!(message.contains("7-15"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

// ==========================================
// 产线生产跟踪 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod alert_repo;
pub mod error;
pub mod production_repo;
pub mod user_profile_repo;

// 重导出核心仓储
pub use alert_repo::AlertRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use production_repo::ProductionRecordRepository;
pub use user_profile_repo::UserProfileRepository;

use chrono::NaiveDateTime;
use rusqlite::types::Type;

/// 时间戳存储格式
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 解析时间戳列, 格式错误转换为 rusqlite 的列转换错误
pub(crate) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_opt_ts(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<NaiveDateTime>> {
    raw.map(|s| parse_ts(idx, &s)).transpose()
}

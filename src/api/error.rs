// ==========================================
// 产线生产跟踪 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换仓储/引擎错误为用户可读的错误消息
// 约束: 所有错误均在请求边界可恢复
// ==========================================

use crate::engine::disposition::DispositionError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 处置业务错误
    // ==========================================
    #[error("无效数量: {0}")]
    InvalidQuantity(String),

    #[error("无待处置的不合格托: record_id={record_id}, status={status}")]
    NothingToProcess { record_id: String, status: String },

    #[error("回收捆数超出可用数量: requested={requested}, available={available}")]
    ExceedsAvailable { requested: u32, available: u32 },

    // ==========================================
    // 权限 / 班次
    // ==========================================
    #[error("无权限: {0}")]
    Unauthorized(String),

    #[error("班次不匹配: operator={operator}, assigned={assigned}, active={active}")]
    ShiftMismatch {
        operator: String,
        assigned: String,
        active: String,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),

            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("数据重复: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("关联数据不存在: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::ValidationError(format!("数据约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::ValidationError(format!("字段{}取值错误: {}", field, message))
            }

            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

// ==========================================
// 从 DispositionError 转换
// ==========================================
impl From<DispositionError> for ApiError {
    fn from(err: DispositionError) -> Self {
        match err {
            DispositionError::InvalidQuantity(msg) => ApiError::InvalidQuantity(msg),
            DispositionError::NothingToProcess {
                record_id, status, ..
            } => ApiError::NothingToProcess {
                record_id,
                status: status.to_string(),
            },
            DispositionError::ExceedsAvailable {
                requested,
                available,
            } => ApiError::ExceedsAvailable {
                requested,
                available,
            },
        }
    }
}

/// API层Result类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 产线生产跟踪 - API 层
// ==========================================
// 职责: 请求边界的业务接口, 供 Web 层调用
// 流程: 解析/校验 → 引擎 → 落库, 错误统一为 ApiError
// ==========================================

pub mod access_api;
pub mod alert_api;
pub mod dashboard_api;
pub mod error;
pub mod production_api;
pub mod validator;

// 重导出核心类型
pub use access_api::{local_now, AccessApi};
pub use alert_api::AlertApi;
pub use dashboard_api::{DashboardApi, DashboardSummary};
pub use error::{ApiError, ApiResult};
pub use production_api::{ProductionApi, ReadingCreated};
pub use validator::{parse_quantity, validate_reading, DispositionForm};

// ==========================================
// 产线生产跟踪 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、换算常量
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod alert;
pub mod production;
pub mod types;
pub mod user;

// 重导出核心类型
pub use alert::Alert;
pub use production::{NewProductionReading, ProductionRecord};
pub use types::{
    AlertKind, AlertPriority, DispositionStatus, ShiftWindow, BOXES_PER_BUNDLE,
    BOXES_PER_PALETTE, BUNDLES_PER_PALETTE,
};
pub use user::{Actor, UserShiftAssignment};

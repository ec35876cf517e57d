// ==========================================
// 产线生产跟踪 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 不读系统时钟
// ==========================================

pub mod alerting;
pub mod disposition;
pub mod kpi;
pub mod shift_access;

// 重导出核心引擎
pub use alerting::{AlertPublisher, AlertRules, NoOpAlertPublisher, OptionalAlertPublisher};
pub use disposition::{
    ClampWarning, DispositionAction, DispositionCalculation, DispositionError,
    DispositionOutcome, DispositionRequest, NonConformityDispositionEngine,
};
pub use kpi::{HealthStatus, KpiParams, ProductionKpis, ShiftProductivity, SystemHealth};
pub use shift_access::{AccessDecision, ShiftAccessEvaluator};

// ==========================================
// 产线生产跟踪 - 核心库
// ==========================================
// 职责: 班次准入控制 + 不合格品处置 + 报工告警 + KPI 汇总
// 技术栈: Rust + SQLite
// 分层: domain → engine → repository → api
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 告警阈值 / KPI 参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AlertKind, AlertPriority, DispositionStatus, ShiftWindow};

// 领域实体
pub use domain::{Actor, Alert, NewProductionReading, ProductionRecord, UserShiftAssignment};

// 引擎
pub use engine::{
    AlertRules, DispositionAction, DispositionOutcome, NonConformityDispositionEngine,
    ProductionKpis, ShiftAccessEvaluator,
};

// API
pub use api::{AccessApi, AlertApi, ApiError, DashboardApi, DispositionForm, ProductionApi};

// ==========================================
// 版本信息
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "产线生产跟踪";

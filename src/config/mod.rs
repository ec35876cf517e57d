// ==========================================
// 产线生产跟踪 - 配置层
// ==========================================
// 职责: 告警阈值、KPI 参数、界面语言
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};

// ==========================================
// 产线生产跟踪 - 应用层
// ==========================================
// 职责: 装配共享连接与 API, 供 Web 层持有
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};

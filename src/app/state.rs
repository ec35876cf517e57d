// ==========================================
// 产线生产跟踪 - 应用状态
// ==========================================
// 职责: 打开数据库、装配仓储与全部 API 实例
// 连接: 单一 SQLite 连接, Arc<Mutex<Connection>> 共享
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{AccessApi, AlertApi, DashboardApi, ProductionApi};
use crate::config::ConfigManager;
use crate::engine::alerting::{AlertPublisher, OptionalAlertPublisher};
use crate::repository::{AlertRepository, ProductionRecordRepository, UserProfileRepository};

/// 应用状态
///
/// Web 层持有一份, 每个请求直接调用其中的 API
pub struct AppState {
    /// 数据库路径 (内存库为 ":memory:")
    pub db_path: String,

    pub access_api: Arc<AccessApi>,
    pub production_api: Arc<ProductionApi>,
    pub alert_api: Arc<AlertApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 打开 (或创建) 数据库并装配全部 API
    ///
    /// # 说明
    /// 1. 应用 PRAGMA 并幂等建表
    /// 2. 按配置设置界面语言
    /// 3. 告警推送器可选, 为 None 时只落库不推送
    pub fn new(
        db_path: String,
        publisher: Option<Arc<dyn AlertPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)), publisher)
    }

    /// 从已初始化 schema 的连接装配
    pub fn from_connection(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        publisher: Option<Arc<dyn AlertPublisher>>,
    ) -> Result<Self, String> {
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));

        // 仅在显式配置时切换全局语言
        match config_manager.get_global_config_value(crate::config::config_keys::UI_LOCALE) {
            Ok(Some(_)) => match config_manager.get_ui_locale() {
                Ok(locale) => crate::i18n::set_locale(&locale),
                Err(e) => tracing::warn!("界面语言读取失败，保持默认: {}", e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("界面语言读取失败，保持默认: {}", e),
        }

        // ==========================================
        // Repository 层
        // ==========================================
        let record_repo = Arc::new(ProductionRecordRepository::new(conn.clone()));
        let alert_repo = Arc::new(AlertRepository::new(conn.clone()));
        let user_repo = Arc::new(UserProfileRepository::new(conn));

        // ==========================================
        // API 层
        // ==========================================
        let publisher = OptionalAlertPublisher::new(publisher);
        if !publisher.is_enabled() {
            tracing::debug!("未配置告警推送器，告警仅落库");
        }

        let access_api = Arc::new(AccessApi::new(user_repo.clone()));
        let production_api = Arc::new(ProductionApi::new(
            record_repo.clone(),
            user_repo,
            config_manager.clone(),
            publisher,
        ));
        let alert_api = Arc::new(AlertApi::new(alert_repo.clone()));
        let dashboard_api = Arc::new(DashboardApi::new(
            record_repo,
            alert_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            access_api,
            production_api,
            alert_api,
            dashboard_api,
            config_manager,
        })
    }
}

/// 默认数据库路径
///
/// 优先读取环境变量 PRODUCTION_TRACKING_DB_PATH,
/// 否则使用用户数据目录下的 production-tracking/production_tracking.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("PRODUCTION_TRACKING_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./production_tracking.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("production-tracking");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("数据目录创建失败，使用当前目录: {}", e);
        } else {
            path = dir.join("production_tracking.db");
        }
    }

    path.to_string_lossy().to_string()
}

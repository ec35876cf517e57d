// ==========================================
// 产线生产跟踪 - 命令行入口
// ==========================================
// 用法: production-tracking [数据库路径]
// 职责: 初始化数据库 schema, 输出当前在岗班次与告警概况
// ==========================================

use chrono::Timelike;
use production_tracking::api::local_now;
use production_tracking::app::{get_default_db_path, AppState};
use production_tracking::domain::ShiftWindow;
use production_tracking::{db, logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", production_tracking::APP_NAME, production_tracking::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args()
        .nth(1)
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(get_default_db_path);

    match run(db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("启动失败: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: String) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(db_path, None)?;

    {
        let conn = db::open_sqlite_connection(&state.db_path)?;
        let version = db::read_schema_version(&conn)?;
        tracing::info!(db_path = %state.db_path, schema_version = ?version, "数据库就绪");
    }

    let now = local_now();
    let shift = ShiftWindow::from_hour(now.hour());
    tracing::info!(
        hour = now.hour(),
        shift = %shift,
        shift_name = %shift.display_name(),
        "当前在岗班次"
    );

    let on_duty = state.access_api.active_operators(now)?;
    tracing::info!(
        count = on_duty.len(),
        operators = ?on_duty.iter().map(|p| p.username.as_str()).collect::<Vec<_>>(),
        "在岗操作员"
    );

    let awaiting = state.dashboard_api.awaiting_disposition()?.len();
    let health = state.dashboard_api.system_health(now.date())?;
    tracing::info!(
        status = ?health.status,
        score = health.health_score,
        records_today = health.records_today,
        open_alerts = health.unresolved_alerts,
        active_lines = health.active_lines,
        awaiting_disposition = awaiting,
        "当日运行概况"
    );

    let snapshot = state
        .config_manager
        .get_config_snapshot()
        .map_err(|e| e.to_string())?;
    tracing::info!(config = %serde_json::to_string(&snapshot)?, "当前配置");

    Ok(())
}

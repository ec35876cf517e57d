// ==========================================
// 日志系统初始化
// ==========================================
// tracing + tracing-subscriber
// RUST_LOG 控制级别, LOG_FORMAT=json 输出结构化日志
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=production_tracking=debug
/// - LOG_FORMAT: `json` 时输出 JSON 行, 其他值为文本格式
///
/// # 示例
/// ```no_run
/// use production_tracking::logging;
/// logging::init();
/// ```
pub fn init() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true);

    // 重复初始化时忽略 (例如嵌入到已有 subscriber 的宿主)
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("日志系统已初始化，跳过: {}", e);
    }
}

/// 初始化测试环境的日志系统
///
/// debug 级别, 输出到测试捕获
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

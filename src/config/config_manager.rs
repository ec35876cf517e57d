// ==========================================
// 产线生产跟踪 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value, scope_id='global')
// 约束: 换算常量 (72 捆/托, 24 盒/捆) 不可配置
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::alerting::AlertRules;
use crate::engine::kpi::KpiParams;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    pub const STOPPAGE_THRESHOLD_MINUTES: &str = "alert.stoppage_threshold_minutes";
    pub const HIGH_WASTE_THRESHOLD_BOXES: &str = "alert.high_waste_threshold_boxes";
    pub const TARGET_PALETTES_PER_RECORD: &str = "kpi.target_palettes_per_record";
    pub const BOXES_PER_PALETTE_ESTIMATE: &str = "kpi.boxes_per_palette_estimate";
    pub const UI_LOCALE: &str = "ui.locale";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 全部 global 配置的快照
    pub fn get_config_snapshot(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 读取并解析配置, 缺失或格式错误时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    // ===== 告警阈值 =====

    pub fn get_alert_rules(&self) -> Result<AlertRules, Box<dyn Error>> {
        let defaults = AlertRules::default();
        Ok(AlertRules {
            stoppage_threshold_minutes: self.get_parsed_or_default(
                config_keys::STOPPAGE_THRESHOLD_MINUTES,
                defaults.stoppage_threshold_minutes,
            )?,
            high_waste_threshold_boxes: self.get_parsed_or_default(
                config_keys::HIGH_WASTE_THRESHOLD_BOXES,
                defaults.high_waste_threshold_boxes,
            )?,
        })
    }

    // ===== KPI 参数 =====

    pub fn get_kpi_params(&self) -> Result<KpiParams, Box<dyn Error>> {
        let defaults = KpiParams::default();
        Ok(KpiParams {
            target_palettes_per_record: self.get_parsed_or_default(
                config_keys::TARGET_PALETTES_PER_RECORD,
                defaults.target_palettes_per_record,
            )?,
            boxes_per_palette_estimate: self.get_parsed_or_default(
                config_keys::BOXES_PER_PALETTE_ESTIMATE,
                defaults.boxes_per_palette_estimate,
            )?,
        })
    }

    // ===== 界面语言 =====

    pub fn get_ui_locale(&self) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_global_config_value(config_keys::UI_LOCALE)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "zh-CN".to_string()))
    }
}

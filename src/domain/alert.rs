// ==========================================
// 产线生产跟踪 - 告警领域模型
// ==========================================
// 报工创建时由规则自动产生, 由外部看板消费与关闭
// 对齐: alert 表
// ==========================================

use crate::domain::types::{AlertKind, AlertPriority};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub record_id: String,
    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub message: String,
    pub created_at: NaiveDateTime,

    // ===== 关闭信息 =====
    pub is_resolved: bool,
    pub resolved_at: Option<NaiveDateTime>,
    pub resolved_by: Option<String>,
    pub resolution_comment: Option<String>,
}

impl Alert {
    /// 创建未关闭的告警
    pub fn new(
        alert_id: String,
        record_id: String,
        kind: AlertKind,
        message: String,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            alert_id,
            record_id,
            kind,
            priority: AlertPriority::default(),
            message,
            created_at,
            is_resolved: false,
            resolved_at: None,
            resolved_by: None,
            resolution_comment: None,
        }
    }

    pub fn with_priority(mut self, priority: AlertPriority) -> Self {
        self.priority = priority;
        self
    }

    /// 告警时长 (小时, 一位小数)
    ///
    /// 已关闭的按关闭时间计算, 否则按 now 计算
    pub fn age_hours(&self, now: NaiveDateTime) -> f64 {
        let end = match (self.is_resolved, self.resolved_at) {
            (true, Some(at)) => at,
            _ => now,
        };
        let secs = (end - self.created_at).num_seconds() as f64;
        (secs / 3600.0 * 10.0).round() / 10.0
    }

    /// 关闭告警
    ///
    /// 空白备注不覆盖已有备注
    pub fn resolve(&mut self, resolver: &str, comment: Option<String>, now: NaiveDateTime) {
        self.is_resolved = true;
        self.resolved_at = Some(now);
        self.resolved_by = Some(resolver.to_string());
        if let Some(c) = comment.filter(|c| !c.trim().is_empty()) {
            self.resolution_comment = Some(c);
        }
    }
}

// ==========================================
// 产线生产跟踪 - 报工自动告警规则
// ==========================================
// 规则 (新报工时评估一次):
// - 停机分钟 > 阈值 (默认 5)       → 停机告警
// - 废品盒数 > 阈值 (默认 10)      → 废品偏高告警
// ==========================================
// 发布: AlertPublisher trait, 外部看板实现; 发送失败不影响报工
// ==========================================

use crate::domain::alert::Alert;
use crate::domain::production::ProductionRecord;
use crate::domain::types::AlertKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// AlertRules - 告警阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRules {
    pub stoppage_threshold_minutes: u32,
    pub high_waste_threshold_boxes: u32,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self {
            stoppage_threshold_minutes: 5,
            high_waste_threshold_boxes: 10,
        }
    }
}

impl AlertRules {
    /// 评估新报工, 返回应产生的告警 (未持久化)
    pub fn evaluate(&self, record: &ProductionRecord) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let line = record.line_no.to_string();

        if record.stoppage_minutes > self.stoppage_threshold_minutes {
            let cause = record
                .stoppage_cause
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| crate::i18n::t("alert.cause_unspecified"));
            let message = crate::i18n::t_with_args(
                "alert.stoppage",
                &[
                    ("minutes", &record.stoppage_minutes.to_string()),
                    ("line", &line),
                    ("cause", &cause),
                ],
            );
            alerts.push(self.make_alert(record, AlertKind::Stoppage, message));
        }

        if record.waste_boxes > self.high_waste_threshold_boxes {
            let message = crate::i18n::t_with_args(
                "alert.high_waste",
                &[("waste", &record.waste_boxes.to_string()), ("line", &line)],
            );
            alerts.push(self.make_alert(record, AlertKind::HighWaste, message));
        }

        alerts
    }

    fn make_alert(&self, record: &ProductionRecord, kind: AlertKind, message: String) -> Alert {
        Alert::new(
            uuid::Uuid::new_v4().to_string(),
            record.record_id.clone(),
            kind,
            message,
            record.created_at,
        )
    }
}

// ==========================================
// 告警发布 Trait
// ==========================================

/// 告警发布者
///
/// 外部告警/看板系统实现此 trait 接收新告警
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: &Alert) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作发布者, 用于不需要推送的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpAlertPublisher;

impl AlertPublisher for NoOpAlertPublisher {
    fn publish(&self, alert: &Alert) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            alert_id = %alert.alert_id,
            kind = %alert.kind,
            "NoOpAlertPublisher: 跳过告警推送"
        );
        Ok(())
    }
}

/// 可选的告警发布者包装
///
/// 推送失败只记录日志, 不向调用方传播
#[derive(Clone, Default)]
pub struct OptionalAlertPublisher {
    inner: Option<Arc<dyn AlertPublisher>>,
}

impl OptionalAlertPublisher {
    pub fn new(inner: Option<Arc<dyn AlertPublisher>>) -> Self {
        Self { inner }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// 推送一组告警, 返回成功条数
    pub fn publish_all(&self, alerts: &[Alert]) -> usize {
        let Some(publisher) = &self.inner else {
            return 0;
        };

        let mut sent = 0;
        for alert in alerts {
            match publisher.publish(alert) {
                Ok(()) => sent += 1,
                Err(e) => tracing::warn!(
                    alert_id = %alert.alert_id,
                    kind = %alert.kind,
                    error = %e,
                    "告警推送失败，已忽略"
                ),
            }
        }
        sent
    }
}

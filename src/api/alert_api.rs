// ==========================================
// 产线生产跟踪 - 告警 API
// ==========================================
// 职责: 未关闭告警查询、关闭告警 (仅主管)
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::alert::Alert;
use crate::domain::user::Actor;
use crate::repository::alert_repo::AlertRepository;

/// 默认返回的未关闭告警条数
pub const DEFAULT_ALERT_LIMIT: usize = 10;

pub struct AlertApi {
    alert_repo: Arc<AlertRepository>,
}

impl AlertApi {
    pub fn new(alert_repo: Arc<AlertRepository>) -> Self {
        Self { alert_repo }
    }

    /// 最新的未关闭告警
    pub fn list_unresolved(&self, limit: Option<usize>) -> ApiResult<Vec<Alert>> {
        let limit = limit.unwrap_or(DEFAULT_ALERT_LIMIT);
        Ok(self.alert_repo.find_unresolved(limit)?)
    }

    pub fn count_unresolved(&self) -> ApiResult<u64> {
        Ok(self.alert_repo.count_unresolved()?)
    }

    pub fn alerts_for_record(&self, record_id: &str) -> ApiResult<Vec<Alert>> {
        Ok(self.alert_repo.find_by_record(record_id)?)
    }

    /// 关闭告警
    ///
    /// 已关闭的告警再次关闭时原样返回
    pub fn resolve_alert(
        &self,
        actor: &Actor,
        alert_id: &str,
        comment: Option<String>,
        now: NaiveDateTime,
    ) -> ApiResult<Alert> {
        if !actor.is_elevated {
            return Err(ApiError::Unauthorized(format!(
                "用户 {} 无权关闭告警",
                actor.username
            )));
        }

        let mut alert = self
            .alert_repo
            .find_by_id(alert_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Alert(id={})不存在", alert_id)))?;

        if alert.is_resolved {
            return Ok(alert);
        }

        alert.resolve(&actor.username, comment, now);
        self.alert_repo.update_resolution(&alert)?;

        tracing::info!(
            alert_id = %alert.alert_id,
            kind = %alert.kind,
            resolved_by = %actor.username,
            age_hours = alert.age_hours(now),
            "告警已关闭"
        );
        Ok(alert)
    }
}

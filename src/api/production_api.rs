// ==========================================
// 产线生产跟踪 - 生产报工与不合格品处置 API
// ==========================================
// 报工: 校验 → 班次准入 → 构建记录 → 告警规则 → 同事务落库 → 推送告警
// 修订: 本人 + 报工后 2 小时内, 处置字段不变
// 处置: 权限 → 表单解析 → 事务内 (读取 → 引擎处置 → 写回)
// 红线: 处置失败时库中记录保持不变 (事务回滚)
// ==========================================

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{validate_reading, DispositionForm};
use crate::config::ConfigManager;
use crate::domain::alert::Alert;
use crate::domain::production::{NewProductionReading, ProductionRecord};
use crate::domain::types::ShiftWindow;
use crate::domain::user::Actor;
use crate::engine::alerting::OptionalAlertPublisher;
use crate::engine::disposition::{DispositionOutcome, NonConformityDispositionEngine};
use crate::engine::shift_access::ShiftAccessEvaluator;
use crate::repository::production_repo::ProductionRecordRepository;
use crate::repository::user_profile_repo::UserProfileRepository;

/// 报工后允许本人修订的时长 (小时)
pub const AMEND_WINDOW_HOURS: i64 = 2;

/// 报工结果: 新记录及随之产生的告警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingCreated {
    pub record: ProductionRecord,
    pub alerts: Vec<Alert>,
}

// ==========================================
// ProductionApi - 生产 API
// ==========================================
pub struct ProductionApi {
    record_repo: Arc<ProductionRecordRepository>,
    user_repo: Arc<UserProfileRepository>,
    config: Arc<ConfigManager>,
    publisher: OptionalAlertPublisher,
    engine: NonConformityDispositionEngine,
    evaluator: ShiftAccessEvaluator,
}

impl ProductionApi {
    pub fn new(
        record_repo: Arc<ProductionRecordRepository>,
        user_repo: Arc<UserProfileRepository>,
        config: Arc<ConfigManager>,
        publisher: OptionalAlertPublisher,
    ) -> Self {
        Self {
            record_repo,
            user_repo,
            config,
            publisher,
            engine: NonConformityDispositionEngine::new(),
            evaluator: ShiftAccessEvaluator::new(),
        }
    }

    // ==========================================
    // 报工
    // ==========================================

    /// 操作员提交一条报工
    ///
    /// # 返回
    /// - Ok(ReadingCreated): 已落库的记录及告警
    /// - Err(InvalidQuantity): 不合格托数超过生产托数
    /// - Err(ShiftMismatch): 操作员所属班次与当前在岗班次不一致
    /// - Err(Unauthorized): 非主管且无班次分配或档案停用
    pub fn create_reading(
        &self,
        actor: &Actor,
        reading: NewProductionReading,
        now: NaiveDateTime,
    ) -> ApiResult<ReadingCreated> {
        validate_reading(&reading)?;

        let operator = actor.username.trim();
        if operator.is_empty() {
            return Err(ApiError::ValidationError("操作员不能为空".to_string()));
        }

        let active_shift = ShiftWindow::from_hour(now.hour());
        let profile = self.user_repo.find_by_username(operator)?;
        if let Some(assigned) = profile.as_ref().and_then(|p| p.shift) {
            if assigned != active_shift {
                return Err(ApiError::ShiftMismatch {
                    operator: operator.to_string(),
                    assigned: assigned.to_string(),
                    active: active_shift.to_string(),
                });
            }
        }
        if !self
            .evaluator
            .can_access_now(profile.as_ref(), now.hour(), actor.is_elevated)
        {
            let decision = self.evaluator.evaluate(actor, profile.as_ref(), now.hour());
            return Err(ApiError::Unauthorized(decision.message.unwrap_or_default()));
        }

        let rules = self
            .config
            .get_alert_rules()
            .map_err(|e| ApiError::InternalError(format!("告警阈值读取失败: {}", e)))?;

        let record = ProductionRecord::from_reading(
            uuid::Uuid::new_v4().to_string(),
            operator,
            active_shift,
            reading,
            now,
        );
        let alerts = rules.evaluate(&record);

        self.record_repo.insert_with_alerts(&record, &alerts)?;

        tracing::info!(
            record_id = %record.record_id,
            operator = %record.operator,
            shift = %record.shift,
            palettes = record.palettes_produced,
            non_conforming = record.palettes_non_conforming,
            status = %record.disposition_status,
            alerts = alerts.len(),
            "报工已保存"
        );

        let published = self.publisher.publish_all(&alerts);
        if self.publisher.is_enabled() {
            tracing::debug!(published, total = alerts.len(), "告警推送完成");
        }

        Ok(ReadingCreated { record, alerts })
    }

    /// 操作员修订自己的报工
    ///
    /// 已处置的记录不允许修改不合格托数, 废品盒数只增不减
    ///
    /// # 返回
    /// - Ok(ProductionRecord): 修订后的记录 (已提交)
    /// - Err(Unauthorized): 不是该记录的操作员
    /// - Err(ValidationError): 超过修订时限, 或改动了已处置记录的处置相关数量
    /// - Err(NotFound): 记录不存在
    pub fn amend_reading(
        &self,
        actor: &Actor,
        record_id: &str,
        reading: NewProductionReading,
        now: NaiveDateTime,
    ) -> ApiResult<ProductionRecord> {
        validate_reading(&reading)?;

        let amended = self.record_repo.update_in_tx(record_id, |record| {
            if record.operator != actor.username.trim() {
                tracing::warn!(user = %actor.username, record_id, "非本人尝试修订报工");
                return Err(ApiError::Unauthorized(format!(
                    "用户 {} 不能修订他人的报工",
                    actor.username
                )));
            }

            if now - record.recorded_at > Duration::hours(AMEND_WINDOW_HOURS) {
                return Err(ApiError::ValidationError(format!(
                    "报工已超过 {} 小时, 不能再修订",
                    AMEND_WINDOW_HOURS
                )));
            }

            if record.is_dispositioned()
                && reading.palettes_non_conforming != record.palettes_non_conforming
            {
                return Err(ApiError::ValidationError(format!(
                    "记录已处置 ({}), 不合格托数不能再修改",
                    record.disposition_status
                )));
            }

            if record.is_dispositioned() && reading.waste_boxes < record.waste_boxes {
                return Err(ApiError::ValidationError(format!(
                    "记录已处置, 废品盒数不能低于 {}",
                    record.waste_boxes
                )));
            }

            record.apply_amendment(reading, now);
            Ok(record.clone())
        })?;

        tracing::info!(
            record_id = %amended.record_id,
            operator = %amended.operator,
            palettes = amended.palettes_produced,
            non_conforming = amended.palettes_non_conforming,
            status = %amended.disposition_status,
            "报工已修订"
        );

        Ok(amended)
    }

    // ==========================================
    // 不合格品处置
    // ==========================================

    /// 主管对一条记录执行不合格品处置
    ///
    /// # 返回
    /// - Ok(DispositionOutcome): 处置摘要 (已提交)
    /// - Err(Unauthorized): 非主管
    /// - Err(InvalidQuantity / ExceedsAvailable / NothingToProcess): 记录保持不变
    /// - Err(NotFound): 记录不存在
    pub fn dispose_non_conforming(
        &self,
        actor: &Actor,
        record_id: &str,
        form: &DispositionForm,
        now: NaiveDateTime,
    ) -> ApiResult<DispositionOutcome> {
        if !actor.is_elevated {
            tracing::warn!(user = %actor.username, record_id, "非主管尝试处置不合格品");
            return Err(ApiError::Unauthorized(format!(
                "用户 {} 无权处置不合格品",
                actor.username
            )));
        }

        let request = form.into_request()?;

        self.record_repo.update_in_tx(record_id, |record| {
            self.engine
                .apply(record, &request, actor, now)
                .map_err(ApiError::from)
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_record(&self, record_id: &str) -> ApiResult<ProductionRecord> {
        self.record_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("ProductionRecord(id={})不存在", record_id)))
    }

    /// 操作员最近的报工
    pub fn recent_readings(&self, actor: &Actor, limit: usize) -> ApiResult<Vec<ProductionRecord>> {
        Ok(self
            .record_repo
            .find_recent_by_operator(&actor.username, limit)?)
    }
}

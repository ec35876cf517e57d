// ==========================================
// 产线生产跟踪 - 看板 API
// ==========================================
// 职责: 时间段 KPI、按班次产能汇总、待处置清单、当日健康度
// 时间段: [from, to)
// ==========================================

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::production::ProductionRecord;
use crate::engine::kpi::{KpiParams, ProductionKpis, ShiftProductivity, SystemHealth};
use crate::repository::alert_repo::AlertRepository;
use crate::repository::production_repo::ProductionRecordRepository;

/// 看板汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub kpis: ProductionKpis,
    pub by_shift: Vec<ShiftProductivity>,
    pub awaiting_disposition: usize,
}

pub struct DashboardApi {
    record_repo: Arc<ProductionRecordRepository>,
    alert_repo: Arc<AlertRepository>,
    config: Arc<ConfigManager>,
}

impl DashboardApi {
    pub fn new(
        record_repo: Arc<ProductionRecordRepository>,
        alert_repo: Arc<AlertRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            record_repo,
            alert_repo,
            config,
        }
    }

    fn day_range(day: NaiveDate) -> ApiResult<(NaiveDateTime, NaiveDateTime)> {
        let from = day
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ApiError::InternalError(format!("无效日期: {}", day)))?;
        Ok((from, from + Duration::days(1)))
    }

    fn kpi_params(&self) -> ApiResult<KpiParams> {
        self.config
            .get_kpi_params()
            .map_err(|e| ApiError::InternalError(format!("KPI 参数读取失败: {}", e)))
    }

    fn records_in_range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> ApiResult<Vec<ProductionRecord>> {
        if from >= to {
            return Err(ApiError::ValidationError(format!(
                "时间范围无效: from={} to={}",
                from, to
            )));
        }
        Ok(self.record_repo.find_by_range(from, to)?)
    }

    /// 时间段 KPI
    pub fn kpis(&self, from: NaiveDateTime, to: NaiveDateTime) -> ApiResult<ProductionKpis> {
        let records = self.records_in_range(from, to)?;
        Ok(ProductionKpis::from_records(&records, &self.kpi_params()?))
    }

    /// 时间段内按班次汇总
    pub fn shift_productivity(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> ApiResult<Vec<ShiftProductivity>> {
        let records = self.records_in_range(from, to)?;
        Ok(ShiftProductivity::by_shift(&records, &self.kpi_params()?))
    }

    /// 待处置记录 (最早的在前)
    pub fn awaiting_disposition(&self) -> ApiResult<Vec<ProductionRecord>> {
        Ok(self.record_repo.find_awaiting_disposition()?)
    }

    /// 某一自然日的看板汇总
    pub fn daily_summary(&self, day: NaiveDate) -> ApiResult<DashboardSummary> {
        let (from, to) = Self::day_range(day)?;

        let records = self.records_in_range(from, to)?;
        let params = self.kpi_params()?;

        Ok(DashboardSummary {
            from,
            to,
            kpis: ProductionKpis::from_records(&records, &params),
            by_shift: ShiftProductivity::by_shift(&records, &params),
            awaiting_disposition: self.record_repo.find_awaiting_disposition()?.len(),
        })
    }

    /// 某一自然日的运行健康度
    ///
    /// 活跃用户与活跃产线按当日有报工的操作员 / 产线去重计数
    pub fn system_health(&self, day: NaiveDate) -> ApiResult<SystemHealth> {
        let (from, to) = Self::day_range(day)?;
        let records = self.records_in_range(from, to)?;
        let health = SystemHealth::assess(&records, self.alert_repo.count_unresolved()?);

        tracing::debug!(
            day = %day,
            score = health.health_score,
            status = ?health.status,
            "健康度评估完成"
        );
        Ok(health)
    }
}

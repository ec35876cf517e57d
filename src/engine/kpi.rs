// ==========================================
// 产线生产跟踪 - KPI 汇总引擎
// ==========================================
// 输入: 一组生产记录 + KPI 参数
// 输出: 总量 / 合格率 / 生产率 / 缺陷率 / 综合效率, 以及按班次汇总
// 比率保留两位小数, 分母为 0 时取 0
// ==========================================

use crate::domain::production::{round2, ProductionRecord};
use crate::domain::types::ShiftWindow;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ==========================================
// KpiParams - KPI 参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiParams {
    /// 每条报工的理论目标托数
    pub target_palettes_per_record: u32,
    /// 缺陷率估算用的每托盒数
    pub boxes_per_palette_estimate: u32,
}

impl Default for KpiParams {
    fn default() -> Self {
        Self {
            target_palettes_per_record: 8,
            boxes_per_palette_estimate: 25,
        }
    }
}

// ==========================================
// ProductionKpis
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionKpis {
    pub record_count: u32,
    pub total_palettes: u64,
    pub total_non_conforming: u64,
    pub total_conforming: u64,
    pub total_waste_boxes: u64,
    pub total_stoppage_minutes: u64,
    pub avg_stoppage_minutes: f64,
    pub palettes_per_record: f64,
    pub productivity_rate: f64,  // %
    pub defect_rate: f64,        // %
    pub conformity_rate: f64,    // %
    pub overall_efficiency: f64, // %
}

impl ProductionKpis {
    pub fn from_records(records: &[ProductionRecord], params: &KpiParams) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let count = records.len() as u64;
        let total_palettes: u64 = records.iter().map(|r| r.palettes_produced as u64).sum();
        let total_nc: u64 = records
            .iter()
            .map(|r| r.palettes_non_conforming as u64)
            .sum();
        let total_waste: u64 = records.iter().map(|r| r.waste_boxes as u64).sum();
        let total_stoppage: u64 = records.iter().map(|r| r.stoppage_minutes as u64).sum();
        let total_conforming = total_palettes.saturating_sub(total_nc);

        let conformity_rate = ratio_pct(total_conforming, total_palettes);
        let target = count * params.target_palettes_per_record as u64;
        let productivity_rate = ratio_pct(total_palettes, target);
        let estimated_boxes = total_palettes * params.boxes_per_palette_estimate as u64;
        let defect_rate = ratio_pct(total_waste, estimated_boxes);
        let overall_efficiency = if productivity_rate > 0.0 && conformity_rate > 0.0 {
            productivity_rate * conformity_rate / 100.0
        } else {
            0.0
        };

        Self {
            record_count: records.len() as u32,
            total_palettes,
            total_non_conforming: total_nc,
            total_conforming,
            total_waste_boxes: total_waste,
            total_stoppage_minutes: total_stoppage,
            avg_stoppage_minutes: round2(total_stoppage as f64 / count as f64),
            palettes_per_record: round2(total_palettes as f64 / count as f64),
            productivity_rate: round2(productivity_rate),
            defect_rate: round2(defect_rate),
            conformity_rate: round2(conformity_rate),
            overall_efficiency: round2(overall_efficiency),
        }
    }
}

fn ratio_pct(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

// ==========================================
// ShiftProductivity - 按班次汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftProductivity {
    pub shift: ShiftWindow,
    pub operators: Vec<String>,
    pub total_palettes: u64,
    pub total_conforming: u64,
    pub total_non_conforming: u64,
    pub palettes_per_record: f64,
    pub conformity_rate: f64,
}

impl ShiftProductivity {
    /// 按班次分组汇总, 按总托数降序
    pub fn by_shift(records: &[ProductionRecord], params: &KpiParams) -> Vec<Self> {
        let mut groups: HashMap<ShiftWindow, Vec<ProductionRecord>> = HashMap::new();
        for r in records {
            groups.entry(r.shift).or_default().push(r.clone());
        }

        let mut result: Vec<Self> = groups
            .into_iter()
            .map(|(shift, group)| {
                let kpis = ProductionKpis::from_records(&group, params);
                let operators: BTreeSet<String> =
                    group.iter().map(|r| r.operator.clone()).collect();
                Self {
                    shift,
                    operators: operators.into_iter().collect(),
                    total_palettes: kpis.total_palettes,
                    total_conforming: kpis.total_conforming,
                    total_non_conforming: kpis.total_non_conforming,
                    palettes_per_record: kpis.palettes_per_record,
                    conformity_rate: kpis.conformity_rate,
                }
            })
            .collect();

        result.sort_by(|a, b| {
            b.total_palettes
                .cmp(&a.total_palettes)
                .then_with(|| a.shift.start_hour().cmp(&b.shift.start_hour()))
        });
        result
    }
}

// ==========================================
// SystemHealth - 当日运行健康度
// ==========================================
// 起始 100 分
// 未关闭告警 > 10 扣 20, > 5 扣 10
// 当日无报工扣 30, 少于 10 条扣 15
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => HealthStatus::Excellent,
            70..=89 => HealthStatus::Good,
            50..=69 => HealthStatus::Warning,
            _ => HealthStatus::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub health_score: u32,
    pub records_today: u32,
    pub unresolved_alerts: u64,
    pub active_users: u32,
    pub active_lines: u32,
}

impl SystemHealth {
    /// 由当日记录与未关闭告警数评估健康度
    pub fn assess(records_today: &[ProductionRecord], unresolved_alerts: u64) -> Self {
        let record_count = records_today.len() as u32;
        let mut score: u32 = 100;

        if unresolved_alerts > 10 {
            score -= 20;
        } else if unresolved_alerts > 5 {
            score -= 10;
        }

        if record_count == 0 {
            score -= 30;
        } else if record_count < 10 {
            score -= 15;
        }

        let users: BTreeSet<&str> = records_today.iter().map(|r| r.operator.as_str()).collect();
        let lines: BTreeSet<i32> = records_today.iter().map(|r| r.line_no).collect();

        Self {
            status: HealthStatus::from_score(score),
            health_score: score,
            records_today: record_count,
            unresolved_alerts,
            active_users: users.len() as u32,
            active_lines: lines.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::production::NewProductionReading;
    use chrono::NaiveDate;

    fn rec(op: &str, shift: ShiftWindow, produced: u32, nc: u32, waste: u32, stop: u32) -> ProductionRecord {
        ProductionRecord::from_reading(
            uuid::Uuid::new_v4().to_string(),
            op,
            shift,
            NewProductionReading {
                line_no: 1,
                product_name: "P".to_string(),
                palettes_produced: produced,
                palettes_non_conforming: nc,
                waste_boxes: waste,
                stoppage_minutes: stop,
                ..Default::default()
            },
            NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_empty_records_yield_zeroes() {
        let kpis = ProductionKpis::from_records(&[], &KpiParams::default());
        assert_eq!(kpis, ProductionKpis::default());
    }

    #[test]
    fn test_kpis() {
        let records = vec![
            rec("a", ShiftWindow::Morning, 10, 2, 50, 10),
            rec("b", ShiftWindow::Morning, 6, 0, 0, 0),
        ];
        let kpis = ProductionKpis::from_records(&records, &KpiParams::default());

        assert_eq!(kpis.record_count, 2);
        assert_eq!(kpis.total_palettes, 16);
        assert_eq!(kpis.total_conforming, 14);
        assert_eq!(kpis.conformity_rate, 87.5);
        assert_eq!(kpis.productivity_rate, 100.0);
        // 50 / (16 × 25) = 12.5%
        assert_eq!(kpis.defect_rate, 12.5);
        assert_eq!(kpis.overall_efficiency, 87.5);
        assert_eq!(kpis.avg_stoppage_minutes, 5.0);
        assert_eq!(kpis.palettes_per_record, 8.0);
    }

    #[test]
    fn test_by_shift_sorted_by_palettes() {
        let records = vec![
            rec("a", ShiftWindow::Morning, 4, 0, 0, 0),
            rec("b", ShiftWindow::Night, 9, 1, 0, 0),
            rec("c", ShiftWindow::Night, 3, 0, 0, 0),
            rec("b", ShiftWindow::Night, 1, 0, 0, 0),
        ];
        let stats = ShiftProductivity::by_shift(&records, &KpiParams::default());

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].shift, ShiftWindow::Night);
        assert_eq!(stats[0].total_palettes, 13);
        assert_eq!(stats[0].operators, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(stats[1].shift, ShiftWindow::Morning);
    }

    #[test]
    fn test_system_health_score() {
        let quiet = SystemHealth::assess(&[], 0);
        assert_eq!(quiet.health_score, 70);
        assert_eq!(quiet.status, HealthStatus::Good);
        assert_eq!(quiet.active_users, 0);

        let busy: Vec<ProductionRecord> = (0..10)
            .map(|_| rec("op1", ShiftWindow::Morning, 8, 0, 0, 0))
            .collect();
        let healthy = SystemHealth::assess(&busy, 3);
        assert_eq!(healthy.health_score, 100);
        assert_eq!(healthy.status, HealthStatus::Excellent);
        assert_eq!(healthy.active_users, 1);
        assert_eq!(healthy.active_lines, 1);

        assert_eq!(SystemHealth::assess(&busy[..2], 6).health_score, 75);
        let worst = SystemHealth::assess(&[], 11);
        assert_eq!(worst.health_score, 50);
        assert_eq!(worst.status, HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(49), HealthStatus::Critical);
        assert_eq!(
            serde_json::to_value(HealthStatus::Excellent).unwrap(),
            serde_json::json!("excellent")
        );
    }
}

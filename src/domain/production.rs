// ==========================================
// 产线生产跟踪 - 生产记录领域模型
// ==========================================
// 一条记录 = 操作员一次报工
// 生命周期: 创建 (状态由不合格托数初始化) → 主管处置一次 → 只修订不删除
// 对齐: production_record 表
// ==========================================

use crate::domain::types::{DispositionStatus, ShiftWindow};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionRecord - 生产记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    // ===== 主键与归属 =====
    pub record_id: String,
    pub recorded_at: NaiveDateTime,
    pub line_no: i32,
    pub product_name: String,
    pub operator: String,
    pub shift: ShiftWindow,

    // ===== 产量 =====
    pub palettes_produced: u32,
    pub palettes_non_conforming: u32, // <= palettes_produced
    pub boxes_produced: u32,
    pub waste_boxes: u32, // 处置只增不减

    // ===== 不合格品处置 =====
    pub nc_cause: Option<String>,
    pub disposition_status: DispositionStatus,
    pub nc_controlled_at: Option<NaiveDateTime>,
    pub nc_resolution_comment: Option<String>, // 审计备注, 追加不覆盖
    pub recovered_bundles: u32,                // 累计回收捆数

    // ===== 停机 =====
    pub stoppage_minutes: u32,
    pub stoppage_cause: Option<String>,

    // ===== 元数据 =====
    pub comments: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ==========================================
// NewProductionReading - 操作员报工输入
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProductionReading {
    pub line_no: i32,
    pub product_name: String,
    pub palettes_produced: u32,
    pub palettes_non_conforming: u32,
    pub boxes_produced: u32,
    pub waste_boxes: u32,
    pub nc_cause: Option<String>,
    pub stoppage_minutes: u32,
    pub stoppage_cause: Option<String>,
    pub comments: Option<String>,
}

impl ProductionRecord {
    /// 由报工输入构建新记录
    ///
    /// 处置状态按不合格托数初始化: 0 → Conforme, >0 → Pending
    pub fn from_reading(
        record_id: String,
        operator: &str,
        shift: ShiftWindow,
        reading: NewProductionReading,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            record_id,
            recorded_at: now,
            line_no: reading.line_no,
            product_name: reading.product_name,
            operator: operator.to_string(),
            shift,
            palettes_produced: reading.palettes_produced,
            palettes_non_conforming: reading.palettes_non_conforming,
            boxes_produced: reading.boxes_produced,
            waste_boxes: reading.waste_boxes,
            nc_cause: reading.nc_cause,
            disposition_status: DispositionStatus::initial_for(reading.palettes_non_conforming),
            nc_controlled_at: None,
            nc_resolution_comment: None,
            recovered_bundles: 0,
            stoppage_minutes: reading.stoppage_minutes,
            stoppage_cause: reading.stoppage_cause,
            comments: reading.comments,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否已经过主管处置
    pub fn is_dispositioned(&self) -> bool {
        self.nc_controlled_at.is_some()
    }

    /// 用修订后的报工覆盖产量字段
    ///
    /// 处置字段 (控制时间、处置说明、回收捆数) 不变;
    /// 尚未处置的记录按新的不合格托数重新初始化状态
    pub fn apply_amendment(&mut self, reading: NewProductionReading, now: NaiveDateTime) {
        self.line_no = reading.line_no;
        self.product_name = reading.product_name;
        self.palettes_produced = reading.palettes_produced;
        self.palettes_non_conforming = reading.palettes_non_conforming;
        self.boxes_produced = reading.boxes_produced;
        self.waste_boxes = reading.waste_boxes;
        self.nc_cause = reading.nc_cause;
        self.stoppage_minutes = reading.stoppage_minutes;
        self.stoppage_cause = reading.stoppage_cause;
        self.comments = reading.comments;
        if !self.is_dispositioned() {
            self.disposition_status =
                DispositionStatus::initial_for(self.palettes_non_conforming);
        }
        self.updated_at = now;
    }

    /// 合格托数
    pub fn conforming_palettes(&self) -> u32 {
        self.palettes_produced
            .saturating_sub(self.palettes_non_conforming)
    }

    /// 合格率 (百分比, 保留两位小数)
    pub fn conformity_rate(&self) -> f64 {
        if self.palettes_produced == 0 {
            return 0.0;
        }
        round2(self.conforming_palettes() as f64 / self.palettes_produced as f64 * 100.0)
    }

    pub fn has_stoppage(&self) -> bool {
        self.stoppage_minutes > 0
    }

    pub fn has_non_conforming(&self) -> bool {
        self.palettes_non_conforming > 0
    }

    /// 是否可进入处置流程
    pub fn can_be_processed(&self) -> bool {
        self.has_non_conforming() && self.disposition_status.is_processable()
    }

    /// 效率得分: 合格托数扣除停机惩罚
    ///
    /// 惩罚 = min(停机分钟 × 0.1, 合格托数 × 0.3)
    pub fn efficiency_score(&self) -> f64 {
        if self.palettes_produced == 0 {
            return 0.0;
        }
        let mut score = self.conforming_palettes() as f64;
        if self.stoppage_minutes > 0 {
            let penalty = (self.stoppage_minutes as f64 * 0.1).min(score * 0.3);
            score -= penalty;
        }
        round2(score.max(0.0))
    }
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ==========================================
// 产线生产跟踪 - 不合格品处置引擎
// ==========================================
// 状态机: Pending/Partial → Resolved | Rejected
//         Conforme/Resolved/Rejected 不再进入本引擎
// 换算: 1 托 = 72 捆, 1 捆 = 24 盒
// ==========================================
// 四种处置动作 (互斥):
// 1) AllConforming  全部判定合格, 全额回收
// 2) Detailed       整托 + 散捆回收, 散捆超出时静默截断并给出提示
// 3) PartialQuick   按捆回收, 超出时直接报错 (不截断)
// 4) Reject         全部确认不合格, 计入废品
// ==========================================
// 红线: 校验失败时记录不做任何修改
// ==========================================

use crate::domain::production::ProductionRecord;
use crate::domain::types::{DispositionStatus, BOXES_PER_BUNDLE, BUNDLES_PER_PALETTE};
use crate::domain::user::Actor;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// 拒收时每托计入的废品盒数
pub const REJECT_WASTE_BOXES_PER_PALETTE: u32 = 72;

// ==========================================
// DispositionAction - 处置动作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DispositionAction {
    AllConforming,
    Detailed {
        recovered_palettes: u32,
        recovered_bundles_partial: u32,
    },
    PartialQuick {
        recovered_bundles: u32,
    },
    Reject,
}

impl DispositionAction {
    pub fn kind_str(&self) -> &'static str {
        match self {
            DispositionAction::AllConforming => "all_conforming",
            DispositionAction::Detailed { .. } => "detailed",
            DispositionAction::PartialQuick { .. } => "partial_quick",
            DispositionAction::Reject => "reject",
        }
    }
}

/// 处置请求: 动作 + 可选的质检备注
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionRequest {
    pub action: DispositionAction,
    pub comment: Option<String>,
}

impl DispositionRequest {
    pub fn new(action: DispositionAction) -> Self {
        Self {
            action,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

// ==========================================
// DispositionError - 处置错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispositionError {
    #[error("无效数量: {0}")]
    InvalidQuantity(String),

    #[error("无待处置的不合格托: record_id={record_id}, status={status}, palettes_non_conforming={palettes_non_conforming}")]
    NothingToProcess {
        record_id: String,
        status: DispositionStatus,
        palettes_non_conforming: u32,
    },

    #[error("回收捆数超出可用数量: requested={requested}, available={available}")]
    ExceedsAvailable { requested: u32, available: u32 },
}

// ==========================================
// DispositionOutcome - 处置结果摘要
// ==========================================

/// 散捆截断提示 (仅 Detailed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClampWarning {
    pub requested: u32,
    pub applied: u32,
}

impl ClampWarning {
    pub fn message(&self) -> String {
        crate::i18n::t_with_args(
            "disposition.clamped",
            &[("applied", &self.applied.to_string())],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispositionOutcome {
    pub record_id: String,
    pub action: DispositionAction,
    pub palettes_processed: u32,
    pub bundles_available: u32,
    pub recovered_bundles: u32,
    pub unrecovered_bundles: u32,
    pub waste_boxes_added: u32,
    pub waste_boxes_before: u32,
    pub waste_boxes_after: u32,
    pub status: DispositionStatus,
    pub clamp_warning: Option<ClampWarning>,
    pub note: String,
}

// ==========================================
// DispositionCalculation - 纯计算结果
// ==========================================
// 守恒: recovered_bundles + unrecovered_bundles == bundles_available
// (Reject 除外: 不换算为捆, 直接按托计废)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispositionCalculation {
    pub bundles_available: u32,
    pub bundles_from_palettes: u32,
    pub recovered_bundles_partial: u32,
    pub recovered_bundles: u32,
    pub unrecovered_bundles: u32,
    pub waste_boxes_added: u32,
    pub status: DispositionStatus,
    pub clamp_warning: Option<ClampWarning>,
}

// ==========================================
// NonConformityDispositionEngine
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct NonConformityDispositionEngine;

impl NonConformityDispositionEngine {
    pub fn new() -> Self {
        Self
    }

    /// 对一条记录执行一次处置
    ///
    /// 成功时一次性写入所有字段并追加审计备注;
    /// 失败时记录保持原样
    #[instrument(skip(self, record, request), fields(record_id = %record.record_id, action = request.action.kind_str(), actor = %actor.username))]
    pub fn apply(
        &self,
        record: &mut ProductionRecord,
        request: &DispositionRequest,
        actor: &Actor,
        now: NaiveDateTime,
    ) -> Result<DispositionOutcome, DispositionError> {
        if !record.can_be_processed() {
            return Err(DispositionError::NothingToProcess {
                record_id: record.record_id.clone(),
                status: record.disposition_status,
                palettes_non_conforming: record.palettes_non_conforming,
            });
        }

        let nc_before = record.palettes_non_conforming;
        let calc = self.calculate(nc_before, &request.action)?;

        let waste_before = record.waste_boxes;
        let waste_after = checked_u32(
            waste_before as u64 + calc.waste_boxes_added as u64,
            "废品盒数",
        )?;
        let recovered_total = checked_u32(
            record.recovered_bundles as u64 + calc.recovered_bundles as u64,
            "回收捆数",
        )?;

        let note = build_note(actor, now, nc_before, &request.action, &calc, request.comment.as_deref());
        let resolution_comment = append_note(record.nc_resolution_comment.as_deref(), &note);

        // ===== 提交: 以下字段一起写入 =====
        record.palettes_non_conforming = 0;
        record.waste_boxes = waste_after;
        record.recovered_bundles = recovered_total;
        record.disposition_status = calc.status;
        record.nc_controlled_at = Some(now);
        record.nc_resolution_comment = Some(resolution_comment);
        record.updated_at = now;

        tracing::info!(
            record_id = %record.record_id,
            action = request.action.kind_str(),
            actor = %actor.username,
            waste_before,
            waste_after,
            recovered_bundles = calc.recovered_bundles,
            "不合格品处置完成"
        );

        Ok(DispositionOutcome {
            record_id: record.record_id.clone(),
            action: request.action,
            palettes_processed: nc_before,
            bundles_available: calc.bundles_available,
            recovered_bundles: calc.recovered_bundles,
            unrecovered_bundles: calc.unrecovered_bundles,
            waste_boxes_added: calc.waste_boxes_added,
            waste_boxes_before: waste_before,
            waste_boxes_after: waste_after,
            status: calc.status,
            clamp_warning: calc.clamp_warning,
            note,
        })
    }

    /// 纯计算: 给定不合格托数与动作, 求回收/废品数量与目标状态
    pub fn calculate(
        &self,
        palettes_non_conforming: u32,
        action: &DispositionAction,
    ) -> Result<DispositionCalculation, DispositionError> {
        let bundles_available = checked_u32(
            palettes_non_conforming as u64 * BUNDLES_PER_PALETTE as u64,
            "可用捆数",
        )?;

        match *action {
            DispositionAction::AllConforming => Ok(DispositionCalculation {
                bundles_available,
                bundles_from_palettes: bundles_available,
                recovered_bundles_partial: 0,
                recovered_bundles: bundles_available,
                unrecovered_bundles: 0,
                waste_boxes_added: 0,
                status: DispositionStatus::Resolved,
                clamp_warning: None,
            }),

            DispositionAction::Detailed {
                recovered_palettes,
                recovered_bundles_partial,
            } => {
                if recovered_palettes > palettes_non_conforming {
                    return Err(DispositionError::InvalidQuantity(format!(
                        "回收整托数 {} 不能超过不合格托数 {}",
                        recovered_palettes, palettes_non_conforming
                    )));
                }

                let bundles_from_palettes = recovered_palettes * BUNDLES_PER_PALETTE;
                let remaining = bundles_available - bundles_from_palettes;

                let (partial, clamp_warning) = if recovered_bundles_partial > remaining {
                    tracing::warn!(
                        requested = recovered_bundles_partial,
                        applied = remaining,
                        "散捆回收数超出剩余可用数量，已截断"
                    );
                    (
                        remaining,
                        Some(ClampWarning {
                            requested: recovered_bundles_partial,
                            applied: remaining,
                        }),
                    )
                } else {
                    (recovered_bundles_partial, None)
                };

                let unrecovered = bundles_available - bundles_from_palettes - partial;
                Ok(DispositionCalculation {
                    bundles_available,
                    bundles_from_palettes,
                    recovered_bundles_partial: partial,
                    recovered_bundles: bundles_from_palettes + partial,
                    unrecovered_bundles: unrecovered,
                    waste_boxes_added: bundles_to_boxes(unrecovered)?,
                    status: DispositionStatus::Resolved,
                    clamp_warning,
                })
            }

            DispositionAction::PartialQuick { recovered_bundles } => {
                if recovered_bundles == 0 {
                    return Err(DispositionError::InvalidQuantity(
                        "回收捆数必须为正数".to_string(),
                    ));
                }
                if recovered_bundles > bundles_available {
                    return Err(DispositionError::ExceedsAvailable {
                        requested: recovered_bundles,
                        available: bundles_available,
                    });
                }

                let unrecovered = bundles_available - recovered_bundles;
                Ok(DispositionCalculation {
                    bundles_available,
                    bundles_from_palettes: 0,
                    recovered_bundles_partial: recovered_bundles,
                    recovered_bundles,
                    unrecovered_bundles: unrecovered,
                    waste_boxes_added: bundles_to_boxes(unrecovered)?,
                    status: DispositionStatus::Resolved,
                    clamp_warning: None,
                })
            }

            DispositionAction::Reject => Ok(DispositionCalculation {
                bundles_available,
                bundles_from_palettes: 0,
                recovered_bundles_partial: 0,
                recovered_bundles: 0,
                unrecovered_bundles: bundles_available,
                waste_boxes_added: checked_u32(
                    palettes_non_conforming as u64 * REJECT_WASTE_BOXES_PER_PALETTE as u64,
                    "废品盒数",
                )?,
                status: DispositionStatus::Rejected,
                clamp_warning: None,
            }),
        }
    }
}

fn bundles_to_boxes(bundles: u32) -> Result<u32, DispositionError> {
    checked_u32(bundles as u64 * BOXES_PER_BUNDLE as u64, "废品盒数")
}

fn checked_u32(value: u64, what: &str) -> Result<u32, DispositionError> {
    u32::try_from(value)
        .map_err(|_| DispositionError::InvalidQuantity(format!("{}超出范围: {}", what, value)))
}

/// 生成单条审计备注
fn build_note(
    actor: &Actor,
    now: NaiveDateTime,
    nc_before: u32,
    action: &DispositionAction,
    calc: &DispositionCalculation,
    comment: Option<&str>,
) -> String {
    use crate::i18n::t_with_args;

    let waste = calc.waste_boxes_added.to_string();
    let unrecovered = calc.unrecovered_bundles.to_string();
    let mut body = match action {
        DispositionAction::AllConforming => t_with_args(
            "disposition.all_conforming",
            &[
                ("palettes", &nc_before.to_string()),
                ("bundles", &calc.recovered_bundles.to_string()),
            ],
        ),
        DispositionAction::Detailed {
            recovered_palettes, ..
        } => t_with_args(
            "disposition.detailed",
            &[
                ("palettes", &recovered_palettes.to_string()),
                ("partial", &calc.recovered_bundles_partial.to_string()),
                ("unrecovered", &unrecovered),
                ("waste", &waste),
            ],
        ),
        DispositionAction::PartialQuick { recovered_bundles } => t_with_args(
            "disposition.partial_quick",
            &[
                ("recovered", &recovered_bundles.to_string()),
                ("unrecovered", &unrecovered),
                ("waste", &waste),
            ],
        ),
        DispositionAction::Reject => t_with_args(
            "disposition.reject",
            &[("palettes", &nc_before.to_string()), ("waste", &waste)],
        ),
    };

    if let Some(c) = comment.map(str::trim).filter(|c| !c.is_empty()) {
        body.push_str(" - ");
        body.push_str(c);
    }

    t_with_args(
        "disposition.note",
        &[
            ("ts", &now.format("%Y-%m-%d %H:%M:%S").to_string()),
            ("actor", &actor.username),
            ("body", &body),
        ],
    )
}

/// 追加备注, 历史备注不覆盖
fn append_note(existing: Option<&str>, note: &str) -> String {
    match existing.map(str::trim_end).filter(|s| !s.is_empty()) {
        Some(prev) => format!("{}\n{}", prev, note),
        None => note.to_string(),
    }
}

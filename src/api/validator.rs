// ==========================================
// 产线生产跟踪 - 请求参数解析与校验
// ==========================================
// 职责: 表单原始字符串 → 强类型请求; 报工输入的业务校验
// 规则: 数量去空白后解析; 空串记 0; 负数或非整数报 InvalidQuantity
// ==========================================

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::production::NewProductionReading;
use crate::engine::disposition::{DispositionAction, DispositionRequest};

// ==========================================
// DispositionForm - 处置表单 (原始字段)
// ==========================================

/// 处置表单
///
/// 字段保持 Web 层提交的原样字符串, 由 `into_request` 统一解析。
/// 动作标签同时接受法文与英文写法。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionForm {
    pub action: String,
    #[serde(default)]
    pub recovered_palettes: String,
    #[serde(default)]
    pub recovered_bundles_partial: String,
    #[serde(default)]
    pub recovered_bundles: String,
    #[serde(default)]
    pub comment: String,
}

impl DispositionForm {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    /// 解析为处置请求
    ///
    /// 只解析当前动作用到的数量字段
    pub fn into_request(&self) -> ApiResult<DispositionRequest> {
        let action = match self.action.trim() {
            "toute_conforme" | "all_conforming" => DispositionAction::AllConforming,
            "traitement_detaille" | "detailed" => DispositionAction::Detailed {
                recovered_palettes: parse_quantity("recovered_palettes", &self.recovered_palettes)?,
                recovered_bundles_partial: parse_quantity(
                    "recovered_bundles_partial",
                    &self.recovered_bundles_partial,
                )?,
            },
            "partiel" | "partial_quick" => DispositionAction::PartialQuick {
                recovered_bundles: parse_quantity("recovered_bundles", &self.recovered_bundles)?,
            },
            "non_conforme" | "reject" => DispositionAction::Reject,
            other => {
                return Err(ApiError::InvalidQuantity(format!(
                    "未知的处置动作: '{}'",
                    other
                )))
            }
        };

        let mut request = DispositionRequest::new(action);
        let comment = self.comment.trim();
        if !comment.is_empty() {
            request = request.with_comment(comment);
        }
        Ok(request)
    }
}

/// 解析非负整数数量
///
/// # 返回
/// - 空白 → 0
/// - 非整数 / 负数 / 溢出 → InvalidQuantity
pub fn parse_quantity(field: &str, raw: &str) -> ApiResult<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    if trimmed.starts_with('-') {
        return Err(ApiError::InvalidQuantity(format!(
            "{} 不能为负数: '{}'",
            field, trimmed
        )));
    }

    trimmed.parse::<u32>().map_err(|_| {
        ApiError::InvalidQuantity(format!("{} 不是有效整数: '{}'", field, trimmed))
    })
}

// ==========================================
// 报工输入校验
// ==========================================

/// 校验操作员报工输入
pub fn validate_reading(reading: &NewProductionReading) -> ApiResult<()> {
    if reading.palettes_non_conforming > reading.palettes_produced {
        return Err(ApiError::InvalidQuantity(format!(
            "不合格托数 {} 不能超过生产托数 {}",
            reading.palettes_non_conforming, reading.palettes_produced
        )));
    }

    if reading.product_name.trim().is_empty() {
        return Err(ApiError::ValidationError("产品名称不能为空".to_string()));
    }

    if reading.line_no <= 0 {
        return Err(ApiError::ValidationError(format!(
            "产线编号无效: {}",
            reading.line_no
        )));
    }

    Ok(())
}

// ==========================================
// 产线生产跟踪 - 用户与班次分配
// ==========================================
// 管理员/主管 (elevated) 不受班次限制
// 未分配班次的普通用户无任何时段可进入
// ==========================================

use crate::domain::types::ShiftWindow;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Actor - 当前请求的操作人
// ==========================================
// 由 Web 层完成认证后传入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    pub is_elevated: bool, // 管理员/主管
}

impl Actor {
    /// 普通操作员
    pub fn operator(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_elevated: false,
        }
    }

    /// 主管/管理员
    pub fn supervisor(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_elevated: true,
        }
    }
}

// ==========================================
// UserShiftAssignment - 用户班次分配
// ==========================================
// 对齐: user_profile 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserShiftAssignment {
    pub username: String,
    pub shift: Option<ShiftWindow>, // None = 未分配
    pub is_active: bool,            // 停用的档案无权进入
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl UserShiftAssignment {
    pub fn new(username: impl Into<String>, shift: Option<ShiftWindow>, now: NaiveDateTime) -> Self {
        Self {
            username: username.into(),
            shift,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// 下一次可进入的时间标签, 未分配班次时为 None
    pub fn next_access_label(&self) -> Option<String> {
        self.shift.map(|s| s.start_label())
    }
}

// ==========================================
// 产线生产跟踪 - 班次准入 API
// ==========================================
// 职责: 加载用户班次档案 → 班次准入判定
// 时钟: 仅在此边界读取系统本地时间, 引擎只接收小时
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::ShiftWindow;
use crate::domain::user::{Actor, UserShiftAssignment};
use crate::engine::shift_access::{AccessDecision, ShiftAccessEvaluator};
use crate::repository::user_profile_repo::UserProfileRepository;

/// 当前本地时间 (Web 层在请求入口调用一次)
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

// ==========================================
// AccessApi - 班次准入 API
// ==========================================
pub struct AccessApi {
    user_repo: Arc<UserProfileRepository>,
    evaluator: ShiftAccessEvaluator,
}

impl AccessApi {
    pub fn new(user_repo: Arc<UserProfileRepository>) -> Self {
        Self {
            user_repo,
            evaluator: ShiftAccessEvaluator::new(),
        }
    }

    /// 判定用户此刻能否进入
    pub fn check_access(&self, actor: &Actor, now: NaiveDateTime) -> ApiResult<AccessDecision> {
        let assignment = self.user_repo.find_by_username(&actor.username)?;
        Ok(self
            .evaluator
            .evaluate(actor, assignment.as_ref(), now.hour()))
    }

    /// 判定并在拒绝时返回 Unauthorized
    pub fn require_access(&self, actor: &Actor, now: NaiveDateTime) -> ApiResult<AccessDecision> {
        let decision = self.check_access(actor, now)?;
        if decision.allowed {
            Ok(decision)
        } else {
            Err(ApiError::Unauthorized(
                decision.message.clone().unwrap_or_default(),
            ))
        }
    }

    /// 当前在岗的操作员档案
    pub fn active_operators(&self, now: NaiveDateTime) -> ApiResult<Vec<UserShiftAssignment>> {
        let profiles = self.user_repo.find_active()?;
        Ok(self
            .evaluator
            .active_operators(&profiles, now.hour())
            .into_iter()
            .cloned()
            .collect())
    }

    /// 分配 / 调整用户班次 (仅主管)
    pub fn assign_shift(
        &self,
        actor: &Actor,
        username: &str,
        shift: Option<ShiftWindow>,
        is_active: bool,
        now: NaiveDateTime,
    ) -> ApiResult<UserShiftAssignment> {
        if !actor.is_elevated {
            return Err(ApiError::Unauthorized(format!(
                "用户 {} 无权调整班次",
                actor.username
            )));
        }

        let username = username.trim();
        if username.is_empty() {
            return Err(ApiError::ValidationError("用户名不能为空".to_string()));
        }

        let mut profile = match self.user_repo.find_by_username(username)? {
            Some(existing) => existing,
            None => UserShiftAssignment::new(username, shift, now),
        };
        profile.shift = shift;
        profile.is_active = is_active;
        profile.updated_at = now;

        self.user_repo.upsert(&profile)?;
        tracing::info!(
            actor = %actor.username,
            user = %username,
            shift = ?shift,
            is_active,
            "班次分配已更新"
        );
        Ok(profile)
    }
}

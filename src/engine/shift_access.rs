// ==========================================
// 产线生产跟踪 - 班次准入引擎
// ==========================================
// 规则:
// 1) elevated (管理员/主管) 永远放行
// 2) 无班次分配或档案停用 → 拒绝
// 3) 当前小时落在所属班次窗口内 → 放行 (夜班跨零点)
// ==========================================
// 红线: 引擎不读取系统时钟, 小时由调用方显式传入
// ==========================================

use crate::domain::types::ShiftWindow;
use crate::domain::user::{Actor, UserShiftAssignment};
use serde::{Deserialize, Serialize};
use tracing::instrument;

// ==========================================
// AccessDecision - 准入判定结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub hour: u32,
    pub active_shift: ShiftWindow,       // 当前在岗班次
    pub user_shift: Option<ShiftWindow>, // 用户所属班次
    pub message: Option<String>,         // 拒绝时的提示 (本地化)
    pub next_access: Option<String>,     // 所属班次下次开放时刻, 如 "06h00"
}

// ==========================================
// ShiftAccessEvaluator - 班次准入判定
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftAccessEvaluator;

impl ShiftAccessEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// 判定用户当前能否进入
    pub fn can_access_now(
        &self,
        assignment: Option<&UserShiftAssignment>,
        current_hour: u32,
        is_elevated: bool,
    ) -> bool {
        if is_elevated {
            return true;
        }

        let Some(assignment) = assignment else {
            return false;
        };
        if !assignment.is_active {
            return false;
        }

        match assignment.shift {
            Some(window) => window.contains(current_hour),
            None => false,
        }
    }

    /// 当前小时对应的在岗班次
    pub fn active_shift_now(&self, current_hour: u32) -> ShiftWindow {
        ShiftWindow::from_hour(current_hour)
    }

    /// 完整判定, 拒绝时附带提示信息并记录告警日志
    #[instrument(skip(self, assignment), fields(user = %actor.username))]
    pub fn evaluate(
        &self,
        actor: &Actor,
        assignment: Option<&UserShiftAssignment>,
        current_hour: u32,
    ) -> AccessDecision {
        let active_shift = self.active_shift_now(current_hour);
        let user_shift = assignment.and_then(|a| a.shift);
        let allowed = self.can_access_now(assignment, current_hour, actor.is_elevated);

        let message = if allowed {
            None
        } else {
            let own = user_shift
                .map(|s| s.display_name())
                .unwrap_or_else(|| crate::i18n::t("shift.unassigned"));
            tracing::warn!(
                user = %actor.username,
                user_shift = ?user_shift,
                hour = current_hour,
                active_shift = %active_shift,
                "班次准入拒绝"
            );
            Some(crate::i18n::t_with_args(
                "access.denied",
                &[
                    ("hour", &current_hour.to_string()),
                    ("active", &active_shift.display_name()),
                    ("own", &own),
                ],
            ))
        };

        AccessDecision {
            allowed,
            hour: current_hour,
            active_shift,
            user_shift,
            message,
            next_access: assignment.and_then(|a| a.next_access_label()),
        }
    }

    /// 筛选当前小时可进入的在职档案
    pub fn active_operators<'a>(
        &self,
        assignments: &'a [UserShiftAssignment],
        current_hour: u32,
    ) -> Vec<&'a UserShiftAssignment> {
        assignments
            .iter()
            .filter(|a| a.is_active && self.can_access_now(Some(a), current_hour, false))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn assignment(shift: Option<ShiftWindow>) -> UserShiftAssignment {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        UserShiftAssignment::new("op1", shift, now)
    }

    #[test]
    fn test_elevated_always_allowed() {
        let eval = ShiftAccessEvaluator::new();
        let night = assignment(Some(ShiftWindow::Night));
        for hour in 0..24 {
            assert!(eval.can_access_now(None, hour, true));
            assert!(eval.can_access_now(Some(&night), hour, true));
        }
    }

    #[test]
    fn test_no_assignment_never_allowed() {
        let eval = ShiftAccessEvaluator::new();
        let unassigned = assignment(None);
        for hour in 0..24 {
            assert!(!eval.can_access_now(None, hour, false));
            assert!(!eval.can_access_now(Some(&unassigned), hour, false));
        }
    }

    #[test]
    fn test_inactive_profile_denied() {
        let eval = ShiftAccessEvaluator::new();
        let mut a = assignment(Some(ShiftWindow::Morning));
        a.is_active = false;
        assert!(!eval.can_access_now(Some(&a), 8, false));
        assert!(eval.can_access_now(Some(&a), 8, true));
    }

    #[test]
    fn test_night_shift_wraparound() {
        let eval = ShiftAccessEvaluator::new();
        let night = assignment(Some(ShiftWindow::Night));
        assert!(eval.can_access_now(Some(&night), 23, false));
        assert!(eval.can_access_now(Some(&night), 2, false));
        assert!(eval.can_access_now(Some(&night), 0, false));
        assert!(!eval.can_access_now(Some(&night), 6, false));
        assert!(!eval.can_access_now(Some(&night), 13, false));
    }

    #[test]
    fn test_access_matches_active_shift_for_every_hour() {
        let eval = ShiftAccessEvaluator::new();
        for hour in 0..24 {
            let active = eval.active_shift_now(hour);
            for window in ShiftWindow::ALL {
                let a = assignment(Some(window));
                assert_eq!(eval.can_access_now(Some(&a), hour, false), window == active);
            }
        }
    }

    #[test]
    fn test_evaluate_denied_carries_message() {
        let eval = ShiftAccessEvaluator::new();
        let morning = assignment(Some(ShiftWindow::Morning));
        let decision = eval.evaluate(&Actor::operator("op1"), Some(&morning), 15);
        assert!(!decision.allowed);
        assert_eq!(decision.active_shift, ShiftWindow::Afternoon);
        assert_eq!(decision.user_shift, Some(ShiftWindow::Morning));
        assert_eq!(decision.next_access.as_deref(), Some("06h00"));
        assert!(decision.message.unwrap().contains("15"));

        let unassigned = eval.evaluate(&Actor::operator("ghost"), None, 3);
        assert!(!unassigned.allowed);
        assert!(unassigned.next_access.is_none());
        assert_eq!(unassigned.active_shift, ShiftWindow::Night);

        let ok = eval.evaluate(&Actor::operator("op1"), Some(&morning), 6);
        assert!(ok.allowed);
        assert!(ok.message.is_none());
    }

    #[test]
    fn test_active_operators() {
        let eval = ShiftAccessEvaluator::new();
        let mut inactive = assignment(Some(ShiftWindow::Afternoon));
        inactive.username = "op3".to_string();
        inactive.is_active = false;
        let mut afternoon = assignment(Some(ShiftWindow::Afternoon));
        afternoon.username = "op2".to_string();
        let all = vec![assignment(Some(ShiftWindow::Morning)), afternoon, inactive];

        let active = eval.active_operators(&all, 16);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].username, "op2");
    }
}

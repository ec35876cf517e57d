// ==========================================
// 产线生产跟踪 - 领域类型定义
// ==========================================
// 班次窗口 / 不合格品处置状态 / 告警类型与优先级
// 换算常量: 1 托 = 72 捆, 1 捆 = 24 盒
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 换算常量 (固定业务比例, 全系统不变)
// ==========================================

/// 每托捆数
pub const BUNDLES_PER_PALETTE: u32 = 72;

/// 每捆盒数
pub const BOXES_PER_BUNDLE: u32 = 24;

/// 每托盒数 (72 × 24)
pub const BOXES_PER_PALETTE: u32 = BUNDLES_PER_PALETTE * BOXES_PER_BUNDLE;

// ==========================================
// 班次窗口 (Shift Window)
// ==========================================
// 三个固定窗口覆盖全天 24 小时, 无空隙无重叠
// 早班 [6,14) / 中班 [14,22) / 夜班 [22,24)∪[0,6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftWindow {
    Morning,   // 早班
    Afternoon, // 中班
    Night,     // 夜班 (跨零点)
}

impl ShiftWindow {
    /// 全部班次, 按一天内起始时间排列
    pub const ALL: [ShiftWindow; 3] = [
        ShiftWindow::Morning,
        ShiftWindow::Afternoon,
        ShiftWindow::Night,
    ];

    /// 判断小时是否落在本班次窗口内 (下界包含, 上界不包含)
    pub fn contains(&self, hour: u32) -> bool {
        match self {
            ShiftWindow::Morning => (6..14).contains(&hour),
            ShiftWindow::Afternoon => (14..22).contains(&hour),
            ShiftWindow::Night => hour >= 22 || hour < 6,
        }
    }

    /// 按小时确定当前班次
    ///
    /// 非法小时 (>= 24) 落入夜班分支
    pub fn from_hour(hour: u32) -> Self {
        if (6..14).contains(&hour) {
            ShiftWindow::Morning
        } else if (14..22).contains(&hour) {
            ShiftWindow::Afternoon
        } else {
            ShiftWindow::Night
        }
    }

    /// 班次起始小时
    pub fn start_hour(&self) -> u32 {
        match self {
            ShiftWindow::Morning => 6,
            ShiftWindow::Afternoon => 14,
            ShiftWindow::Night => 22,
        }
    }

    /// 下一次可进入的时间标签 (如 "06h00")
    pub fn start_label(&self) -> String {
        format!("{:02}h00", self.start_hour())
    }

    /// 数据库存储编码
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShiftWindow::Morning => "6-14",
            ShiftWindow::Afternoon => "14-22",
            ShiftWindow::Night => "22-6",
        }
    }

    /// 从数据库编码解析
    ///
    /// 兼容 "06-14" 这类补零写法
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim() {
            "6-14" | "06-14" => Some(ShiftWindow::Morning),
            "14-22" => Some(ShiftWindow::Afternoon),
            "22-6" | "22-06" => Some(ShiftWindow::Night),
            _ => None,
        }
    }

    /// 本地化显示名称
    pub fn display_name(&self) -> String {
        let key = match self {
            ShiftWindow::Morning => "shift.morning",
            ShiftWindow::Afternoon => "shift.afternoon",
            ShiftWindow::Night => "shift.night",
        };
        crate::i18n::t(key)
    }
}

impl fmt::Display for ShiftWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 不合格品处置状态 (Disposition Status)
// ==========================================
// Pending/Partial 可处置; Conforme/Resolved/Rejected 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispositionStatus {
    Pending,  // 待处置
    Partial,  // 处置中
    Conforme, // 创建时即全部合格
    Resolved, // 已处置完成
    Rejected, // 确认不合格
}

impl DispositionStatus {
    /// 新建记录的初始状态
    pub fn initial_for(palettes_non_conforming: u32) -> Self {
        if palettes_non_conforming == 0 {
            DispositionStatus::Conforme
        } else {
            DispositionStatus::Pending
        }
    }

    /// 是否仍可被处置引擎处理
    pub fn is_processable(&self) -> bool {
        matches!(self, DispositionStatus::Pending | DispositionStatus::Partial)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_processable()
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            DispositionStatus::Pending => "pending",
            DispositionStatus::Partial => "partial",
            DispositionStatus::Conforme => "conforme",
            DispositionStatus::Resolved => "resolved",
            DispositionStatus::Rejected => "rejected",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DispositionStatus::Pending),
            "partial" => Some(DispositionStatus::Partial),
            "conforme" => Some(DispositionStatus::Conforme),
            "resolved" => Some(DispositionStatus::Resolved),
            "rejected" => Some(DispositionStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for DispositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 告警类型 (Alert Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    Stoppage,    // 停机
    HighWaste,   // 废品偏高
    Quality,     // 质量问题
    Maintenance, // 需要维护
    Conformity,  // 不合格
    Performance, // 绩效下降
    Other,       // 其他
}

impl AlertKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlertKind::Stoppage => "stoppage",
            AlertKind::HighWaste => "high_waste",
            AlertKind::Quality => "quality",
            AlertKind::Maintenance => "maintenance",
            AlertKind::Conformity => "conformity",
            AlertKind::Performance => "performance",
            AlertKind::Other => "other",
        }
    }

    /// 未知编码按 Other 处理
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "stoppage" => AlertKind::Stoppage,
            "high_waste" => AlertKind::HighWaste,
            "quality" => AlertKind::Quality,
            "maintenance" => AlertKind::Maintenance,
            "conformity" => AlertKind::Conformity,
            "performance" => AlertKind::Performance,
            _ => AlertKind::Other,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 告警优先级 (Alert Priority)
// ==========================================
// 顺序: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl AlertPriority {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlertPriority::Low => "low",
            AlertPriority::Medium => "medium",
            AlertPriority::High => "high",
            AlertPriority::Critical => "critical",
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "low" => AlertPriority::Low,
            "high" => AlertPriority::High,
            "critical" => AlertPriority::Critical,
            _ => AlertPriority::Medium,
        }
    }
}

impl fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 销售导入 - 员工解析
// ==========================================
// 职责: 销售员列 / 平台标签内嵌标识 → 名册用户
// 统一入口: 两种来源走同一查找路径
// ==========================================

use crate::domain::roster::{Roster, RosterEntry};
use once_cell::sync::Lazy;
use regex::Regex;

static STAFF_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bREFERRED_BY_STAFF_(\d+)\b").expect("valid staff tag regex")
});

/// 从标签文本中提取员工标识（取第一个匹配）
pub fn extract_staff_tag(tags: &str) -> Option<&str> {
    STAFF_TAG
        .captures(tags)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// ==========================================
// StaffLookup - 查找结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffLookup<'a> {
    Resolved(&'a RosterEntry),
    /// 有候选值但名册无匹配（值用于诊断）
    Unknown(String),
    /// 销售员列与标签均为空
    Missing,
}

pub struct StaffResolver<'a> {
    roster: &'a Roster,
}

impl<'a> StaffResolver<'a> {
    pub fn new(roster: &'a Roster) -> Self {
        Self { roster }
    }

    /// 解析员工
    ///
    /// # 顺序
    /// 1. 销售员列：名称或标识精确匹配（大小写不敏感）
    /// 2. 标签 REFERRED_BY_STAFF_<digits>：数字先作为标识匹配，再作为用户 ID 匹配
    ///
    /// 两者都未命中时，诊断值优先取销售员列
    pub fn resolve(&self, salesperson: Option<&str>, tags: Option<&str>) -> StaffLookup<'a> {
        let salesperson = salesperson.map(str::trim).filter(|s| !s.is_empty());

        if let Some(name) = salesperson {
            if let Some(entry) = self.roster.lookup(name) {
                return StaffLookup::Resolved(entry);
            }
        }

        let tag_id = tags.and_then(extract_staff_tag);
        if let Some(id) = tag_id {
            if let Some(entry) = self.lookup_tag_id(id) {
                return StaffLookup::Resolved(entry);
            }
        }

        match (salesperson, tag_id) {
            (Some(name), _) => StaffLookup::Unknown(name.to_string()),
            (None, Some(id)) => StaffLookup::Unknown(format!("REFERRED_BY_STAFF_{}", id)),
            (None, None) => StaffLookup::Missing,
        }
    }

    fn lookup_tag_id(&self, id: &str) -> Option<&'a RosterEntry> {
        let roster = self.roster;
        roster
            .lookup(id)
            .or_else(|| roster.lookup(&format!("REFERRED_BY_STAFF_{}", id)))
            .or_else(|| id.parse::<i64>().ok().and_then(|uid| roster.lookup_user_id(uid)))
    }
}

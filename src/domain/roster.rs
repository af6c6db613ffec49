// ==========================================
// 销售导入 - 员工名册
// ==========================================
// 用途: 外部用户目录提供，导入期间只读
// 匹配: 名称 / 标识（邮箱、平台标签）小写精确匹配
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub identifier: String,
    pub display_name: String,
    pub user_id: i64,
}

// ==========================================
// Roster - 名册索引
// ==========================================
// 键: 小写、去空白后的名称或标识
#[derive(Debug, Clone, Default)]
pub struct Roster {
    by_key: HashMap<String, RosterEntry>,
    by_user_id: HashMap<i64, RosterEntry>,
}

impl Roster {
    /// 由名册条目构建；identifier 与 display_name 均入索引
    ///
    /// 同一键重复出现时保留先出现的条目
    pub fn from_entries(entries: impl IntoIterator<Item = RosterEntry>) -> Self {
        let mut roster = Roster::default();
        for entry in entries {
            for key in [&entry.identifier, &entry.display_name] {
                let key = normalize_key(key);
                if !key.is_empty() {
                    roster.by_key.entry(key).or_insert_with(|| entry.clone());
                }
            }
            roster.by_user_id.entry(entry.user_id).or_insert(entry);
        }
        roster
    }

    /// 由外部目录的 "标识 → 用户 ID" 映射构建
    ///
    /// display_name 取同一用户 ID 下字典序最小的键，保证结果确定
    pub fn from_mapping(mapping: &HashMap<String, i64>) -> Self {
        let mut keys: Vec<(&String, &i64)> = mapping.iter().collect();
        keys.sort();

        let mut display_names: HashMap<i64, &String> = HashMap::new();
        for (key, user_id) in &keys {
            display_names.entry(**user_id).or_insert(*key);
        }

        let entries: Vec<RosterEntry> = keys
            .iter()
            .map(|(key, user_id)| RosterEntry {
                identifier: (*key).clone(),
                display_name: display_names
                    .get(*user_id)
                    .map(|name| (*name).clone())
                    .unwrap_or_else(|| (*key).clone()),
                user_id: **user_id,
            })
            .collect();
        Self::from_entries(entries)
    }

    /// 由 JSON 构建：条目数组，或 "标识 → 用户 ID" 对象
    pub fn from_json_str(json: &str) -> ImportResult<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RosterDocument {
            Entries(Vec<RosterEntry>),
            Mapping(HashMap<String, i64>),
        }

        let document: RosterDocument = serde_json::from_str(json)
            .map_err(|e| ImportError::RosterParseError(e.to_string()))?;
        Ok(match document {
            RosterDocument::Entries(entries) => Self::from_entries(entries),
            RosterDocument::Mapping(mapping) => Self::from_mapping(&mapping),
        })
    }

    pub fn lookup(&self, value: &str) -> Option<&RosterEntry> {
        self.by_key.get(&normalize_key(value))
    }

    pub fn lookup_user_id(&self, user_id: i64) -> Option<&RosterEntry> {
        self.by_user_id.get(&user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.by_user_id.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_user_id.len()
    }
}

fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

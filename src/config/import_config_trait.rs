// ==========================================
// 销售导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use serde::{Deserialize, Serialize};

// ==========================================
// DateOrder - 日/月歧义时的固定假设
// ==========================================
// 日、月均 <= 12 时无法从值本身还原区域设置，按此配置解释
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateOrder {
    #[default]
    #[serde(rename = "DMY")]
    DayFirst,
    #[serde(rename = "MDY")]
    MonthFirst,
}

// ==========================================
// DelimiterSetting - 文本分隔符
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelimiterSetting {
    #[default]
    Auto,
    Fixed(u8),
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager
pub trait ImportConfigReader: Send + Sync {
    /// 同时存在净额与总额列时，净额作为 total_amount
    ///
    /// # 默认值
    /// - true
    fn get_prefer_net_over_gross(&self) -> ImportResult<bool>;

    /// 日期歧义（日、月均 <= 12）时的解释顺序
    ///
    /// # 默认值
    /// - DMY
    fn get_ambiguous_date_order(&self) -> ImportResult<DateOrder>;

    /// 分隔文本的分隔符（auto = 按首行自动探测）
    ///
    /// # 默认值
    /// - auto
    fn get_csv_delimiter(&self) -> ImportResult<DelimiterSetting>;
}

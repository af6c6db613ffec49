// ==========================================
// 销售导入 - 导入参数快照
// ==========================================
// 导入开始前一次性读取，运行期间不变
// ==========================================

use crate::config::import_config_trait::{DateOrder, DelimiterSetting, ImportConfigReader};
use crate::importer::error::ImportResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    pub prefer_net_over_gross: bool,
    pub date_order: DateOrder,
    pub delimiter: DelimiterSetting,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            prefer_net_over_gross: true,
            date_order: DateOrder::DayFirst,
            delimiter: DelimiterSetting::Auto,
        }
    }
}

impl ImportSettings {
    /// 从配置读取器加载快照
    pub fn load<C: ImportConfigReader + ?Sized>(config: &C) -> ImportResult<Self> {
        Ok(Self {
            prefer_net_over_gross: config.get_prefer_net_over_gross()?,
            date_order: config.get_ambiguous_date_order()?,
            delimiter: config.get_csv_delimiter()?,
        })
    }

    pub fn with_prefer_net_over_gross(mut self, prefer: bool) -> Self {
        self.prefer_net_over_gross = prefer;
        self
    }

    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    pub fn with_delimiter(mut self, delimiter: DelimiterSetting) -> Self {
        self.delimiter = delimiter;
        self
    }
}

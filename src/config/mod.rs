// ==========================================
// 销售导入 - 配置层
// ==========================================
// 职责: 导入配置读取（净额优先 / 日期歧义顺序 / 分隔符）
// 存储: 内存 key-value，可由 JSON 加载
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod import_settings;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{DateOrder, DelimiterSetting, ImportConfigReader};
pub use import_settings::ImportSettings;

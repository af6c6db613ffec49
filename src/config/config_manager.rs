// ==========================================
// 销售导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: 内存 key-value（可由 JSON 对象加载）
// ==========================================

use crate::config::import_config_trait::{DateOrder, DelimiterSetting, ImportConfigReader};
use crate::importer::error::{ImportError, ImportResult};
use std::collections::BTreeMap;
use std::path::Path;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const PREFER_NET_OVER_GROSS: &str = "import.prefer_net_over_gross";
    pub const AMBIGUOUS_DATE_ORDER: &str = "import.ambiguous_date_order";
    pub const CSV_DELIMITER: &str = "import.csv_delimiter";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: BTreeMap<String, String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象加载配置
    ///
    /// 值可为字符串、布尔或数字，统一按字符串存储
    pub fn from_json_str(json: &str) -> ImportResult<Self> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;

        let mut values = BTreeMap::new();
        for (key, value) in raw {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                other => {
                    return Err(ImportError::ConfigValueError {
                        key,
                        value: other.to_string(),
                        message: "expected string, boolean or number".to_string(),
                    })
                }
            };
            values.insert(key, text);
        }

        Ok(Self { values })
    }

    /// 从 JSON 文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn get_config_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set_config_value(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// 读取配置值，带默认值
    fn get_config_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_config_value(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        Ok(serde_json::to_string(&self.values)?)
    }
}

impl ImportConfigReader for ConfigManager {
    fn get_prefer_net_over_gross(&self) -> ImportResult<bool> {
        let value = self.get_config_or_default(config_keys::PREFER_NET_OVER_GROSS, "true");
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => Ok(true),
            "false" | "0" | "no" | "n" => Ok(false),
            _ => Err(ImportError::ConfigValueError {
                key: config_keys::PREFER_NET_OVER_GROSS.to_string(),
                value: value.to_string(),
                message: "expected a boolean".to_string(),
            }),
        }
    }

    fn get_ambiguous_date_order(&self) -> ImportResult<DateOrder> {
        let value = self.get_config_or_default(config_keys::AMBIGUOUS_DATE_ORDER, "DMY");
        match value.to_uppercase().as_str() {
            "DMY" | "DD/MM" | "DAY_FIRST" => Ok(DateOrder::DayFirst),
            "MDY" | "MM/DD" | "MONTH_FIRST" => Ok(DateOrder::MonthFirst),
            _ => Err(ImportError::ConfigValueError {
                key: config_keys::AMBIGUOUS_DATE_ORDER.to_string(),
                value: value.to_string(),
                message: "expected DMY or MDY".to_string(),
            }),
        }
    }

    fn get_csv_delimiter(&self) -> ImportResult<DelimiterSetting> {
        // 分隔符不做 trim，制表符需原样保留
        let value = self
            .get_config_value(config_keys::CSV_DELIMITER)
            .filter(|v| !v.is_empty())
            .unwrap_or("auto");

        if value.eq_ignore_ascii_case("auto") {
            return Ok(DelimiterSetting::Auto);
        }
        if value == "\\t" || value.eq_ignore_ascii_case("tab") {
            return Ok(DelimiterSetting::Fixed(b'\t'));
        }
        match value.as_bytes() {
            [byte] if !byte.is_ascii_alphanumeric() && *byte != b'"' => {
                Ok(DelimiterSetting::Fixed(*byte))
            }
            _ => Err(ImportError::ConfigValueError {
                key: config_keys::CSV_DELIMITER.to_string(),
                value: value.to_string(),
                message: "expected a single non-alphanumeric ASCII character or 'auto'".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportSettings;

    #[test]
    fn test_defaults_when_empty() {
        let config = ConfigManager::new();
        let settings = ImportSettings::load(&config).unwrap();

        assert!(settings.prefer_net_over_gross);
        assert_eq!(settings.date_order, DateOrder::DayFirst);
        assert_eq!(settings.delimiter, DelimiterSetting::Auto);
    }

    #[test]
    fn test_from_json_mixed_value_types() {
        let config = ConfigManager::from_json_str(
            r#"{"import.prefer_net_over_gross": false, "import.ambiguous_date_order": "mdy", "import.csv_delimiter": ";"}"#,
        )
        .unwrap();
        let settings = ImportSettings::load(&config).unwrap();

        assert!(!settings.prefer_net_over_gross);
        assert_eq!(settings.date_order, DateOrder::MonthFirst);
        assert_eq!(settings.delimiter, DelimiterSetting::Fixed(b';'));
    }

    #[test]
    fn test_tab_delimiter_aliases() {
        let mut config = ConfigManager::new();
        config.set_config_value(config_keys::CSV_DELIMITER, "\t");
        assert_eq!(config.get_csv_delimiter().unwrap(), DelimiterSetting::Fixed(b'\t'));

        config.set_config_value(config_keys::CSV_DELIMITER, "tab");
        assert_eq!(config.get_csv_delimiter().unwrap(), DelimiterSetting::Fixed(b'\t'));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ConfigManager::new();
        config.set_config_value(config_keys::AMBIGUOUS_DATE_ORDER, "YMD");
        assert!(matches!(
            config.get_ambiguous_date_order(),
            Err(ImportError::ConfigValueError { .. })
        ));

        config.set_config_value(config_keys::CSV_DELIMITER, "ab");
        assert!(config.get_csv_delimiter().is_err());

        assert!(ConfigManager::from_json_str(r#"{"import.csv_delimiter": [","]}"#).is_err());
    }
}

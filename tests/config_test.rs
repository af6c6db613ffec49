// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取功能的正确性
// ==========================================


use sales_import::config::{
    config_keys, ConfigManager, DateOrder, DelimiterSetting, ImportConfigReader, ImportSettings,
};
use sales_import::importer::ImportError;
use test_helpers::write_temp_file;

#[test]
fn test_config_manager_defaults() {
    let config_manager = ConfigManager::new();

    assert!(config_manager.get_prefer_net_over_gross().unwrap());
    assert_eq!(
        config_manager.get_ambiguous_date_order().unwrap(),
        DateOrder::DayFirst
    );
    assert_eq!(
        config_manager.get_csv_delimiter().unwrap(),
        DelimiterSetting::Auto
    );
}

#[test]
fn test_load_from_json_file() {
    let file = write_temp_file(
        ".json",
        r#"{
            "import.prefer_net_over_gross": "no",
            "import.ambiguous_date_order": "MM/DD",
            "import.csv_delimiter": "tab"
        }"#,
    );

    let config_manager = ConfigManager::from_json_file(file.path()).unwrap();
    let settings = ImportSettings::load(&config_manager).unwrap();

    assert!(!settings.prefer_net_over_gross);
    assert_eq!(settings.date_order, DateOrder::MonthFirst);
    assert_eq!(settings.delimiter, DelimiterSetting::Fixed(b'\t'));
}

#[test]
fn test_missing_config_file() {
    let result = ConfigManager::from_json_file("/nonexistent/import.json");
    assert!(matches!(result, Err(ImportError::FileNotFound(_))));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let result = ConfigManager::from_json_str("{ not json");
    assert!(matches!(result, Err(ImportError::ConfigParseError(_))));
}

#[test]
fn test_invalid_boolean_names_key_and_value() {
    let mut config_manager = ConfigManager::new();
    config_manager.set_config_value(config_keys::PREFER_NET_OVER_GROSS, "sometimes");

    let err = ImportSettings::load(&config_manager).unwrap_err();
    let message = err.to_string();
    assert!(message.contains(config_keys::PREFER_NET_OVER_GROSS));
    assert!(message.contains("sometimes"));
}

#[test]
fn test_snapshot_round_trips_values() {
    let mut config_manager = ConfigManager::new();
    config_manager.set_config_value(config_keys::CSV_DELIMITER, ";");

    let snapshot = config_manager.get_config_snapshot().unwrap();
    let reloaded = ConfigManager::from_json_str(&snapshot).unwrap();

    assert_eq!(reloaded.get_config_value(config_keys::CSV_DELIMITER), Some(";"));
    assert_eq!(
        reloaded.get_csv_delimiter().unwrap(),
        DelimiterSetting::Fixed(b';')
    );
}

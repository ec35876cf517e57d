// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 文件库上的配置读写、默认值回退
// ==========================================


use production_tracking::config::{config_keys, ConfigManager};
use production_tracking::engine::{AlertRules, KpiParams};
use test_helpers::create_test_db;

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    assert!(ConfigManager::new(&db_path).is_ok());
}

#[test]
fn test_defaults_on_empty_database() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    assert_eq!(config.get_alert_rules().unwrap(), AlertRules::default());
    assert_eq!(config.get_kpi_params().unwrap(), KpiParams::default());
    assert_eq!(config.get_ui_locale().unwrap(), "zh-CN");
    assert!(config.get_config_snapshot().unwrap().is_empty());
}

#[test]
fn test_values_persist_across_managers() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    {
        let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
        config
            .set_global_config_value(config_keys::TARGET_PALETTES_PER_RECORD, "12")
            .unwrap();
        config
            .set_global_config_value(config_keys::UI_LOCALE, "fr")
            .unwrap();
    }

    let config = ConfigManager::new(&db_path).expect("Failed to reopen ConfigManager");
    let params = config.get_kpi_params().unwrap();
    assert_eq!(params.target_palettes_per_record, 12);
    assert_eq!(params.boxes_per_palette_estimate, 25);
    assert_eq!(config.get_ui_locale().unwrap(), "fr");
}

#[test]
fn test_malformed_value_falls_back_to_default() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config
        .set_global_config_value(config_keys::BOXES_PER_PALETTE_ESTIMATE, "-3")
        .unwrap();
    config
        .set_global_config_value(config_keys::STOPPAGE_THRESHOLD_MINUTES, " 8 ")
        .unwrap();

    assert_eq!(config.get_kpi_params().unwrap().boxes_per_palette_estimate, 25);
    assert_eq!(config.get_alert_rules().unwrap().stoppage_threshold_minutes, 8);
}

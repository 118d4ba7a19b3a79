// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试范围:
// 1. 配置读写往返与更新
// 2. 类型化读取的回退语义（缺失/格式错误）
// 3. 配置清单与快照
// ==========================================

mod helpers;

use helpers::api_test_helper::ApiTestEnv;
use kitting_mrp::config::config_keys;

#[test]
fn test_config_读写往返() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let config = &env.config_manager;

    assert!(config.get_config_value("no.such.key").unwrap().is_none());

    config
        .set_config_value("catalog.default_page_size", "50", Some("每页产品数"))
        .unwrap();
    assert_eq!(
        config.get_config_value("catalog.default_page_size").unwrap(),
        Some("50".to_string())
    );

    // 同键再次写入为覆盖
    config
        .set_config_value("catalog.default_page_size", "80", None)
        .unwrap();
    assert_eq!(
        config.get_config_value("catalog.default_page_size").unwrap(),
        Some("80".to_string())
    );
}

#[test]
fn test_config_整数读取与回退() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let config = &env.config_manager;

    // 键缺失回退默认值
    assert_eq!(config.get_i64_or_default("import.max_batch_rows", 10_000).unwrap(), 10_000);

    // 正常解析
    config
        .set_config_value("import.max_batch_rows", "500", None)
        .unwrap();
    assert_eq!(config.get_i64_or_default("import.max_batch_rows", 10_000).unwrap(), 500);

    // 格式错误回退默认值（不报错）
    config
        .set_config_value("import.max_batch_rows", "abc", None)
        .unwrap();
    assert_eq!(config.get_i64_or_default("import.max_batch_rows", 10_000).unwrap(), 10_000);
}

#[test]
fn test_config_业务默认值() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let config = &env.config_manager;

    assert_eq!(config.get_default_page_size().unwrap(), 200);
    assert_eq!(config.get_max_batch_rows().unwrap(), 10_000);

    config
        .set_config_value(config_keys::DEFAULT_PAGE_SIZE, "25", None)
        .unwrap();
    config
        .set_config_value(config_keys::MAX_BATCH_ROWS, "100", None)
        .unwrap();

    assert_eq!(config.get_default_page_size().unwrap(), 25);
    assert_eq!(config.get_max_batch_rows().unwrap(), 100);
}

#[test]
fn test_config_清单按键排序() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let config = &env.config_manager;

    config
        .set_config_value(config_keys::MAX_BATCH_ROWS, "100", Some("单文件行数上限"))
        .unwrap();
    config
        .set_config_value(config_keys::DEFAULT_PAGE_SIZE, "25", None)
        .unwrap();

    let entries = config.list_configs().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].config_key, config_keys::DEFAULT_PAGE_SIZE);
    assert_eq!(entries[1].config_key, config_keys::MAX_BATCH_ROWS);
    assert_eq!(entries[1].description.as_deref(), Some("单文件行数上限"));
    assert!(!entries[0].updated_at.is_empty());
}

#[test]
fn test_config_快照包含全部键值() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let config = &env.config_manager;

    config
        .set_config_value(config_keys::DEFAULT_PAGE_SIZE, "25", None)
        .unwrap();
    config
        .set_config_value(config_keys::MAX_BATCH_ROWS, "100", None)
        .unwrap();

    let snapshot = config.get_config_snapshot().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(parsed[config_keys::DEFAULT_PAGE_SIZE], "25");
    assert_eq!(parsed[config_keys::MAX_BATCH_ROWS], "100");
}

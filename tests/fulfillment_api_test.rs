// ==========================================
// FulfillmentApi 集成测试
// ==========================================
// 测试范围:
// 1. 标准缺料场景的完整测算链路（SQLite 仓储）
// 2. 对外报文形状: result/product_qty/warehouse_id/qty/price
// 3. 错误契约: 编码未命中整批失败、校验失败带行号
// ==========================================

mod helpers;

use helpers::api_test_helper::ApiTestEnv;
use kitting_mrp::api::{ApiError, ErrorResponse, FulfillmentLineDto};

fn line(code: &str, quantity: i64) -> FulfillmentLineDto {
    FulfillmentLineDto {
        product_code: code.to_string(),
        quantity,
    }
}

// ==========================================
// 标准场景测试
// ==========================================

#[tokio::test]
async fn test_fulfill_标准缺料场景() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let catalog = env.seed_demo_catalog().unwrap();

    // Koylak x50: Mato 需求 100（库存 80，缺 20），Vida 需求 250（库存充足）
    let response = env
        .fulfillment_api
        .fulfill_products(vec![line("P1001", 50)])
        .await
        .expect("测算失败");

    assert_eq!(response.result.len(), 1);
    let report = &response.result[0];
    assert_eq!(report.product_name, "Koylak");
    assert_eq!(report.product_qty, 50);
    assert_eq!(report.product_materials.len(), 4);

    // Mato: 两个批次按 id 升序耗尽，再补一条缺料标记
    let mato_rows: Vec<_> = report
        .product_materials
        .iter()
        .filter(|m| m.material_name == "Mato")
        .collect();
    assert_eq!(mato_rows.len(), 3);
    assert_eq!(mato_rows[0].warehouse_id, Some(catalog.mato_lot1_id));
    assert_eq!(mato_rows[0].qty, 30);
    assert_eq!(mato_rows[0].price, Some(1000.0));
    assert_eq!(mato_rows[1].warehouse_id, Some(catalog.mato_lot2_id));
    assert_eq!(mato_rows[1].qty, 50);
    assert_eq!(mato_rows[1].price, Some(1200.0));
    assert_eq!(mato_rows[2].warehouse_id, None, "缺料标记没有批次");
    assert_eq!(mato_rows[2].qty, 20);
    assert_eq!(mato_rows[2].price, None, "缺料标记没有单价");

    // Vida: 单批次覆盖全部需求，没有缺料标记
    let vida_rows: Vec<_> = report
        .product_materials
        .iter()
        .filter(|m| m.material_name == "Vida")
        .collect();
    assert_eq!(vida_rows.len(), 1);
    assert_eq!(vida_rows[0].warehouse_id, Some(catalog.vida_lot_id));
    assert_eq!(vida_rows[0].qty, 250);
    assert_eq!(vida_rows[0].price, Some(2.5));
}

#[tokio::test]
async fn test_fulfill_库存充足时无缺料标记() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    // Koylak x10: Mato 需求 20 <= 80，Vida 需求 50 <= 1000
    let response = env
        .fulfillment_api
        .fulfill_products(vec![line("P1001", 10)])
        .await
        .unwrap();

    let report = &response.result[0];
    assert!(report.product_materials.iter().all(|m| m.warehouse_id.is_some()));
    let mato_total: i64 = report
        .product_materials
        .iter()
        .filter(|m| m.material_name == "Mato")
        .map(|m| m.qty)
        .sum();
    assert_eq!(mato_total, 20);
}

#[tokio::test]
async fn test_fulfill_空清单产品返回空明细() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    let response = env
        .fulfillment_api
        .fulfill_products(vec![line("P2002", 7)])
        .await
        .unwrap();

    let report = &response.result[0];
    assert_eq!(report.product_name, "Gilam");
    assert_eq!(report.product_qty, 7);
    assert!(report.product_materials.is_empty());
}

#[tokio::test]
async fn test_fulfill_数量为零不产生明细() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    let response = env
        .fulfillment_api
        .fulfill_products(vec![line("P1001", 0)])
        .await
        .unwrap();

    let report = &response.result[0];
    assert_eq!(report.product_qty, 0);
    assert!(report.product_materials.is_empty(), "零需求不应产生分配或缺料");
}

#[tokio::test]
async fn test_fulfill_批量请求共享同一库存快照() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    // 同一产品请求两次：测算不扣减库存，两份报告必须一致
    let response = env
        .fulfillment_api
        .fulfill_products(vec![line("P1001", 50), line("P1001", 50)])
        .await
        .unwrap();

    assert_eq!(response.result.len(), 2);
    assert_eq!(
        response.result[0].product_materials,
        response.result[1].product_materials
    );
}

#[tokio::test]
async fn test_fulfill_保持请求顺序() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    let response = env
        .fulfillment_api
        .fulfill_products(vec![line("P2002", 1), line("P1001", 1)])
        .await
        .unwrap();

    assert_eq!(response.result[0].product_name, "Gilam");
    assert_eq!(response.result[1].product_name, "Koylak");
}

// ==========================================
// 错误契约测试
// ==========================================

#[tokio::test]
async fn test_fulfill_编码未命中整批失败() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    let result = env
        .fulfillment_api
        .fulfill_products(vec![line("P1001", 1), line("P9999", 1), line("P2002", 1)])
        .await;

    match result {
        Err(ApiError::ProductNotFound(code)) => assert_eq!(code, "P9999"),
        _ => panic!("Expected ProductNotFound"),
    }
}

#[tokio::test]
async fn test_fulfill_未命中错误报文为固定文案() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    let err = env
        .fulfillment_api
        .fulfill_from_json(r#"{"products": [{"product_code": 238923, "quantity": 1}]}"#)
        .await
        .unwrap_err();

    let body = serde_json::to_value(ErrorResponse::from_api_error(&err)).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"errors": "Product with code 238923 not found."})
    );
}

#[tokio::test]
async fn test_fulfill_校验失败返回行号与字段() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    let result = env
        .fulfillment_api
        .fulfill_products(vec![line("P1001", -3), line("  ", 1)])
        .await;

    match result {
        Err(ApiError::RequestValidationError { violations, .. }) => {
            assert_eq!(violations.len(), 2);
            assert_eq!(violations[0].index, 0);
            assert_eq!(violations[0].field, "quantity");
            assert_eq!(violations[1].index, 1);
            assert_eq!(violations[1].field, "product_code");
        }
        _ => panic!("Expected RequestValidationError"),
    }
}

#[tokio::test]
async fn test_fulfill_校验失败不触发测算() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    // 未知编码 + 非法数量：应先报校验错误，而不是 ProductNotFound
    let result = env
        .fulfillment_api
        .fulfill_products(vec![line("P9999", -1)])
        .await;

    assert!(matches!(
        result,
        Err(ApiError::RequestValidationError { .. })
    ));
}

#[tokio::test]
async fn test_fulfill_需求量溢出返回错误报文() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    // i64::MAX 是合法报文数量，放大后（x2）溢出，必须报错而非按满足处理
    let err = env
        .fulfillment_api
        .fulfill_from_json(
            r#"{"products": [{"product_code": "P1001", "quantity": 9223372036854775807}]}"#,
        )
        .await
        .unwrap_err();

    match err {
        ApiError::InvalidInput(ref msg) => {
            assert!(msg.contains("P1001"));
            assert!(msg.contains("溢出"));
        }
        _ => panic!("Expected InvalidInput"),
    }

    // 错误报文仍为 errors 键单消息形状
    let body = serde_json::to_value(ErrorResponse::from_api_error(&err)).unwrap();
    assert!(body["errors"].is_string());
}

// ==========================================
// 报文形状测试
// ==========================================

#[tokio::test]
async fn test_fulfill_from_json_报文字段名契约() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let catalog = env.seed_demo_catalog().unwrap();

    let response = env
        .fulfillment_api
        .fulfill_from_json(r#"{"products": [{"product_code": "P1001", "quantity": 50}]}"#)
        .await
        .unwrap();

    let body = serde_json::to_value(&response).unwrap();
    let reports = body["result"].as_array().expect("顶层键必须是 result");
    assert_eq!(reports[0]["product_name"], "Koylak");
    assert_eq!(reports[0]["product_qty"], 50);

    let materials = reports[0]["product_materials"].as_array().unwrap();
    assert_eq!(materials[0]["warehouse_id"], catalog.mato_lot1_id);
    assert_eq!(materials[0]["material_name"], "Mato");
    assert_eq!(materials[0]["qty"], 30);
    assert_eq!(materials[0]["price"], 1000.0);

    // 缺料标记: warehouse_id 与 price 序列化为 null
    assert_eq!(materials[2]["warehouse_id"], serde_json::Value::Null);
    assert_eq!(materials[2]["qty"], 20);
    assert_eq!(materials[2]["price"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_fulfill_from_json_整数编码归一为字符串() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();
    env.product_repo.upsert_product("4567", "Stol").unwrap();

    let response = env
        .fulfillment_api
        .fulfill_from_json(r#"{"products": [{"product_code": 4567, "quantity": 1}]}"#)
        .await
        .unwrap();

    assert_eq!(response.result[0].product_name, "Stol");
}

#[tokio::test]
async fn test_fulfill_from_json_quantity缺省为零() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    let response = env
        .fulfillment_api
        .fulfill_from_json(r#"{"products": [{"product_code": "P1001"}]}"#)
        .await
        .unwrap();

    assert_eq!(response.result[0].product_qty, 0);
    assert!(response.result[0].product_materials.is_empty());
}

#[tokio::test]
async fn test_fulfill_from_json_缺少products键报解析错误() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let result = env
        .fulfillment_api
        .fulfill_from_json(r#"[{"product_code": "P1001", "quantity": 1}]"#)
        .await;

    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn test_fulfill_空请求数组返回空结果() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let response = env
        .fulfillment_api
        .fulfill_from_json(r#"{"products": []}"#)
        .await
        .unwrap();

    assert!(response.result.is_empty());
}

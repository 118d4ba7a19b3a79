// ==========================================
// 测算引擎集成测试
// ==========================================
// 测试范围:
// 1. FulfillmentOrchestrator 走 SQLite 仓储的完整链路
// 2. 批次消耗顺序与缺料标记的端到端验证
// 3. 快照幂等性（测算不落库、不扣减）
// ==========================================

mod helpers;

use std::sync::Arc;

use helpers::api_test_helper::ApiTestEnv;
use kitting_mrp::domain::FulfillmentRequest;
use kitting_mrp::engine::{FulfillmentError, FulfillmentOrchestrator};

fn build_orchestrator(
    env: &ApiTestEnv,
) -> FulfillmentOrchestrator<
    kitting_mrp::repository::ProductRepository,
    kitting_mrp::repository::BomLineRepository,
    kitting_mrp::repository::StockLotRepository,
> {
    FulfillmentOrchestrator::new(
        env.product_repo.clone(),
        env.bom_repo.clone(),
        env.stock_repo.clone(),
    )
}

#[tokio::test]
async fn test_orchestrator_over_sqlite_标准场景() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let catalog = env.seed_demo_catalog().unwrap();
    let orchestrator = build_orchestrator(&env);

    let report = orchestrator
        .fulfill_single(&FulfillmentRequest::new("P1001", 50))
        .await
        .expect("测算失败");

    assert_eq!(report.product_name, "Koylak");
    assert_eq!(report.quantity, 50);
    assert_eq!(report.allocations.len(), 4);
    assert!(report.has_shortage());

    // Mato 分配 30+50，缺 20；顺序: 批次1 → 批次2 → 缺料标记
    assert_eq!(report.allocations[0].lot_id, Some(catalog.mato_lot1_id));
    assert_eq!(report.allocations[0].quantity, 30);
    assert_eq!(report.allocations[1].lot_id, Some(catalog.mato_lot2_id));
    assert_eq!(report.allocations[1].quantity, 50);
    assert!(report.allocations[2].is_shortage());
    assert_eq!(report.allocations[2].quantity, 20);

    // Vida 跟在 Mato 之后（清单行顺序），无缺料
    assert_eq!(report.allocations[3].material_name, "Vida");
    assert_eq!(report.allocations[3].quantity, 250);
}

#[tokio::test]
async fn test_orchestrator_编码未命中() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();
    let orchestrator = build_orchestrator(&env);

    let result = orchestrator
        .fulfill_single(&FulfillmentRequest::new("NO-SUCH", 1))
        .await;

    match result {
        Err(FulfillmentError::ProductNotFound(code)) => assert_eq!(code, "NO-SUCH"),
        _ => panic!("Expected ProductNotFound"),
    }
}

#[tokio::test]
async fn test_orchestrator_批量失败不产生部分结果() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();
    let orchestrator = build_orchestrator(&env);

    let requests = vec![
        FulfillmentRequest::new("P1001", 1),
        FulfillmentRequest::new("MISSING", 1),
        FulfillmentRequest::new("P2002", 1),
    ];
    let result = orchestrator.fulfill_batch(&requests).await;

    assert!(matches!(
        result,
        Err(FulfillmentError::ProductNotFound(ref code)) if code == "MISSING"
    ));
}

#[tokio::test]
async fn test_allocation_按批次id升序且跳过枯竭批次() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    // 追加一个物料：先插一个 0 剩余批次，再插两个可用批次
    let material_id = env.material_repo.insert_material("Qum").unwrap();
    let depleted_lot = env.stock_repo.insert_lot(material_id, 0, Some(5.0)).unwrap();
    let lot_a = env.stock_repo.insert_lot(material_id, 4, Some(6.0)).unwrap();
    let lot_b = env.stock_repo.insert_lot(material_id, 9, Some(7.0)).unwrap();

    let product_id = env.product_repo.upsert_product("P3003", "Sumka").unwrap();
    env.bom_repo
        .replace_product_lines(product_id, &[(material_id, 1)])
        .unwrap();

    let orchestrator = build_orchestrator(&env);
    let report = orchestrator
        .fulfill_single(&FulfillmentRequest::new("P3003", 10))
        .await
        .unwrap();

    // 0 剩余批次不出现在结果里；lot_a 先耗尽再取 lot_b
    assert_eq!(report.allocations.len(), 2);
    assert!(report
        .allocations
        .iter()
        .all(|a| a.lot_id != Some(depleted_lot)));
    assert_eq!(report.allocations[0].lot_id, Some(lot_a));
    assert_eq!(report.allocations[0].quantity, 4);
    assert_eq!(report.allocations[1].lot_id, Some(lot_b));
    assert_eq!(report.allocations[1].quantity, 6);
}

#[tokio::test]
async fn test_allocation_快照幂等() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();
    let orchestrator = build_orchestrator(&env);

    // 测算只读：重复执行结果一致，库存不被扣减
    let request = FulfillmentRequest::new("P1001", 50);
    let first = orchestrator.fulfill_single(&request).await.unwrap();
    let second = orchestrator.fulfill_single(&request).await.unwrap();

    assert_eq!(first.allocations, second.allocations);

    let mato = env.material_repo.find_by_name("Mato").unwrap().unwrap();
    assert_eq!(env.stock_repo.total_remainder(mato.id).unwrap(), 80);
}

#[tokio::test]
async fn test_allocation_无库存物料只输出缺料标记() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    let material_id = env.material_repo.insert_material("Ip").unwrap();
    let product_id = env.product_repo.upsert_product("P4004", "Chanta").unwrap();
    env.bom_repo
        .replace_product_lines(product_id, &[(material_id, 3)])
        .unwrap();

    let orchestrator = build_orchestrator(&env);
    let report = orchestrator
        .fulfill_single(&FulfillmentRequest::new("P4004", 2))
        .await
        .unwrap();

    assert_eq!(report.allocations.len(), 1);
    let marker = &report.allocations[0];
    assert!(marker.is_shortage());
    assert_eq!(marker.material_name, "Ip");
    assert_eq!(marker.quantity, 6);
}

#[tokio::test]
async fn test_allocation_分配总量与缺口守恒() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();
    let orchestrator = build_orchestrator(&env);

    // Mato 需求 100 = 分配 80 + 缺口 20
    let report = orchestrator
        .fulfill_single(&FulfillmentRequest::new("P1001", 50))
        .await
        .unwrap();

    let allocated: i64 = report
        .allocations
        .iter()
        .filter(|a| a.material_name == "Mato" && !a.is_shortage())
        .map(|a| a.quantity)
        .sum();
    let shortage: i64 = report
        .allocations
        .iter()
        .filter(|a| a.material_name == "Mato" && a.is_shortage())
        .map(|a| a.quantity)
        .sum();

    assert_eq!(allocated, 80);
    assert_eq!(shortage, 20);
    assert_eq!(allocated + shortage, 2 * 50);
}

#[tokio::test]
async fn test_orchestrator_with_arc_shared_repos() {
    // Arc 共享仓储可同时供 API 与引擎使用
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_demo_catalog().unwrap();

    let orchestrator = FulfillmentOrchestrator::new(
        Arc::clone(&env.product_repo),
        Arc::clone(&env.bom_repo),
        Arc::clone(&env.stock_repo),
    );

    let report = orchestrator
        .fulfill_single(&FulfillmentRequest::new("P2002", 1))
        .await
        .unwrap();
    assert!(report.allocations.is_empty());
}

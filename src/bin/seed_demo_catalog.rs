use std::error::Error;
use std::sync::{Arc, Mutex};

use kitting_mrp::app::get_default_db_path;
use kitting_mrp::db;
use kitting_mrp::repository::{
    BomLineRepository, MaterialRepository, ProductRepository, StockLotRepository,
};

// 演示数据：两个产品、两种物料、三个库存批次
// Koylak 需要 Mato x2 + Vida x5；Gilam 没有用料清单
fn main() -> Result<(), Box<dyn Error>> {
    kitting_mrp::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    eprintln!("写入演示目录到: {}", db_path);

    let conn = db::open_sqlite_connection(&db_path)?;
    db::ensure_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let product_repo = ProductRepository::from_connection(conn.clone());
    let material_repo = MaterialRepository::from_connection(conn.clone());
    let bom_repo = BomLineRepository::from_connection(conn.clone());
    let stock_repo = StockLotRepository::from_connection(conn);

    // 产品
    let koylak_id = product_repo.upsert_product("P1001", "Koylak")?;
    let gilam_id = product_repo.upsert_product("P2002", "Gilam")?;

    // 物料（重复执行时按名称去重）
    let mato_id = match material_repo.find_by_name("Mato")? {
        Some(material) => material.id,
        None => material_repo.insert_material("Mato")?,
    };
    let vida_id = match material_repo.find_by_name("Vida")? {
        Some(material) => material.id,
        None => material_repo.insert_material("Vida")?,
    };

    // 用料清单（整体替换，保证重复执行结果一致）
    bom_repo.replace_product_lines(koylak_id, &[(mato_id, 2), (vida_id, 5)])?;
    bom_repo.replace_product_lines(gilam_id, &[])?;

    // 库存批次（追加语义，只在空库时写入演示批次）
    if stock_repo.list_lots_by_material(mato_id)?.is_empty() {
        stock_repo.insert_lot(mato_id, 30, Some(1000.0))?;
        stock_repo.insert_lot(mato_id, 50, Some(1200.0))?;
    }
    if stock_repo.list_lots_by_material(vida_id)?.is_empty() {
        stock_repo.insert_lot(vida_id, 1000, Some(2.5))?;
    }

    eprintln!(
        "演示目录就绪: 产品 {} 个, Mato 库存 {} 件, Vida 库存 {} 件",
        product_repo.count_products()?,
        stock_repo.total_remainder(mato_id)?,
        stock_repo.total_remainder(vida_id)?,
    );
    eprintln!("试一试:");
    eprintln!(
        "  echo '{{\"products\": [{{\"product_code\": \"P1001\", \"quantity\": 50}}]}}' | kitting-mrp"
    );

    Ok(())
}

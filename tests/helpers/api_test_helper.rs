// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use kitting_mrp::api::{CatalogApi, FulfillmentApi};
use kitting_mrp::config::ConfigManager;
use kitting_mrp::db;
use kitting_mrp::importer::CatalogImporter;
use kitting_mrp::repository::{
    BomLineRepository, ImportBatchRepository, MaterialRepository, ProductRepository,
    StockLotRepository,
};

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例和必要的依赖
pub struct ApiTestEnv {
    pub db_path: String,
    pub fulfillment_api: Arc<FulfillmentApi>,
    pub catalog_api: Arc<CatalogApi>,
    pub importer: Arc<CatalogImporter>,
    pub config_manager: Arc<ConfigManager>,

    // Repository层（用于测试数据准备）
    pub product_repo: Arc<ProductRepository>,
    pub material_repo: Arc<MaterialRepository>,
    pub bom_repo: Arc<BomLineRepository>,
    pub stock_repo: Arc<StockLotRepository>,
    pub batch_repo: Arc<ImportBatchRepository>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

/// 标准演示目录的内部 id（由 seed_demo_catalog 返回）
pub struct DemoCatalog {
    pub koylak_id: i64,
    pub gilam_id: i64,
    pub mato_id: i64,
    pub vida_id: i64,
    pub mato_lot1_id: i64,
    pub mato_lot2_id: i64,
    pub vida_lot_id: i64,
}

impl ApiTestEnv {
    /// 创建新的API测试环境
    ///
    /// # 说明
    /// - 使用临时数据库文件
    /// - 初始化所有Repository和API
    /// - 自动执行建表
    pub fn new() -> Result<Self, String> {
        // 初始化日志系统
        kitting_mrp::logging::init_test();

        // 创建临时数据库文件并初始化schema
        let (temp_file, db_path) =
            test_helpers::create_test_db().map_err(|e| format!("创建测试数据库失败: {}", e))?;

        // 初始化数据库连接（共享连接）
        let conn = db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let product_repo = Arc::new(ProductRepository::from_connection(conn.clone()));
        let material_repo = Arc::new(MaterialRepository::from_connection(conn.clone()));
        let bom_repo = Arc::new(BomLineRepository::from_connection(conn.clone()));
        let stock_repo = Arc::new(StockLotRepository::from_connection(conn.clone()));
        let batch_repo = Arc::new(ImportBatchRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let fulfillment_api = Arc::new(FulfillmentApi::new(
            product_repo.clone(),
            bom_repo.clone(),
            stock_repo.clone(),
        ));

        let catalog_api = Arc::new(CatalogApi::new(
            product_repo.clone(),
            material_repo.clone(),
            bom_repo.clone(),
            stock_repo.clone(),
            config_manager.clone(),
        ));

        let importer = Arc::new(CatalogImporter::new(
            product_repo.clone(),
            material_repo.clone(),
            bom_repo.clone(),
            stock_repo.clone(),
            batch_repo.clone(),
            config_manager.clone(),
        ));

        Ok(Self {
            db_path,
            fulfillment_api,
            catalog_api,
            importer,
            config_manager,
            product_repo,
            material_repo,
            bom_repo,
            stock_repo,
            batch_repo,
            _temp_file: temp_file,
        })
    }

    /// 写入标准演示目录
    ///
    /// - Koylak(P1001): 每件需要 Mato x2 + Vida x5
    /// - Gilam(P2002): 没有用料清单
    /// - Mato 库存: 批次1 剩余30 单价1000，批次2 剩余50 单价1200
    /// - Vida 库存: 剩余1000 单价2.5
    pub fn seed_demo_catalog(&self) -> Result<DemoCatalog, String> {
        let koylak_id = self
            .product_repo
            .upsert_product("P1001", "Koylak")
            .map_err(|e| e.to_string())?;
        let gilam_id = self
            .product_repo
            .upsert_product("P2002", "Gilam")
            .map_err(|e| e.to_string())?;

        let mato_id = self
            .material_repo
            .insert_material("Mato")
            .map_err(|e| e.to_string())?;
        let vida_id = self
            .material_repo
            .insert_material("Vida")
            .map_err(|e| e.to_string())?;

        self.bom_repo
            .replace_product_lines(koylak_id, &[(mato_id, 2), (vida_id, 5)])
            .map_err(|e| e.to_string())?;

        let mato_lot1_id = self
            .stock_repo
            .insert_lot(mato_id, 30, Some(1000.0))
            .map_err(|e| e.to_string())?;
        let mato_lot2_id = self
            .stock_repo
            .insert_lot(mato_id, 50, Some(1200.0))
            .map_err(|e| e.to_string())?;
        let vida_lot_id = self
            .stock_repo
            .insert_lot(vida_id, 1000, Some(2.5))
            .map_err(|e| e.to_string())?;

        Ok(DemoCatalog {
            koylak_id,
            gilam_id,
            mato_id,
            vida_id,
            mato_lot1_id,
            mato_lot2_id,
            vida_lot_id,
        })
    }
}

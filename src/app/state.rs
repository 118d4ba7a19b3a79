// ==========================================
// 物料齐套测算系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{CatalogApi, FulfillmentApi};
use crate::config::ConfigManager;
use crate::db;
use crate::importer::CatalogImporter;
use crate::perf;
use crate::repository::{
    BomLineRepository, ImportBatchRepository, MaterialRepository, ProductRepository,
    StockLotRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源，
/// 由命令行入口与集成测试统一初始化
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 齐套测算API
    pub fulfillment_api: Arc<FulfillmentApi>,

    /// 产品目录查询API
    pub catalog_api: Arc<CatalogApi>,

    /// 产品目录导入器
    pub importer: Arc<CatalogImporter>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 导入批次仓储（用于导入历史查询）
    pub batch_repo: Arc<ImportBatchRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享数据库连接并确保建表完成
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例与导入器
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let mut conn = db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        perf::install_sqlite_tracing(&mut conn);
        db::ensure_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let product_repo = Arc::new(ProductRepository::from_connection(conn.clone()));
        let material_repo = Arc::new(MaterialRepository::from_connection(conn.clone()));
        let bom_repo = Arc::new(BomLineRepository::from_connection(conn.clone()));
        let stock_repo = Arc::new(StockLotRepository::from_connection(conn.clone()));
        let batch_repo = Arc::new(ImportBatchRepository::from_connection(conn.clone()));

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================

        // 齐套测算API
        let fulfillment_api = Arc::new(FulfillmentApi::new(
            product_repo.clone(),
            bom_repo.clone(),
            stock_repo.clone(),
        ));

        // 产品目录查询API
        let catalog_api = Arc::new(CatalogApi::new(
            product_repo.clone(),
            material_repo.clone(),
            bom_repo.clone(),
            stock_repo.clone(),
            config_manager.clone(),
        ));

        // 产品目录导入器
        let importer = Arc::new(CatalogImporter::new(
            product_repo,
            material_repo,
            bom_repo,
            stock_repo,
            batch_repo.clone(),
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            fulfillment_api,
            catalog_api,
            importer,
            config_manager,
            batch_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 开发环境: 用户数据目录/kitting-mrp-dev/kitting_mrp.db
/// - 生产环境: 用户数据目录/kitting-mrp/kitting_mrp.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("KITTING_MRP_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 先给一个默认回退值，后续如果能拿到 data_dir 再覆盖
    let mut path = PathBuf::from("./kitting_mrp.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("kitting-mrp-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("kitting-mrp");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("kitting_mrp.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_initializes_schema() {
        // 测试：AppState 初始化后空库即可查询
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state_test.db");
        let state = AppState::new(db_path.to_string_lossy().to_string()).unwrap();

        let response = state.catalog_api.list_products(None, 0).unwrap();
        assert_eq!(response.total, 0);
        assert!(response.products.is_empty());
    }
}

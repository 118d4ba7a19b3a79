// ==========================================
// 物料齐套测算系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod bom_repo;
pub mod error;
pub mod import_batch_repo;
pub mod material_repo;
pub mod product_repo;
pub mod stock_repo;

// 重导出核心仓储
pub use bom_repo::BomLineRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use import_batch_repo::{ImportBatchRecord, ImportBatchRepository, ImportBatchStatus};
pub use material_repo::MaterialRepository;
pub use product_repo::ProductRepository;
pub use stock_repo::{NewStockLot, StockLotRepository};

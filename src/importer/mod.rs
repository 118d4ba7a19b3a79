// ==========================================
// 物料齐套测算系统 - 导入层
// ==========================================
// 职责: 解析外部 CSV 文件，维护产品目录与库存主数据
// 支持: products / materials / bom / stock 四种文件
// ==========================================

// 模块声明
pub mod catalog_importer;
pub mod error;

// 重导出核心类型
pub use catalog_importer::{CatalogImporter, ImportSummary, RowError};
pub use error::{ImportError, ImportResult};

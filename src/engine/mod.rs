// ==========================================
// 物料齐套测算系统 - 引擎层
// ==========================================
// 职责: 实现齐套测算业务规则，不拼 SQL
// 红线: Engine 不写库，短缺必须显式输出缺料标记
// ==========================================

pub mod accessors;
pub mod allocator;
pub mod error;
pub mod fulfillment;

// 重导出核心引擎
pub use accessors::{BomReader, ProductCatalogReader, StockLedgerReader};
pub use allocator::{allocate_from_lots, LotAllocator};
pub use error::{FulfillmentError, FulfillmentResult};
pub use fulfillment::FulfillmentOrchestrator;

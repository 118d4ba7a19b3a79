// ==========================================
// 物料齐套测算系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与派生输出结构
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod fulfillment;
pub mod material;
pub mod product;
pub mod stock;

// 重导出核心类型
pub use fulfillment::{FulfillmentRequest, MaterialAllocation, ProductFulfillmentReport};
pub use material::Material;
pub use product::{BomLine, BomRequirement, Product};
pub use stock::StockLot;

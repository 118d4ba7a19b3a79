// ==========================================
// 物料齐套测算系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 按产品用料清单测算物料齐套情况
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分配与测算规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能观测（SQL 追踪与耗时守卫）
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装与入口支持
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    BomRequirement, FulfillmentRequest, Material, MaterialAllocation, Product,
    ProductFulfillmentReport, StockLot,
};

// 引擎
pub use engine::{allocate_from_lots, FulfillmentOrchestrator, LotAllocator};

// API
pub use api::{CatalogApi, FulfillmentApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "物料齐套测算系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================

// ==========================================
// 物料齐套测算系统 - 引擎数据访问接口
// ==========================================
// 职责: 定义齐套测算引擎所需的数据读取接口（不包含实现）
// 实现者: repository 层各仓储；测试中由内存 Mock 实现
// 红线: 接口只读，不包含写入、不包含业务规则
// ==========================================

use crate::domain::product::{BomRequirement, Product};
use crate::domain::stock::StockLot;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ProductCatalogReader Trait
// ==========================================
// 用途: 按外部编码解析产品
#[async_trait]
pub trait ProductCatalogReader: Send + Sync {
    /// 按产品编码精确查找产品
    ///
    /// # 参数
    /// - code: 产品外部编码（精确匹配，不做大小写或空白归一）
    ///
    /// # 返回
    /// - Some(Product): 编码存在
    /// - None: 编码不存在（由调用方决定失败语义）
    async fn find_product_by_code(&self, code: &str) -> Result<Option<Product>, Box<dyn Error>>;
}

// ==========================================
// BomReader Trait
// ==========================================
// 用途: 读取产品的物料清单需求行
#[async_trait]
pub trait BomReader: Send + Sync {
    /// 列出产品的全部 BOM 需求行
    ///
    /// # 参数
    /// - product_id: 产品内部 ID
    ///
    /// # 返回
    /// - Vec<BomRequirement>: 按清单行 ID 升序（行序即报告中的物料顺序）
    async fn list_bom_requirements(
        &self,
        product_id: i64,
    ) -> Result<Vec<BomRequirement>, Box<dyn Error>>;
}

// ==========================================
// StockLedgerReader Trait
// ==========================================
// 用途: 读取物料的库存批次
#[async_trait]
pub trait StockLedgerReader: Send + Sync {
    /// 列出物料的全部库存批次
    ///
    /// 返回顺序不作保证，消耗顺序由分配引擎自行排序；
    /// 余量非正的批次也会返回，是否跳过同样由引擎决定。
    ///
    /// # 参数
    /// - material_id: 物料内部 ID
    async fn list_stock_lots(&self, material_id: i64) -> Result<Vec<StockLot>, Box<dyn Error>>;
}

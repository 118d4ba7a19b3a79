// ==========================================
// 物料齐套测算系统 - 主数据目录 API
// ==========================================
// 职责: 产品/物料/库存主数据查询（分页、详情、库存汇总）
// 红线: 只读查询，不改主数据
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::material::Material;
use crate::domain::product::Product;
use crate::domain::stock::StockLot;
use crate::repository::bom_repo::BomLineRepository;
use crate::repository::material_repo::MaterialRepository;
use crate::repository::product_repo::ProductRepository;
use crate::repository::stock_repo::StockLotRepository;

// ==========================================
// DTO 类型定义
// ==========================================

/// 产品列表响应（带分页信息）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    /// 产品列表（编码升序）
    pub products: Vec<Product>,
    /// 总记录数
    pub total: i64,
    /// 每页记录数
    pub limit: i64,
    /// 分页偏移
    pub offset: i64,
}

/// BOM 清单行视图（物料名随行展开）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLineView {
    pub line_id: i64,
    pub material_id: i64,
    pub material_name: String,
    pub quantity: i64,
}

/// 产品详情响应（产品 + 清单行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetailResponse {
    pub product: Product,
    pub bom_lines: Vec<BomLineView>,
}

/// 物料库存响应（批次明细 + 可用余量合计）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialStockResponse {
    pub material: Material,
    /// 批次明细（ID 升序，含余量非正的批次）
    pub lots: Vec<StockLot>,
    /// 可用余量合计（仅计 remainder > 0 的批次）
    pub total_remainder: i64,
}

// ==========================================
// CatalogApi - 主数据目录 API
// ==========================================

/// 主数据目录API
///
/// 职责：
/// 1. 产品分页查询与详情（含 BOM 清单行）
/// 2. 物料清单与库存批次查询
/// 3. 分页大小缺省值从配置读取
pub struct CatalogApi {
    product_repo: Arc<ProductRepository>,
    material_repo: Arc<MaterialRepository>,
    bom_repo: Arc<BomLineRepository>,
    stock_repo: Arc<StockLotRepository>,
    config: Arc<ConfigManager>,
}

impl CatalogApi {
    /// 创建新的CatalogApi实例
    pub fn new(
        product_repo: Arc<ProductRepository>,
        material_repo: Arc<MaterialRepository>,
        bom_repo: Arc<BomLineRepository>,
        stock_repo: Arc<StockLotRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            product_repo,
            material_repo,
            bom_repo,
            stock_repo,
            config,
        }
    }

    // ==========================================
    // 产品查询接口
    // ==========================================

    /// 分页查询产品列表
    ///
    /// # 参数
    /// - limit: 每页记录数（None 时取配置 catalog.default_page_size）
    /// - offset: 偏移量
    ///
    /// # 返回
    /// - Ok(ProductListResponse): 产品列表及分页信息
    pub fn list_products(&self, limit: Option<i64>, offset: i64) -> ApiResult<ProductListResponse> {
        // 参数验证
        if offset < 0 {
            return Err(ApiError::InvalidInput("分页偏移不能为负数".to_string()));
        }
        if let Some(value) = limit {
            if value <= 0 {
                return Err(ApiError::InvalidInput("每页记录数必须为正数".to_string()));
            }
        }

        let page_size = match limit {
            Some(value) => value,
            None => self
                .config
                .get_default_page_size()
                .map_err(|e| ApiError::DatabaseError(e.to_string()))?,
        };

        let products = self.product_repo.list_products(page_size, offset)?;
        let total = self.product_repo.count_products()?;

        Ok(ProductListResponse {
            products,
            total,
            limit: page_size,
            offset,
        })
    }

    /// 查询产品详情（产品 + BOM 清单行）
    ///
    /// # 参数
    /// - code: 产品外部编码（精确匹配）
    ///
    /// # 返回
    /// - Ok(Some(ProductDetailResponse)): 产品详情
    /// - Ok(None): 编码不存在
    pub fn get_product_detail(&self, code: &str) -> ApiResult<Option<ProductDetailResponse>> {
        // 参数验证
        if code.trim().is_empty() {
            return Err(ApiError::InvalidInput("产品编码不能为空".to_string()));
        }

        let product = match self.product_repo.find_by_code(code)? {
            Some(product) => product,
            None => return Ok(None),
        };

        let bom_lines = self
            .bom_repo
            .list_requirements(product.id)?
            .into_iter()
            .map(|requirement| BomLineView {
                line_id: requirement.line_id,
                material_id: requirement.material.id,
                material_name: requirement.material.name,
                quantity: requirement.quantity,
            })
            .collect();

        Ok(Some(ProductDetailResponse { product, bom_lines }))
    }

    // ==========================================
    // 物料与库存查询接口
    // ==========================================

    /// 查询全部物料（ID 升序）
    pub fn list_materials(&self) -> ApiResult<Vec<Material>> {
        Ok(self.material_repo.list_materials()?)
    }

    /// 查询物料库存（批次明细 + 可用余量合计）
    ///
    /// # 参数
    /// - material_id: 物料内部 ID
    ///
    /// # 返回
    /// - Ok(Some(MaterialStockResponse)): 库存详情
    /// - Ok(None): 物料不存在
    pub fn get_material_stock(&self, material_id: i64) -> ApiResult<Option<MaterialStockResponse>> {
        let material = match self.material_repo.find_by_id(material_id)? {
            Some(material) => material,
            None => return Ok(None),
        };

        let lots = self.stock_repo.list_lots_by_material(material_id)?;
        let total_remainder = self.stock_repo.total_remainder(material_id)?;

        Ok(Some(MaterialStockResponse {
            material,
            lots,
            total_remainder,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_line_view_serialization() {
        let view = BomLineView {
            line_id: 3,
            material_id: 10,
            material_name: "Mato".to_string(),
            quantity: 2,
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["material_name"], "Mato");
        assert_eq!(value["quantity"], 2);
    }
}

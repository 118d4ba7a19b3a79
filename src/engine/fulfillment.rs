// ==========================================
// 物料齐套测算系统 - 齐套测算编排器
// ==========================================
// 职责: 解析产品 → 读取 BOM → 放大需求 → 逐物料分配
// 输入: FulfillmentRequest 批次
// 输出: Vec<ProductFulfillmentReport>（与请求同序）
// 红线: 任一编码未命中整批失败；报告数量为请求量而非已满足量
// ==========================================

use crate::domain::fulfillment::{FulfillmentRequest, ProductFulfillmentReport};
use crate::engine::accessors::{BomReader, ProductCatalogReader, StockLedgerReader};
use crate::engine::allocator::LotAllocator;
use crate::engine::error::{FulfillmentError, FulfillmentResult};
use std::sync::Arc;
use tracing::{debug, instrument};

// ==========================================
// FulfillmentOrchestrator - 齐套测算编排器
// ==========================================
// 红线: 只读，不改产品/清单/库存
pub struct FulfillmentOrchestrator<P, B, S>
where
    P: ProductCatalogReader,
    B: BomReader,
    S: StockLedgerReader,
{
    products: Arc<P>,
    bom: Arc<B>,
    allocator: LotAllocator<S>,
}

impl<P, B, S> FulfillmentOrchestrator<P, B, S>
where
    P: ProductCatalogReader,
    B: BomReader,
    S: StockLedgerReader,
{
    /// 创建新的 FulfillmentOrchestrator 实例
    ///
    /// # 参数
    /// - products: 产品目录读取器
    /// - bom: BOM 清单读取器
    /// - ledger: 库存批次读取器
    pub fn new(products: Arc<P>, bom: Arc<B>, ledger: Arc<S>) -> Self {
        Self {
            products,
            bom,
            allocator: LotAllocator::new(ledger),
        }
    }

    /// 测算单条齐套请求
    ///
    /// # 参数
    /// - request: 单条请求（编码 + 成品数量）
    ///
    /// # 返回
    /// - ProductFulfillmentReport: 产品展示名、请求数量、
    ///   按清单行顺序串接的分配明细
    ///
    /// # 错误
    /// - ProductNotFound: 编码精确匹配不到产品
    /// - RequirementOverflow: 行需求（单件用量 × 请求数量）超出 i64 范围
    #[instrument(skip(self, request), fields(product_code = %request.product_code))]
    pub async fn fulfill_single(
        &self,
        request: &FulfillmentRequest,
    ) -> FulfillmentResult<ProductFulfillmentReport> {
        // === 步骤 1: 按编码精确解析产品 ===
        let product = self
            .products
            .find_product_by_code(&request.product_code)
            .await
            .map_err(|e| FulfillmentError::DataAccess(e.to_string()))?
            .ok_or_else(|| FulfillmentError::ProductNotFound(request.product_code.clone()))?;

        // === 步骤 2: 读取 BOM 需求行（行序即输出顺序）===
        let requirements = self
            .bom
            .list_bom_requirements(product.id)
            .await
            .map_err(|e| FulfillmentError::DataAccess(e.to_string()))?;

        debug!(
            product_id = product.id,
            bom_lines = requirements.len(),
            quantity = request.quantity,
            "开始齐套测算"
        );

        // === 步骤 3: 按行放大需求并逐物料分配 ===
        // 行需求 = 单件用量 × 请求成品数量，溢出即整批失败
        let mut allocations = Vec::new();
        for requirement in &requirements {
            let required_qty = requirement
                .quantity
                .checked_mul(request.quantity)
                .ok_or_else(|| FulfillmentError::RequirementOverflow {
                    product_code: request.product_code.clone(),
                    material_name: requirement.material.name.clone(),
                })?;
            let mut lines = self
                .allocator
                .allocate(&requirement.material, required_qty)
                .await?;
            allocations.append(&mut lines);
        }

        // === 步骤 4: 组装报告（quantity 为请求量）===
        Ok(ProductFulfillmentReport {
            product_name: product.name,
            quantity: request.quantity,
            allocations,
        })
    }

    /// 批量测算齐套请求（快速失败）
    ///
    /// 按请求顺序逐条测算；任一请求的产品编码不存在时
    /// 整批返回错误，不产出部分结果。各请求基于同一库存
    /// 快照独立测算，相互之间不扣减。
    ///
    /// # 参数
    /// - requests: 请求批次（可为空，返回空报告列表）
    ///
    /// # 返回
    /// - Vec<ProductFulfillmentReport>: 与请求同序的报告列表
    pub async fn fulfill_batch(
        &self,
        requests: &[FulfillmentRequest],
    ) -> FulfillmentResult<Vec<ProductFulfillmentReport>> {
        let mut reports = Vec::with_capacity(requests.len());

        for request in requests {
            reports.push(self.fulfill_single(request).await?);
        }

        Ok(reports)
    }
}

// ==========================================
// 物料齐套测算系统 - 库存批次分配引擎
// ==========================================
// 职责: 对单一物料的需求量按批次顺序扣减库存，生成分配明细
// 输入: 物料主数据 + 需求数量 + 库存批次
// 输出: Vec<MaterialAllocation>（含至多一条缺料标记）
// 红线: 不写库、不拼 SQL；库存不足必须显式输出缺口行
// ==========================================

use crate::domain::fulfillment::MaterialAllocation;
use crate::domain::material::Material;
use crate::domain::stock::StockLot;
use crate::engine::accessors::StockLedgerReader;
use crate::engine::error::{FulfillmentError, FulfillmentResult};
use std::sync::Arc;
use tracing::debug;

// ==========================================
// LotAllocator - 批次分配引擎
// ==========================================
// 红线: 只读库存快照，重复测算不相互扣减
pub struct LotAllocator<S>
where
    S: StockLedgerReader,
{
    ledger: Arc<S>,
}

impl<S> LotAllocator<S>
where
    S: StockLedgerReader,
{
    /// 创建新的 LotAllocator 实例
    ///
    /// # 参数
    /// - ledger: 库存批次读取器
    pub fn new(ledger: Arc<S>) -> Self {
        Self { ledger }
    }

    /// 为单个物料分配库存批次
    ///
    /// # 参数
    /// - material: 物料主数据
    /// - required_qty: 需求数量（0 返回空序列）
    ///
    /// # 返回
    /// - Vec<MaterialAllocation>: 按批次 ID 升序的分配明细，
    ///   库存不足时末尾追加一条缺料标记
    pub async fn allocate(
        &self,
        material: &Material,
        required_qty: i64,
    ) -> FulfillmentResult<Vec<MaterialAllocation>> {
        let lots = self
            .ledger
            .list_stock_lots(material.id)
            .await
            .map_err(|e| FulfillmentError::DataAccess(e.to_string()))?;

        Ok(allocate_from_lots(&material.name, required_qty, lots))
    }
}

/// 批次扣减的纯计算核心
///
/// # 消耗规则
/// 1. 批次按 ID 升序消耗（入库越早 ID 越小）
/// 2. 余量 <= 0 的批次跳过，不产出分配行
/// 3. 每批扣减 min(批次余量, 剩余需求)
/// 4. 需求清零立即停止，后续批次不再读取
/// 5. 批次耗尽仍有剩余需求时，追加一条缺料标记（无批次 ID、无单价）
///
/// # 参数
/// - material_name: 物料展示名称（写入每条分配行）
/// - required_qty: 需求数量
/// - lots: 库存批次（顺序任意，内部统一排序）
pub fn allocate_from_lots(
    material_name: &str,
    required_qty: i64,
    mut lots: Vec<StockLot>,
) -> Vec<MaterialAllocation> {
    let mut allocations = Vec::new();

    if required_qty <= 0 {
        return allocations;
    }

    // 访问器不保证返回顺序，这里统一按批次 ID 升序
    lots.sort_by_key(|lot| lot.id);

    let mut remaining = required_qty;
    for lot in &lots {
        if remaining == 0 {
            break;
        }

        // 余量非正的批次不可用
        if lot.remainder <= 0 {
            continue;
        }

        let take = lot.remainder.min(remaining);
        allocations.push(MaterialAllocation::from_lot(
            lot.id,
            material_name,
            take,
            lot.price,
        ));
        remaining -= take;
    }

    if remaining > 0 {
        debug!(
            material = %material_name,
            shortage = remaining,
            "库存不足，追加缺料标记"
        );
        allocations.push(MaterialAllocation::shortage(material_name, remaining));
    }

    allocations
}

// ==========================================
// 物料齐套测算系统 - 库存领域模型
// ==========================================
// 对齐: warehouse_stock 表
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// StockLot - 库存批次
// ==========================================
// 约束: id 仅作为稳定消耗顺序键（先进先出按 id 升序）
// 约束: remainder 非负; price 允许 NULL（未定价批次）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLot {
    pub id: i64,            // 批次主键（分配顺序键）
    pub material_id: i64,   // 关联 material_master（FK）
    pub remainder: i64,     // 剩余可用数量
    pub price: Option<f64>, // 批次单价
}

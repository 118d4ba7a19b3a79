// ==========================================
// 物料齐套测算系统 - 齐套测算输出模型
// ==========================================
// 用途: 分配引擎与编排器的派生输出,按请求现场构造
// 红线: 不落库,不回写库存
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// FulfillmentRequest - 单条齐套请求
// ==========================================
// 说明: product_code 已在边界层规范化为字符串
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentRequest {
    pub product_code: String, // 产品外部编码
    pub quantity: i64,        // 请求的成品数量（缺省 0）
}

impl FulfillmentRequest {
    pub fn new(product_code: impl Into<String>, quantity: i64) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
        }
    }
}

// ==========================================
// MaterialAllocation - 单条批次分配结果
// ==========================================
// 约束: lot_id 与 price 同时为 None 表示缺料标记
//       （需求量中无法从任何批次满足的部分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialAllocation {
    pub lot_id: Option<i64>,   // 来源批次 id（缺料标记为 None）
    pub material_name: String, // 物料展示名称
    pub quantity: i64,         // 本条分配/缺口数量
    pub price: Option<f64>,    // 批次单价（缺料标记为 None）
}

impl MaterialAllocation {
    /// 构造一条来自具体批次的分配
    pub fn from_lot(lot_id: i64, material_name: impl Into<String>, quantity: i64, price: Option<f64>) -> Self {
        Self {
            lot_id: Some(lot_id),
            material_name: material_name.into(),
            quantity,
            price,
        }
    }

    /// 构造缺料标记（无批次、无单价）
    pub fn shortage(material_name: impl Into<String>, quantity: i64) -> Self {
        Self {
            lot_id: None,
            material_name: material_name.into(),
            quantity,
            price: None,
        }
    }

    /// 是否为缺料标记
    pub fn is_shortage(&self) -> bool {
        self.lot_id.is_none()
    }
}

// ==========================================
// ProductFulfillmentReport - 单产品齐套报告
// ==========================================
// 说明: quantity 为请求数量（非已满足数量）
//       allocations 按清单行顺序串接各物料的分配序列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFulfillmentReport {
    pub product_name: String,                 // 产品展示名称
    pub quantity: i64,                        // 请求的成品数量
    pub allocations: Vec<MaterialAllocation>, // 物料分配明细
}

impl ProductFulfillmentReport {
    /// 报告内是否存在任何缺料标记
    pub fn has_shortage(&self) -> bool {
        self.allocations.iter().any(|a| a.is_shortage())
    }
}

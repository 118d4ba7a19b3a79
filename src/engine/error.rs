// ==========================================
// 物料齐套测算系统 - 引擎层错误
// ==========================================
// 职责: 定义齐套测算引擎的错误类型
// 红线: 产品编码未命中必须整批失败，不产出部分结果
// ==========================================

use thiserror::Error;

/// 齐套测算引擎错误
#[derive(Error, Debug)]
pub enum FulfillmentError {
    /// 产品编码不存在（携带请求中的原始编码）
    #[error("产品编码不存在: {0}")]
    ProductNotFound(String),

    /// 行需求量溢出（单件用量 × 请求数量超出 i64 范围）
    #[error("需求量溢出: 产品 {product_code} 物料 {material_name}")]
    RequirementOverflow {
        product_code: String,
        material_name: String,
    },

    /// 底层数据访问失败
    #[error("数据访问失败: {0}")]
    DataAccess(String),
}

/// 引擎层操作结果
pub type FulfillmentResult<T> = Result<T, FulfillmentError>;

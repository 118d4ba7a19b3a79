// ==========================================
// 物料齐套测算系统 - 请求校验器
// ==========================================
// 职责: 齐套请求的入参形状校验（编码非空、数量非负）
// 红线: 校验不通过的批次不得进入测算引擎
// ==========================================

use crate::api::error::{ApiError, ApiResult, FieldViolation};
use crate::domain::fulfillment::FulfillmentRequest;

// ==========================================
// FulfillmentRequestValidator - 齐套请求校验器
// ==========================================

/// 齐套请求校验器
///
/// 职责：
/// 1. 校验产品编码非空（仅空白视同为空）
/// 2. 校验请求数量非负
/// 3. 汇总整批的逐条违规明细（不在第一条就停）
pub struct FulfillmentRequestValidator;

impl FulfillmentRequestValidator {
    /// 创建新的FulfillmentRequestValidator实例
    pub fn new() -> Self {
        Self
    }

    /// 校验齐套请求批次
    ///
    /// # 参数
    /// - requests: 已规范化的请求列表（编码已归一为字符串）
    ///
    /// # 返回
    /// - Ok(()): 校验通过
    /// - Err(ApiError::RequestValidationError): 含全部违规明细
    pub fn validate(&self, requests: &[FulfillmentRequest]) -> ApiResult<()> {
        let mut violations = Vec::new();

        for (index, request) in requests.iter().enumerate() {
            if request.product_code.trim().is_empty() {
                violations.push(FieldViolation {
                    index,
                    field: "product_code".to_string(),
                    message: "产品编码不能为空".to_string(),
                });
            }

            if request.quantity < 0 {
                violations.push(FieldViolation {
                    index,
                    field: "quantity".to_string(),
                    message: format!("数量不能为负数: {}", request.quantity),
                });
            }
        }

        if !violations.is_empty() {
            return Err(ApiError::RequestValidationError {
                reason: format!("{}条请求行校验失败", violations.len()),
                violations,
            });
        }

        Ok(())
    }
}

impl Default for FulfillmentRequestValidator {
    fn default() -> Self {
        Self::new()
    }
}

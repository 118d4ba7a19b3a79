// ==========================================
// 物料齐套测算系统 - 齐套测算 API
// ==========================================
// 职责: 齐套请求的解析、校验、测算与报文组装
// 红线: 编码未命中整批失败；对外报文字段为固定契约
// ==========================================

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult, FieldViolation};
use crate::api::validator::FulfillmentRequestValidator;
use crate::domain::fulfillment::{FulfillmentRequest, MaterialAllocation, ProductFulfillmentReport};
use crate::engine::FulfillmentOrchestrator;
use crate::perf::PerfGuard;
use crate::repository::bom_repo::BomLineRepository;
use crate::repository::product_repo::ProductRepository;
use crate::repository::stock_repo::StockLotRepository;

// ==========================================
// 请求 DTO
// ==========================================

/// 单条齐套请求行
///
/// product_code 允许字符串或整数两种 JSON 形态，统一归一为字符串；
/// quantity 缺省为 0。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentLineDto {
    #[serde(deserialize_with = "deserialize_product_code")]
    pub product_code: String,
    #[serde(default)]
    pub quantity: i64,
}

/// 齐套请求报文（顶层 products 键包裹请求数组）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentRequestEnvelope {
    pub products: Vec<FulfillmentLineDto>,
}

/// product_code 的字符串/整数双形态解析
fn deserialize_product_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CodeRepr {
        Text(String),
        Number(i64),
    }

    match CodeRepr::deserialize(deserializer)? {
        CodeRepr::Text(text) => Ok(text),
        CodeRepr::Number(number) => Ok(number.to_string()),
    }
}

impl From<FulfillmentLineDto> for FulfillmentRequest {
    fn from(dto: FulfillmentLineDto) -> Self {
        FulfillmentRequest::new(dto.product_code, dto.quantity)
    }
}

// ==========================================
// 响应 DTO
// ==========================================

/// 单条物料分配行
/// 对外字段名沿用仓位口径（warehouse_id 即批次 ID）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialAllocationDto {
    /// 来源批次 ID（缺料标记为 null）
    pub warehouse_id: Option<i64>,
    /// 物料展示名称
    pub material_name: String,
    /// 分配/缺口数量
    pub qty: i64,
    /// 批次单价（缺料标记为 null）
    pub price: Option<f64>,
}

impl From<&MaterialAllocation> for MaterialAllocationDto {
    fn from(allocation: &MaterialAllocation) -> Self {
        Self {
            warehouse_id: allocation.lot_id,
            material_name: allocation.material_name.clone(),
            qty: allocation.quantity,
            price: allocation.price,
        }
    }
}

/// 单产品齐套报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReportDto {
    /// 产品展示名称
    pub product_name: String,
    /// 请求的成品数量（非已满足数量）
    pub product_qty: i64,
    /// 物料分配明细（清单行顺序）
    pub product_materials: Vec<MaterialAllocationDto>,
}

impl From<&ProductFulfillmentReport> for ProductReportDto {
    fn from(report: &ProductFulfillmentReport) -> Self {
        Self {
            product_name: report.product_name.clone(),
            product_qty: report.quantity,
            product_materials: report.allocations.iter().map(Into::into).collect(),
        }
    }
}

/// 齐套测算成功响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentResponse {
    /// 与请求同序的产品报告列表
    pub result: Vec<ProductReportDto>,
}

impl FulfillmentResponse {
    pub fn from_reports(reports: &[ProductFulfillmentReport]) -> Self {
        Self {
            result: reports.iter().map(Into::into).collect(),
        }
    }
}

/// 齐套测算失败响应
///
/// errors 为字符串（编码未命中等单消息错误）或
/// 字段违规数组（请求形状校验失败）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: serde_json::Value,
}

impl ErrorResponse {
    /// 单消息错误
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            errors: serde_json::Value::String(msg.into()),
        }
    }

    /// 字段违规明细错误
    pub fn field_violations(violations: &[FieldViolation]) -> Self {
        Self {
            errors: serde_json::to_value(violations)
                .unwrap_or_else(|_| serde_json::Value::String("请求校验失败".to_string())),
        }
    }

    /// 从 API 错误组装失败响应
    pub fn from_api_error(err: &ApiError) -> Self {
        match err {
            ApiError::RequestValidationError { violations, .. } => {
                Self::field_violations(violations)
            }
            other => Self::message(other.to_string()),
        }
    }
}

// ==========================================
// FulfillmentApi - 齐套测算 API
// ==========================================

/// 齐套测算API
///
/// 职责：
/// 1. 请求行规范化（编码归一为字符串）与形状校验
/// 2. 调用编排器执行整批测算
/// 3. 组装对外报文（成功 result / 失败 errors）
pub struct FulfillmentApi {
    orchestrator: FulfillmentOrchestrator<ProductRepository, BomLineRepository, StockLotRepository>,
    validator: FulfillmentRequestValidator,
}

impl FulfillmentApi {
    /// 创建新的FulfillmentApi实例
    ///
    /// # 参数
    /// - product_repo: 产品主数据仓储
    /// - bom_repo: BOM 清单仓储
    /// - stock_repo: 库存批次仓储
    pub fn new(
        product_repo: Arc<ProductRepository>,
        bom_repo: Arc<BomLineRepository>,
        stock_repo: Arc<StockLotRepository>,
    ) -> Self {
        Self {
            orchestrator: FulfillmentOrchestrator::new(product_repo, bom_repo, stock_repo),
            validator: FulfillmentRequestValidator::new(),
        }
    }

    /// 批量齐套测算
    ///
    /// # 参数
    /// - lines: 请求行列表（与报文数组同序）
    ///
    /// # 返回
    /// - Ok(FulfillmentResponse): 与请求同序的产品报告
    /// - Err(ApiError::RequestValidationError): 形状校验失败
    /// - Err(ApiError::ProductNotFound): 首个未命中的产品编码，整批失败
    /// - Err(ApiError::InvalidInput): 行需求放大后超出可计算范围
    pub async fn fulfill_products(
        &self,
        lines: Vec<FulfillmentLineDto>,
    ) -> ApiResult<FulfillmentResponse> {
        let _guard = PerfGuard::new("fulfill_products");

        // 规范化 + 形状校验
        let requests: Vec<FulfillmentRequest> =
            lines.into_iter().map(FulfillmentRequest::from).collect();
        self.validator.validate(&requests)?;

        debug!(request_count = requests.len(), "开始批量齐套测算");

        // 引擎测算（编码未命中整批失败）
        let reports = self.orchestrator.fulfill_batch(&requests).await?;

        Ok(FulfillmentResponse::from_reports(&reports))
    }

    /// 解析请求报文并执行批量齐套测算
    ///
    /// # 参数
    /// - body: JSON 报文，顶层须含 products 数组
    pub async fn fulfill_from_json(&self, body: &str) -> ApiResult<FulfillmentResponse> {
        let envelope: FulfillmentRequestEnvelope = serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidInput(format!("请求报文解析失败: {}", e)))?;

        self.fulfill_products(envelope.products).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================
    // 请求解析测试
    // ==========================================

    #[test]
    fn test_line_dto_accepts_string_code() {
        let dto: FulfillmentLineDto =
            serde_json::from_str(r#"{"product_code": "P1001", "quantity": 3}"#).unwrap();
        assert_eq!(dto.product_code, "P1001");
        assert_eq!(dto.quantity, 3);
    }

    #[test]
    fn test_line_dto_accepts_integer_code() {
        let dto: FulfillmentLineDto =
            serde_json::from_str(r#"{"product_code": 238923, "quantity": 100}"#).unwrap();
        assert_eq!(dto.product_code, "238923"); // 整数归一为字符串
    }

    #[test]
    fn test_line_dto_missing_quantity_defaults_zero() {
        let dto: FulfillmentLineDto =
            serde_json::from_str(r#"{"product_code": "P1001"}"#).unwrap();
        assert_eq!(dto.quantity, 0);
    }

    #[test]
    fn test_envelope_requires_products_key() {
        let parsed: Result<FulfillmentRequestEnvelope, _> =
            serde_json::from_str(r#"{"items": []}"#);
        assert!(parsed.is_err());

        let envelope: FulfillmentRequestEnvelope = serde_json::from_str(
            r#"{"products": [{"product_code": 7, "quantity": 1}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.products.len(), 1);
        assert_eq!(envelope.products[0].product_code, "7");
    }

    // ==========================================
    // 响应报文形状测试
    // ==========================================

    #[test]
    fn test_response_wire_shape() {
        let report = ProductFulfillmentReport {
            product_name: "Koylak".to_string(),
            quantity: 50,
            allocations: vec![
                MaterialAllocation::from_lot(1, "Mato", 30, Some(1000.0)),
                MaterialAllocation::shortage("Mato", 20),
            ],
        };
        let response = FulfillmentResponse::from_reports(&[report]);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["result"][0]["product_name"], "Koylak");
        assert_eq!(value["result"][0]["product_qty"], 50);

        let materials = &value["result"][0]["product_materials"];
        assert_eq!(materials[0]["warehouse_id"], 1);
        assert_eq!(materials[0]["material_name"], "Mato");
        assert_eq!(materials[0]["qty"], 30);
        assert_eq!(materials[0]["price"], 1000.0);

        // 缺料标记: warehouse_id 与 price 序列化为 null
        assert!(materials[1]["warehouse_id"].is_null());
        assert_eq!(materials[1]["qty"], 20);
        assert!(materials[1]["price"].is_null());
    }

    #[test]
    fn test_error_response_not_found_shape() {
        let err = ApiError::ProductNotFound("238923".to_string());
        let response = ErrorResponse::from_api_error(&err);

        let body = serde_json::to_string(&response).unwrap();
        assert_eq!(
            body,
            r#"{"errors":"Product with code 238923 not found."}"#
        );
    }

    #[test]
    fn test_error_response_validation_shape() {
        let err = ApiError::RequestValidationError {
            reason: "1条请求行校验失败".to_string(),
            violations: vec![FieldViolation {
                index: 0,
                field: "quantity".to_string(),
                message: "数量不能为负数: -1".to_string(),
            }],
        };
        let response = ErrorResponse::from_api_error(&err);

        let value = serde_json::to_value(&response).unwrap();
        assert!(value["errors"].is_array());
        assert_eq!(value["errors"][0]["field"], "quantity");
        assert_eq!(value["errors"][0]["index"], 0);
    }
}

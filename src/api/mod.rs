// ==========================================
// 物料齐套测算系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供 CLI 入口调用
// ==========================================

pub mod catalog_api;
pub mod error;
pub mod fulfillment_api;
pub mod validator;

// 重导出核心类型
pub use catalog_api::{CatalogApi, MaterialStockResponse, ProductDetailResponse, ProductListResponse};
pub use error::{ApiError, ApiResult, FieldViolation};
pub use fulfillment_api::{
    ErrorResponse, FulfillmentApi, FulfillmentLineDto, FulfillmentRequestEnvelope,
    FulfillmentResponse,
};
pub use validator::FulfillmentRequestValidator;

// ==========================================
// 物料齐套测算系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换 Repository/Engine 错误为用户可读的错误消息
// ==========================================

use crate::engine::FulfillmentError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 齐套测算错误
    // ==========================================
    /// 产品编码未命中
    /// 对外文案为固定契约，不做本地化
    #[error("Product with code {0} not found.")]
    ProductNotFound(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 请求体校验失败（带逐条违规明细）
    #[error("请求校验失败: {reason}")]
    RequestValidationError {
        reason: String,
        violations: Vec<FieldViolation>,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户可读的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 FulfillmentError 转换
// 目的: 引擎层错误映射为对外错误（含固定文案的编码未命中）
// ==========================================
impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        match err {
            FulfillmentError::ProductNotFound(code) => ApiError::ProductNotFound(code),
            FulfillmentError::RequirementOverflow {
                product_code,
                material_name,
            } => ApiError::InvalidInput(format!(
                "需求量溢出: 产品 {} 物料 {} 的需求超出可计算范围",
                product_code, material_name
            )),
            FulfillmentError::DataAccess(msg) => ApiError::DatabaseError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 请求字段违规详情
// ==========================================

/// 请求字段违规详情
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FieldViolation {
    /// 请求数组中的下标（从 0 开始）
    pub index: usize,
    /// 字段名
    pub field: String,
    /// 违规说明
    pub message: String,
}

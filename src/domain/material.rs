// ==========================================
// 物料齐套测算系统 - 物料领域模型
// ==========================================
// 对齐: material_master 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Material - 物料主数据
// ==========================================
// 用途: 导入层写入,引擎层只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    // ===== 主键 =====
    pub id: i64, // 内部自增主键

    // ===== 基础信息 =====
    pub name: String, // 物料展示名称（导入时按名称去重）

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

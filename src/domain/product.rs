// ==========================================
// 物料齐套测算系统 - 产品领域模型
// ==========================================
// 对齐: product_master / product_bom 表
// ==========================================

use crate::domain::material::Material;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Product - 成品主数据
// ==========================================
// 用途: 导入层写入,引擎层只读
// 约束: code 全局唯一,按 code 精确解析
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    // ===== 主键 =====
    pub id: i64, // 内部自增主键

    // ===== 基础信息 =====
    pub code: String, // 产品外部编码（唯一，请求按此解析）
    pub name: String, // 产品展示名称

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

// ==========================================
// BomLine - 物料清单行
// ==========================================
// 约束: 同一产品允许多行同物料,每行独立分配
// 约束: quantity 非负,缺省为 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLine {
    pub id: i64,          // 清单行主键（同时作为行稳定顺序键）
    pub product_id: i64,  // 关联 product_master（FK）
    pub material_id: i64, // 关联 material_master（FK）
    pub quantity: i64,    // 单件产品消耗的物料数量
}

// ==========================================
// BomRequirement - 物料需求视图
// ==========================================
// 用途: BOM 访问器输出（物料 + 单件用量），引擎按此展开需求
// 生命周期: 查询时组装,不落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomRequirement {
    pub line_id: i64,       // 来源清单行 id（保持行顺序）
    pub material: Material, // 物料快照
    pub quantity: i64,      // 单件产品消耗的物料数量
}

// ==========================================
// 物料齐套测算系统 - 物料清单仓储
// ==========================================
/// 物料清单仓储
/// 职责: 管理 product_bom 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问
use crate::db::open_sqlite_connection;
use crate::domain::material::Material;
use crate::domain::product::{BomLine, BomRequirement};
use crate::engine::accessors::BomReader;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

pub struct BomLineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BomLineRepository {
    /// 创建新的 BomLineRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询产品的清单行（按行 id 升序，带物料快照）
    ///
    /// # 参数
    /// - product_id: 产品内部 id
    ///
    /// # 返回
    /// - Ok(Vec<BomRequirement>): 物料需求列表，行顺序稳定
    ///
    /// # 说明
    /// - 行 id 即插入顺序，作为清单行的稳定顺序键
    pub fn list_requirements(&self, product_id: i64) -> RepositoryResult<Vec<BomRequirement>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT pb.id, pb.quantity,
                   m.id, m.name, m.created_at, m.updated_at
            FROM product_bom pb
            JOIN material_master m ON m.id = pb.material_id
            WHERE pb.product_id = ?1
            ORDER BY pb.id
            "#,
        )?;

        let requirements = stmt
            .query_map(params![product_id], |row| {
                Ok(BomRequirement {
                    line_id: row.get(0)?,
                    quantity: row.get(1)?,
                    material: Material {
                        id: row.get(2)?,
                        name: row.get(3)?,
                        created_at: row
                            .get::<_, String>(4)?
                            .parse::<chrono::DateTime<chrono::Utc>>()
                            .unwrap_or_else(|_| Utc::now()),
                        updated_at: row
                            .get::<_, String>(5)?
                            .parse::<chrono::DateTime<chrono::Utc>>()
                            .unwrap_or_else(|_| Utc::now()),
                    },
                })
            })?
            .collect::<rusqlite::Result<Vec<BomRequirement>>>()?;

        Ok(requirements)
    }

    /// 查询产品的原始清单行（按行 id 升序）
    pub fn list_lines(&self, product_id: i64) -> RepositoryResult<Vec<BomLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, product_id, material_id, quantity
            FROM product_bom
            WHERE product_id = ?1
            ORDER BY id
            "#,
        )?;

        let lines = stmt
            .query_map(params![product_id], |row| {
                Ok(BomLine {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    material_id: row.get(2)?,
                    quantity: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<BomLine>>>()?;

        Ok(lines)
    }

    /// 统计产品的清单行数
    pub fn count_lines(&self, product_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM product_bom WHERE product_id = ?1",
            params![product_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 插入单条清单行
    ///
    /// # 返回
    /// - Ok(i64): 新行 id
    pub fn insert_line(&self, product_id: i64, material_id: i64, quantity: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO product_bom (product_id, material_id, quantity) VALUES (?1, ?2, ?3)",
            params![product_id, material_id, quantity],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 整体替换某产品的清单行（一个事务）
    ///
    /// # 参数
    /// - product_id: 产品内部 id
    /// - lines: (material_id, quantity) 列表，按期望顺序给出
    ///
    /// # 返回
    /// - Ok(usize): 写入的行数
    ///
    /// # 说明
    /// - 导入层重导 BOM 时使用：删旧插新，避免重复行叠加需求
    pub fn replace_product_lines(
        &self,
        product_id: i64,
        lines: &[(i64, i64)],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM product_bom WHERE product_id = ?1",
            params![product_id],
        )?;

        let mut count = 0;
        for (material_id, quantity) in lines {
            tx.execute(
                "INSERT INTO product_bom (product_id, material_id, quantity) VALUES (?1, ?2, ?3)",
                params![product_id, material_id, quantity],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 批量替换多个产品的清单行（全部产品共用一个事务）
    ///
    /// # 参数
    /// - groups: (product_id, (material_id, quantity) 列表) 分组
    ///
    /// # 返回
    /// - Ok(usize): 写入的总行数
    ///
    /// # 说明
    /// - 整文件导入时使用，任一产品失败则整体回滚
    pub fn replace_lines_grouped(
        &self,
        groups: &[(i64, Vec<(i64, i64)>)],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for (product_id, lines) in groups {
            tx.execute(
                "DELETE FROM product_bom WHERE product_id = ?1",
                params![product_id],
            )?;

            for (material_id, quantity) in lines {
                tx.execute(
                    "INSERT INTO product_bom (product_id, material_id, quantity) VALUES (?1, ?2, ?3)",
                    params![product_id, material_id, quantity],
                )?;
                count += 1;
            }
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// BomReader Trait 实现
// ==========================================
#[async_trait]
impl BomReader for BomLineRepository {
    async fn list_bom_requirements(
        &self,
        product_id: i64,
    ) -> Result<Vec<BomRequirement>, Box<dyn Error>> {
        Ok(self.list_requirements(product_id)?)
    }
}

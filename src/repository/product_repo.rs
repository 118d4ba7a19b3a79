// ==========================================
// 物料齐套测算系统 - 产品主数据仓储
// ==========================================
/// 产品主数据仓储
/// 职责: 管理 product_master 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问
use crate::db::open_sqlite_connection;
use crate::domain::product::Product;
use crate::engine::accessors::ProductCatalogReader;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::sync::{Arc, Mutex};

pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    /// 创建新的 ProductRepository 实例
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

    fn map_product_row(row: &Row) -> rusqlite::Result<Product> {
        Ok(Product {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            created_at: row
                .get::<_, String>(3)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| Utc::now()),
            updated_at: row
                .get::<_, String>(4)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    /// 按产品编码精确查询
    ///
    /// # 参数
    /// - code: 产品外部编码
    ///
    /// # 返回
    /// - Ok(Some(Product)): 找到记录
    /// - Ok(None): 未找到记录
    /// - Err: 数据库错误
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT id, code, name, created_at, updated_at
            FROM product_master
            WHERE code = ?1
            "#,
            params![code],
            Self::map_product_row,
        );

        match result {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按内部 id 查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT id, code, name, created_at, updated_at
            FROM product_master
            WHERE id = ?1
            "#,
            params![id],
            Self::map_product_row,
        );

        match result {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 分页查询产品列表（按 code 升序）
    ///
    /// # 参数
    /// - limit: 每页条数
    /// - offset: 起始偏移
    pub fn list_products(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, code, name, created_at, updated_at
            FROM product_master
            ORDER BY code
            LIMIT ?1 OFFSET ?2
            "#,
        )?;

        let products = stmt
            .query_map(params![limit, offset], Self::map_product_row)?
            .collect::<rusqlite::Result<Vec<Product>>>()?;

        Ok(products)
    }

    /// 统计产品总数
    pub fn count_products(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM product_master", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 按编码 upsert 单个产品
    ///
    /// # 返回
    /// - Ok(i64): 产品内部 id
    ///
    /// # 说明
    /// - 使用 ON CONFLICT DO UPDATE，编码已存在时只更新名称，保持内部 id 不变
    ///   （product_bom 以内部 id 关联，id 不能因重导入而改变）
    pub fn upsert_product(&self, code: &str, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO product_master (code, name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(code) DO UPDATE SET name = excluded.name, updated_at = excluded.updated_at
            "#,
            params![code, name, now],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM product_master WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 批量 upsert 产品（一个事务）
    ///
    /// # 参数
    /// - products: (code, name) 列表
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    pub fn batch_upsert_products(&self, products: &[(String, String)]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let now = Utc::now().to_rfc3339();
        let mut count = 0;
        for (code, name) in products {
            tx.execute(
                r#"
                INSERT INTO product_master (code, name, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?3)
                ON CONFLICT(code) DO UPDATE SET name = excluded.name, updated_at = excluded.updated_at
                "#,
                params![code, name, now],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// ProductCatalogReader Trait 实现
// ==========================================
#[async_trait]
impl ProductCatalogReader for ProductRepository {
    async fn find_product_by_code(&self, code: &str) -> Result<Option<Product>, Box<dyn Error>> {
        Ok(self.find_by_code(code)?)
    }
}

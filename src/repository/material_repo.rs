// ==========================================
// 物料齐套测算系统 - 物料主数据仓储
// ==========================================
/// 物料主数据仓储
/// 职责: 管理 material_master 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问
use crate::db::open_sqlite_connection;
use crate::domain::material::Material;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct MaterialRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialRepository {
    /// 创建新的 MaterialRepository 实例
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

    fn map_material_row(row: &Row) -> rusqlite::Result<Material> {
        Ok(Material {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row
                .get::<_, String>(2)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| Utc::now()),
            updated_at: row
                .get::<_, String>(3)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    /// 按内部 id 查询
    ///
    /// # 返回
    /// - Ok(Some(Material)): 找到记录
    /// - Ok(None): 未找到记录
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Material>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT id, name, created_at, updated_at
            FROM material_master
            WHERE id = ?1
            "#,
            params![id],
            Self::map_material_row,
        );

        match result {
            Ok(material) => Ok(Some(material)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按名称查询（同名取 id 最小的一条）
    ///
    /// # 说明
    /// - 名称不设唯一约束；导入层按名称去重时取最早的记录
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Material>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT id, name, created_at, updated_at
            FROM material_master
            WHERE name = ?1
            ORDER BY id
            LIMIT 1
            "#,
            params![name],
            Self::map_material_row,
        );

        match result {
            Ok(material) => Ok(Some(material)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部物料（按 id 升序）
    pub fn list_materials(&self) -> RepositoryResult<Vec<Material>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, created_at, updated_at
            FROM material_master
            ORDER BY id
            "#,
        )?;

        let materials = stmt
            .query_map([], Self::map_material_row)?
            .collect::<rusqlite::Result<Vec<Material>>>()?;

        Ok(materials)
    }

    /// 插入单个物料
    ///
    /// # 返回
    /// - Ok(i64): 新记录内部 id
    pub fn insert_material(&self, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO material_master (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![name, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 批量插入缺失的物料名称（一个事务）
    ///
    /// # 参数
    /// - names: 物料名称列表（允许重复，事务内先到先插）
    ///
    /// # 返回
    /// - Ok(usize): 实际新增的记录数（已存在的名称跳过）
    pub fn batch_insert_missing(&self, names: &[String]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let now = Utc::now().to_rfc3339();
        let mut count = 0;
        for name in names {
            // 仅"无行"视为缺失，其他查询错误向上传播
            let exists = match tx.query_row(
                "SELECT 1 FROM material_master WHERE name = ?1 LIMIT 1",
                params![name],
                |_row| Ok(true),
            ) {
                Ok(_) => true,
                Err(rusqlite::Error::QueryReturnedNoRows) => false,
                Err(e) => return Err(e.into()),
            };
            if exists {
                continue;
            }

            tx.execute(
                "INSERT INTO material_master (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
                params![name, now],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }
}

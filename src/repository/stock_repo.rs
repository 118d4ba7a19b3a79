// ==========================================
// 物料齐套测算系统 - 库存批次仓储
// ==========================================
/// 库存批次仓储
/// 职责: 管理 warehouse_stock 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问；齐套测算绝不回写本表
use crate::db::open_sqlite_connection;
use crate::domain::stock::StockLot;
use crate::engine::accessors::StockLedgerReader;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 待插入的库存批次（无 id）
#[derive(Debug, Clone)]
pub struct NewStockLot {
    pub material_id: i64,
    pub remainder: i64,
    pub price: Option<f64>,
}

pub struct StockLotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StockLotRepository {
    /// 创建新的 StockLotRepository 实例
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

    fn map_lot_row(row: &Row) -> rusqlite::Result<StockLot> {
        Ok(StockLot {
            id: row.get(0)?,
            material_id: row.get(1)?,
            remainder: row.get(2)?,
            price: row.get(3)?,
        })
    }

    /// 查询某物料的全部批次（按批次 id 升序）
    ///
    /// # 参数
    /// - material_id: 物料内部 id
    ///
    /// # 说明
    /// - 含 remainder <= 0 的批次；是否跳过由分配引擎决定
    pub fn list_lots_by_material(&self, material_id: i64) -> RepositoryResult<Vec<StockLot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, material_id, remainder, price
            FROM warehouse_stock
            WHERE material_id = ?1
            ORDER BY id
            "#,
        )?;

        let lots = stmt
            .query_map(params![material_id], Self::map_lot_row)?
            .collect::<rusqlite::Result<Vec<StockLot>>>()?;

        Ok(lots)
    }

    /// 某物料的可用余量合计（仅计 remainder > 0 的批次）
    pub fn total_remainder(&self, material_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(remainder), 0)
            FROM warehouse_stock
            WHERE material_id = ?1 AND remainder > 0
            "#,
            params![material_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 插入单个批次
    ///
    /// # 返回
    /// - Ok(i64): 新批次 id
    pub fn insert_lot(
        &self,
        material_id: i64,
        remainder: i64,
        price: Option<f64>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO warehouse_stock (material_id, remainder, price) VALUES (?1, ?2, ?3)",
            params![material_id, remainder, price],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 批量插入批次（一个事务）
    ///
    /// # 参数
    /// - lots: 待插入批次列表
    ///
    /// # 返回
    /// - Ok(usize): 插入的记录数
    ///
    /// # 说明
    /// - 追加语义：每行即一个新批次；全量刷新请重建数据库后再导入
    pub fn batch_insert_lots(&self, lots: &[NewStockLot]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for lot in lots {
            tx.execute(
                "INSERT INTO warehouse_stock (material_id, remainder, price) VALUES (?1, ?2, ?3)",
                params![lot.material_id, lot.remainder, lot.price],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// StockLedgerReader Trait 实现
// ==========================================
#[async_trait]
impl StockLedgerReader for StockLotRepository {
    async fn list_stock_lots(&self, material_id: i64) -> Result<Vec<StockLot>, Box<dyn Error>> {
        Ok(self.list_lots_by_material(material_id)?)
    }
}

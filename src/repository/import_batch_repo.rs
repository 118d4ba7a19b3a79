// ==========================================
// 物料齐套测算系统 - 导入批次仓储
// ==========================================
/// 导入批次仓储
/// 职责: 管理 import_batch 表的数据访问（导入审计轨迹）
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

// ==========================================
// ImportBatchStatus - 导入批次状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportBatchStatus {
    Running,             // 导入进行中
    Completed,           // 全部行导入成功
    CompletedWithErrors, // 部分行失败（文件级成功）
    Failed,              // 文件级失败（未写入任何数据）
}

impl fmt::Display for ImportBatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImportBatchStatus::Running => "RUNNING",
            ImportBatchStatus::Completed => "COMPLETED",
            ImportBatchStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            ImportBatchStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

impl ImportBatchStatus {
    fn parse(s: &str) -> Self {
        match s {
            "RUNNING" => ImportBatchStatus::Running,
            "COMPLETED" => ImportBatchStatus::Completed,
            "COMPLETED_WITH_ERRORS" => ImportBatchStatus::CompletedWithErrors,
            _ => ImportBatchStatus::Failed,
        }
    }
}

// ==========================================
// ImportBatchRecord - 导入批次记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatchRecord {
    pub batch_id: String,                   // 批次 uuid
    pub source_file: String,                // 源文件路径
    pub entity_kind: String,                // 导入的实体类型（products/materials/bom/stock）
    pub status: ImportBatchStatus,          // 批次状态
    pub total_rows: i64,                    // 文件总行数（不含表头）
    pub imported_rows: i64,                 // 成功行数
    pub failed_rows: i64,                   // 失败行数
    pub started_at: DateTime<Utc>,          // 开始时间
    pub finished_at: Option<DateTime<Utc>>, // 结束时间
}

pub struct ImportBatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportBatchRepository {
    /// 创建新的 ImportBatchRepository 实例
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

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_batch_row(row: &Row) -> rusqlite::Result<ImportBatchRecord> {
        Ok(ImportBatchRecord {
            batch_id: row.get(0)?,
            source_file: row.get(1)?,
            entity_kind: row.get(2)?,
            status: ImportBatchStatus::parse(&row.get::<_, String>(3)?),
            total_rows: row.get(4)?,
            imported_rows: row.get(5)?,
            failed_rows: row.get(6)?,
            started_at: row
                .get::<_, String>(7)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| Utc::now()),
            finished_at: row
                .get::<_, Option<String>>(8)?
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&chrono::Utc)),
        })
    }

    /// 写入新批次记录（状态 RUNNING）
    pub fn insert_batch(&self, record: &ImportBatchRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, source_file, entity_kind, status,
                total_rows, imported_rows, failed_rows, started_at, finished_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.batch_id,
                record.source_file,
                record.entity_kind,
                record.status.to_string(),
                record.total_rows,
                record.imported_rows,
                record.failed_rows,
                record.started_at.to_rfc3339(),
                record.finished_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// 完结批次：更新状态与行计数
    pub fn finalize_batch(
        &self,
        batch_id: &str,
        status: ImportBatchStatus,
        total_rows: i64,
        imported_rows: i64,
        failed_rows: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE import_batch
            SET status = ?2, total_rows = ?3, imported_rows = ?4, failed_rows = ?5,
                finished_at = ?6
            WHERE batch_id = ?1
            "#,
            params![
                batch_id,
                status.to_string(),
                total_rows,
                imported_rows,
                failed_rows,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ImportBatch".to_string(),
                id: batch_id.to_string(),
            });
        }
        Ok(())
    }

    /// 按批次 id 查询
    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<ImportBatchRecord>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            r#"
            SELECT batch_id, source_file, entity_kind, status,
                   total_rows, imported_rows, failed_rows, started_at, finished_at
            FROM import_batch
            WHERE batch_id = ?1
            "#,
            params![batch_id],
            Self::map_batch_row,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询最近的批次记录（按开始时间倒序）
    pub fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<ImportBatchRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, source_file, entity_kind, status,
                   total_rows, imported_rows, failed_rows, started_at, finished_at
            FROM import_batch
            ORDER BY started_at DESC
            LIMIT ?1
            "#,
        )?;

        let records = stmt
            .query_map(params![limit], Self::map_batch_row)?
            .collect::<rusqlite::Result<Vec<ImportBatchRecord>>>()?;

        Ok(records)
    }
}

// ==========================================
// 物料齐套测算系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::db::open_sqlite_connection;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigEntry - 配置项视图
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub config_key: String,
    pub config_value: String,
    pub value_type: Option<String>,
    pub description: Option<String>,
    pub updated_at: String,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 参数
    /// - key: 配置键
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT config_value FROM config_kv WHERE config_key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    ///
    /// # 参数
    /// - key: 配置键
    /// - default: 默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取整数配置，格式错误时告警并回退默认值
    pub fn get_i64_or_default(&self, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value.parse::<i64>().unwrap_or_else(|_| {
            warn!(
                config_key = key,
                raw_value = %value,
                fallback = default,
                "整数配置格式错误，回退默认值"
            );
            default
        }))
    }

    /// 写入配置值（不存在则插入，存在则覆盖）
    ///
    /// # 参数
    /// - key: 配置键
    /// - value: 配置值
    /// - description: 配置说明（可选，仅插入时带入）
    pub fn set_config_value(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO config_kv (config_key, config_value, description, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(config_key) DO UPDATE SET
                 config_value = excluded.config_value,
                 updated_at = excluded.updated_at",
            params![key, value, description, now],
        )?;

        Ok(())
    }

    /// 列出全部配置项（键升序）
    pub fn list_configs(&self) -> Result<Vec<ConfigEntry>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT config_key, config_value, value_type, description, updated_at
             FROM config_kv ORDER BY config_key",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ConfigEntry {
                config_key: row.get(0)?,
                config_value: row.get(1)?,
                value_type: row.get(2)?,
                description: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 返回
    /// - Ok(String): 配置快照的JSON字符串
    ///
    /// # 用途
    /// - 导入批次完成后记录当时生效的配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT config_key, config_value FROM config_kv ORDER BY config_key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 目录查询配置 =====

    /// 获取目录分页缺省大小
    ///
    /// # 默认值
    /// - 200
    pub fn get_default_page_size(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or_default(config_keys::DEFAULT_PAGE_SIZE, 200)
    }

    // ===== 导入配置 =====

    /// 获取单文件导入行数上限
    ///
    /// # 默认值
    /// - 10000
    pub fn get_max_batch_rows(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or_default(config_keys::MAX_BATCH_ROWS, 10_000)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 目录查询
    pub const DEFAULT_PAGE_SIZE: &str = "catalog.default_page_size";

    // 导入
    pub const MAX_BATCH_ROWS: &str = "import.max_batch_rows";
}

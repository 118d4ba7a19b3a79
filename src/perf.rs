// ==========================================
// 性能观测工具
// ==========================================
// 职责: 慢 SQL 日志 + API 入口耗时统计
// ==========================================

use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn truncate_sql(sql: &str, max_len: usize) -> String {
    let s = sql.trim().replace('\n', " ");
    if s.len() <= max_len {
        return s;
    }
    format!("{}…", &s[..max_len])
}

/// 安装 SQLite 慢查询日志
///
/// 开关：
/// - Debug 默认开启；Release 默认关闭（可通过环境变量开启）
/// - `KITTING_MRP_PERF_SQL=1` 强制开启
/// - `KITTING_MRP_SLOW_SQL_MS=50` 配置慢 SQL 阈值（毫秒）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = match std::env::var("KITTING_MRP_PERF_SQL") {
        Ok(v) => is_true(&v),
        Err(_) => cfg!(debug_assertions),
    };

    if !enabled {
        // 显式清理，避免复用连接导致残留 callback
        conn.profile(None);
        return;
    }

    let slow_ms = std::env::var("KITTING_MRP_SLOW_SQL_MS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
    SLOW_SQL_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);

    conn.profile(Some(sql_profile_callback));
}

fn sql_profile_callback(sql: &str, duration: Duration) {
    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold > 0 && ms >= threshold {
        tracing::warn!(
            target: "slow_sql",
            duration_ms = ms,
            sql = %truncate_sql(sql, 420),
            "slow sql"
        );
    }
}

/// 耗时统计 Guard：Drop 时输出 elapsed_ms
///
/// 使用方式：
/// ```ignore
/// let _perf = kitting_mrp::perf::PerfGuard::new("fulfill_products");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            start: Instant::now(),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            "done"
        );
    }
}

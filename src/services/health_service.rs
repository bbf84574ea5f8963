// src/services/health_service.rs
use serde::Serialize;
use sqlx::SqlitePool;
use std::time::{Duration, Instant};

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub ok: bool,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct MemoryUsage {
    pub rss_bytes: Option<u64>,
    pub virtual_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub database: DatabaseHealth,
    pub memory: Option<MemoryUsage>,
}

pub async fn check_database(db_pool: &SqlitePool) -> DatabaseHealth {
    let started = Instant::now();
    let result = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(db_pool).await;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(_) => DatabaseHealth {
            ok: true,
            latency_ms,
            error: None,
        },
        Err(e) => {
            tracing::warn!("Database health check failed: {:?}", e);
            DatabaseHealth {
                ok: false,
                latency_ms,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Reads `VmRSS` and `VmSize` out of a `/proc/<pid>/status` dump.
pub fn parse_proc_status(content: &str) -> MemoryUsage {
    fn kib(line: &str) -> Option<u64> {
        let value = line.split_whitespace().nth(1)?;
        value.parse::<u64>().ok().map(|v| v * 1024)
    }

    let mut usage = MemoryUsage::default();
    for line in content.lines() {
        if line.starts_with("VmRSS:") {
            usage.rss_bytes = kib(line);
        } else if line.starts_with("VmSize:") {
            usage.virtual_bytes = kib(line);
        }
    }
    usage
}

async fn memory_usage() -> Option<MemoryUsage> {
    let content = tokio::fs::read_to_string("/proc/self/status").await.ok()?;
    Some(parse_proc_status(&content))
}

pub async fn system_status(db_pool: &SqlitePool, uptime: Duration) -> SystemStatus {
    let database = check_database(db_pool).await;
    SystemStatus {
        status: if database.ok { "ok" } else { "degraded" },
        uptime_seconds: uptime.as_secs(),
        database,
        memory: memory_usage().await,
    }
}

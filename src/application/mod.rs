//! 应用层 - 一次完整的缓存搜索
//!
//! 收集路径 → 成本守卫 → 并发搜索管道

pub mod pipeline;

pub use pipeline::{PathOutcome, SearchPipeline};

use std::sync::Arc;
use tokio::io::AsyncWrite;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http::HttpTransport;
use crate::models::RunSummary;
use crate::services::{CostGuard, PathSource, RegionProbe};

/// 一次搜索请求
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub needle: String,
    pub source: PathSource,
}

/**
 * 执行一次搜索
 *
 * 路径收集失败、没有路径、成本守卫拒绝都是致命错误，在任何缓存请求之前返回。
 *
 * # 参数
 * * `config` - 已加载的配置
 * * `request` - needle 与路径来源
 * * `transport` - HTTP 传输
 * * `probe` - 区域查询，仅在路径数达到批量阈值时调用
 * * `out` - 匹配结果输出
 */
pub async fn run_search<W>(
    config: &AppConfig,
    request: SearchRequest,
    transport: Arc<dyn HttpTransport>,
    probe: &dyn RegionProbe,
    out: &mut W,
) -> Result<RunSummary>
where
    W: AsyncWrite + Unpin,
{
    let paths = request.source.collect(transport.as_ref()).await?;
    if paths.is_empty() {
        warn!("No paths to check, exiting");
        return Err(AppError::NoPaths);
    }

    let route = CostGuard::new(&config.cache)
        .decide(paths.len(), probe)
        .await?;
    info!(route = %route, paths = paths.len(), needle = %request.needle, "Starting search");

    let pipeline = Arc::new(SearchPipeline::new(
        transport,
        route,
        request.needle,
        config.fetch.parallelism,
    ));
    pipeline.run(paths, out).await
}

//! 并发搜索管道
//!
//! 每个 store path 一个 tokio 任务：narinfo 定位 → NAR 下载解压 → 行搜索。
//! 匹配结果写入无界通道；协调任务等待所有路径任务结束后关闭通道，
//! 主流程按到达顺序消费通道并写出结果。

use futures::future::join_all;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info};

use crate::archive::{NarFetcher, NarInfoLocator};
use crate::error::{AppError, Result};
use crate::infrastructure::http::HttpTransport;
use crate::models::{MatchResult, RoutingDecision, RunSummary, StorePath};
use crate::services::ContentSearcher;

/// 单个路径的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOutcome {
    /// 已搜索
    Searched,
    /// narinfo 返回 403，没有可报告的内容
    Skipped,
    /// 定位或下载失败，已记录日志
    Failed,
}

/**
 * 搜索管道
 *
 * 路由决策在构造时确定，之后所有任务只读共享。
 */
pub struct SearchPipeline {
    locator: NarInfoLocator,
    fetcher: NarFetcher,
    searcher: ContentSearcher,
    route: RoutingDecision,
    limiter: Option<Arc<Semaphore>>,
}

impl SearchPipeline {
    /**
     * 创建搜索管道
     *
     * # 参数
     * * `transport` - 缓存请求使用的 HTTP 传输
     * * `route` - 成本守卫选定的端点
     * * `needle` - 要查找的子串
     * * `parallelism` - 同时处理的路径上限，0 表示不限制
     */
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        route: RoutingDecision,
        needle: impl Into<String>,
        parallelism: usize,
    ) -> Self {
        let limiter = (parallelism > 0).then(|| Arc::new(Semaphore::new(parallelism)));
        Self {
            locator: NarInfoLocator::new(Arc::clone(&transport)),
            fetcher: NarFetcher::new(transport),
            searcher: ContentSearcher::new(needle),
            route,
            limiter,
        }
    }

    /**
     * 运行管道并把匹配结果逐行写入 `out`
     *
     * 单个路径的失败只记录日志，不影响其他路径；只有写出失败会返回错误。
     */
    pub async fn run<W>(self: Arc<Self>, paths: Vec<StorePath>, out: &mut W) -> Result<RunSummary>
    where
        W: AsyncWrite + Unpin,
    {
        let path_count = paths.len();
        let (tx, mut rx) = mpsc::unbounded_channel::<MatchResult>();

        let handles: Vec<_> = paths
            .into_iter()
            .map(|path| {
                let pipeline = Arc::clone(&self);
                let tx = tx.clone();
                tokio::spawn(async move { pipeline.process_path(path, tx).await })
            })
            .collect();

        // 协调任务持有最后一个发送端，所有路径任务结束后关闭通道
        let coordinator = tokio::spawn(async move {
            let outcomes = join_all(handles).await;
            drop(tx);

            let mut summary = RunSummary {
                paths: path_count,
                ..RunSummary::default()
            };
            for outcome in outcomes {
                match outcome {
                    Ok(PathOutcome::Searched) => {}
                    Ok(PathOutcome::Skipped) => summary.skipped += 1,
                    Ok(PathOutcome::Failed) => summary.failures += 1,
                    Err(e) => {
                        error!(error = %e, "Path task panicked");
                        summary.failures += 1;
                    }
                }
            }
            summary
        });

        let mut matches = 0;
        while let Some(result) = rx.recv().await {
            out.write_all(format!("{}\n", result).as_bytes()).await?;
            matches += 1;
        }
        out.flush().await?;

        let mut summary = coordinator
            .await
            .map_err(|e| AppError::Io(std::io::Error::other(e)))?;
        summary.matches = matches;

        info!(
            paths = summary.paths,
            matches = summary.matches,
            skipped = summary.skipped,
            failures = summary.failures,
            "Search finished"
        );
        Ok(summary)
    }

    /// 单个路径：定位 → 下载 → 搜索，三个阶段严格顺序执行
    async fn process_path(
        &self,
        path: StorePath,
        tx: mpsc::UnboundedSender<MatchResult>,
    ) -> PathOutcome {
        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        let nar_url = match self.locator.locate(&path, self.route.base_url()).await {
            Ok(Some(url)) => url,
            Ok(None) => return PathOutcome::Skipped,
            Err(e) => {
                error!(
                    path = %path,
                    step = "narinfo",
                    category = e.category(),
                    error = %e,
                    "Error fetching NAR info for path"
                );
                return PathOutcome::Failed;
            }
        };

        let nar = match self.fetcher.fetch(&nar_url).await {
            Ok(nar) => nar,
            Err(e) => {
                error!(
                    path = %path,
                    step = "nar",
                    url = %nar_url,
                    category = e.category(),
                    error = %e,
                    "Error fetching NAR for path"
                );
                return PathOutcome::Failed;
            }
        };

        let lines = self.searcher.find_matches(&nar);
        debug!(path = %path, bytes = nar.len(), matches = lines.len(), "Searched NAR");

        for line in lines {
            // 接收端已关闭说明输出端失败，剩余结果无处可写
            if tx.send(MatchResult::new(path.clone(), line)).is_err() {
                break;
            }
        }
        PathOutcome::Searched
    }
}

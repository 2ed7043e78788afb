//! grep-nixos-cache
//!
//! 在 Nix 二进制缓存中查找 NAR 文件列表包含指定子串的 store path。
//!
//! - `archive`: narinfo 定位、NAR 下载与按内容编码解压
//! - `services`: 行搜索、成本守卫、区域查询、路径来源
//! - `application`: 并发搜索管道与一次完整运行
//! - `infrastructure`: 配置、日志、HTTP 传输

pub mod application;
pub mod archive;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use application::{run_search, SearchPipeline, SearchRequest};
pub use error::{AppError, Result};
pub use infrastructure::config::{AppConfig, AppConfigLoader};
pub use infrastructure::http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use models::{MatchResult, RoutingDecision, RunSummary, StorePath};
pub use services::{ContentSearcher, CostGuard, Ec2MetadataProbe, PathSource, RegionProbe};

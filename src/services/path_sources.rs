//! store path 输入源
//!
//! 三选一：单个 store path、按行分隔的路径文件、Hydra eval JSON。
//! 都未指定时返回空列表，由调用方决定以非零状态退出。

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{AppError, Result};
use crate::infrastructure::http::{HttpRequest, HttpTransport};
use crate::models::StorePath;

/// 路径来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSource {
    Single(String),
    File(PathBuf),
    HydraEval(String),
    None,
}

/// Hydra eval 响应中用到的部分
#[derive(Debug, Deserialize)]
struct HydraEval {
    builds: Vec<HydraBuild>,
}

#[derive(Debug, Deserialize)]
struct HydraBuild {
    outputs: Vec<String>,
}

impl PathSource {
    /// 按 path → paths → hydra_eval_url 的优先级选择来源
    pub fn from_options(
        path: Option<String>,
        paths: Option<PathBuf>,
        hydra_eval_url: Option<String>,
    ) -> Self {
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            PathSource::Single(path)
        } else if let Some(file) = paths.filter(|f| !f.as_os_str().is_empty()) {
            PathSource::File(file)
        } else if let Some(url) = hydra_eval_url.filter(|u| !u.is_empty()) {
            PathSource::HydraEval(url)
        } else {
            PathSource::None
        }
    }

    /**
     * 收集 store path
     *
     * # 参数
     * * `transport` - 仅在从 Hydra 获取时使用
     */
    pub async fn collect(&self, transport: &dyn HttpTransport) -> Result<Vec<StorePath>> {
        let paths = match self {
            PathSource::Single(path) => vec![StorePath::new(path.as_str())],
            PathSource::File(file) => read_paths_file(file).await?,
            PathSource::HydraEval(url) => fetch_hydra_outputs(transport, url).await?,
            PathSource::None => Vec::new(),
        };
        info!(count = paths.len(), source = ?self, "Collected store paths");
        Ok(paths)
    }
}

/// 读取按行分隔的路径文件，跳过空行
async fn read_paths_file(file: &Path) -> Result<Vec<StorePath>> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| AppError::PathsFile {
            path: file.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(parse_paths(&content))
}

/// 解析按行分隔的路径列表
pub fn parse_paths(content: &str) -> Vec<StorePath> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(StorePath::from)
        .collect()
}

/// 从 Hydra eval JSON 中取出所有 build 的 outputs
async fn fetch_hydra_outputs(transport: &dyn HttpTransport, url: &str) -> Result<Vec<StorePath>> {
    let request = HttpRequest::get(url).header("Accept", "application/json");
    let response = transport
        .send(request)
        .await
        .map_err(|e| AppError::input(url, e))?;
    if !response.is_success() {
        return Err(AppError::input(url, format!("HTTP {}", response.status)));
    }

    let body = response.bytes().await.map_err(|e| AppError::input(url, e))?;
    parse_hydra_eval(&body).map_err(|e| AppError::input(url, e))
}

/// 解析 Hydra eval JSON
pub fn parse_hydra_eval(body: &[u8]) -> std::result::Result<Vec<StorePath>, serde_json::Error> {
    let eval: HydraEval = serde_json::from_slice(body)?;
    Ok(eval
        .builds
        .into_iter()
        .flat_map(|build| build.outputs)
        .map(StorePath::from)
        .collect())
}

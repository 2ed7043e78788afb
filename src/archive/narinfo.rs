//! narinfo 记录定位
//!
//! 通过 `{base}/{hash}.narinfo` 取回元数据记录，从中解析出 NAR 归档的 URL。

use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::infrastructure::http::{HttpRequest, HttpTransport, STATUS_FORBIDDEN};
use crate::models::StorePath;

/// 归档 URL 字段前缀
pub const URL_FIELD_PREFIX: &str = "URL: ";

/// 元数据记录后缀
pub const NARINFO_SUFFIX: &str = ".narinfo";

/// 拼接 narinfo 记录 URL
pub fn narinfo_url(base_url: &str, path: &StorePath) -> String {
    format!(
        "{}/{}{}",
        base_url.trim_end_matches('/'),
        path.hash(),
        NARINFO_SUFFIX
    )
}

/// 从记录正文中取出第一条 `URL: ` 行的剩余部分
pub fn parse_nar_url(record: &str) -> Option<&str> {
    record
        .split('\n')
        .find_map(|line| line.strip_prefix(URL_FIELD_PREFIX))
        .map(|url| url.trim_end_matches('\r'))
}

/// 相对 URL（如 `nar/xyz.nar.xz`）相对于端点基址解析，绝对 URL 原样使用
pub fn resolve_nar_url(base_url: &str, nar_url: &str) -> String {
    if nar_url.contains("://") {
        nar_url.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            nar_url.trim_start_matches('/')
        )
    }
}

/**
 * narinfo 定位器
 *
 * 每个 store path 只请求一次记录，不重试。
 */
pub struct NarInfoLocator {
    transport: Arc<dyn HttpTransport>,
}

impl NarInfoLocator {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /**
     * 定位 NAR 归档 URL
     *
     * # 返回
     * * `Ok(Some(url))` - 找到归档（已按基址解析）
     * * `Ok(None)` - 记录返回 403，该路径没有可报告的内容
     * * `Err(MalformedRecord)` - 记录中没有 `URL: ` 行
     * * `Err(_)` - 其他网络或状态码失败
     */
    pub async fn locate(&self, path: &StorePath, base_url: &str) -> Result<Option<String>> {
        let url = narinfo_url(base_url, path);
        let response = self.transport.send(HttpRequest::get(&url)).await?;

        // 403 是该端点表示"不存在"的方式，不算失败
        if response.status == STATUS_FORBIDDEN {
            debug!(path = %path, url = %url, "narinfo forbidden, nothing to report");
            return Ok(None);
        }
        if !response.is_success() {
            return Err(AppError::HttpStatus {
                url,
                status: response.status,
            });
        }

        let record = response.text().await?;
        let nar_url = parse_nar_url(&record).ok_or_else(|| AppError::MalformedRecord {
            url: url.clone(),
        })?;

        Ok(Some(resolve_nar_url(base_url, nar_url)))
    }
}

//! 运行区域查询
//!
//! 通过 EC2 实例元数据服务（IMDS）查询当前进程所在的 AWS 区域。
//! 优先使用 IMDSv2 令牌，令牌获取失败时退回 IMDSv1。

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::infrastructure::http::{HttpRequest, HttpTransport};

pub const IMDS_BASE_URL: &str = "http://169.254.169.254";
const TOKEN_PATH: &str = "/latest/api/token";
const REGION_PATH: &str = "/latest/meta-data/placement/region";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";

/// 区域查询接口
#[async_trait]
pub trait RegionProbe: Send + Sync {
    async fn region(&self) -> Result<String>;
}

/**
 * EC2 实例元数据区域查询
 *
 * 不在 EC2 上运行时，请求会在超时后失败。
 */
pub struct Ec2MetadataProbe {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    timeout: Duration,
}

impl Ec2MetadataProbe {
    pub fn new(transport: Arc<dyn HttpTransport>, timeout: Duration) -> Self {
        Self {
            transport,
            base_url: IMDS_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_token(&self) -> Option<String> {
        let request = HttpRequest::put(format!("{}{}", self.base_url, TOKEN_PATH))
            .header(TOKEN_TTL_HEADER, "60")
            .timeout(self.timeout);

        match self.transport.send(request).await {
            Ok(response) if response.is_success() => response
                .text()
                .await
                .ok()
                .map(|token| token.trim().to_string()),
            Ok(response) => {
                debug!(status = response.status, "IMDSv2 token request rejected");
                None
            }
            Err(e) => {
                debug!(error = %e, "IMDSv2 token request failed");
                None
            }
        }
    }
}

#[async_trait]
impl RegionProbe for Ec2MetadataProbe {
    async fn region(&self) -> Result<String> {
        let token = self.fetch_token().await;

        let url = format!("{}{}", self.base_url, REGION_PATH);
        let mut request = HttpRequest::get(&url).timeout(self.timeout);
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| AppError::RegionProbe(e.to_string()))?;
        if !response.is_success() {
            return Err(AppError::RegionProbe(format!(
                "metadata service answered HTTP {}",
                response.status
            )));
        }

        let region = response
            .text()
            .await
            .map_err(|e| AppError::RegionProbe(e.to_string()))?
            .trim()
            .to_string();
        if region.is_empty() {
            return Err(AppError::RegionProbe(
                "metadata service returned an empty region".to_string(),
            ));
        }
        Ok(region)
    }
}

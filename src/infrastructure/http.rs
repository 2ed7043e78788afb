//! HTTP 传输层
//!
//! `HttpTransport` 是 narinfo 定位、NAR 下载和区域查询共用的网络接缝。
//! 生产实现基于 reqwest，且不启用自动解压：`Content-Encoding` 由
//! `archive::decoder` 根据响应头自行处理。

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use std::time::Duration;

use crate::error::{AppError, Result};

/// HTTP 403
pub const STATUS_FORBIDDEN: u16 = 403;

/// 响应体字节流
pub type BodyStream = BoxStream<'static, std::io::Result<Bytes>>;

/// 请求方法（区域查询需要 PUT 获取 IMDSv2 令牌）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

/// 一次请求的描述
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// 仅用于区域查询这类旁路请求；缓存请求不设截止时间
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self {
            method: Method::Put,
            ..Self::get(url)
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// 响应：状态码、内容编码和尚未读取的响应体
pub struct HttpResponse {
    pub url: String,
    pub status: u16,
    pub content_encoding: Option<String>,
    pub body: BodyStream,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 读取完整响应体
    pub async fn bytes(self) -> Result<Vec<u8>> {
        let url = self.url;
        let mut body = self.body;
        let mut buffer = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| AppError::network(url.clone(), e))?;
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer)
    }

    /// 读取完整响应体并按 UTF-8 解码（非法字节替换）
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("url", &self.url)
            .field("status", &self.status)
            .field("content_encoding", &self.content_encoding)
            .finish_non_exhaustive()
    }
}

/**
 * HTTP 传输接口
 *
 * 只有传输层失败（连接、DNS、TLS）返回 Err；任何状态码都作为 Ok 返回，
 * 由调用方决定如何解释。
 */
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// 基于 reqwest 的传输实现
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Put => self.client.put(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::network(request.url.clone(), e))?;

        let content_encoding = response
            .headers()
            .get(reqwest::header::CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_ascii_lowercase());

        Ok(HttpResponse {
            url: request.url,
            status: response.status().as_u16(),
            content_encoding,
            body: response
                .bytes_stream()
                .map_err(std::io::Error::other)
                .boxed(),
        })
    }
}

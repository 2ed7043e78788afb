//! 单元测试共用的内存缓存与区域查询替身

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::io;
use std::sync::{Arc, Mutex};

use crate::error::{AppError, Result};
use crate::infrastructure::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::services::region_probe::RegionProbe;

/// 预置的响应
#[derive(Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_encoding: Option<String>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_encoding: None,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_encoding: None,
            body: Vec::new(),
        }
    }

    pub fn encoded(encoding: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_encoding: Some(encoding.to_string()),
            body: body.into(),
        }
    }
}

/// 按 URL 应答的内存传输，记录所有请求
#[derive(Default)]
pub struct MockTransport {
    responses: HashMap<String, MockResponse>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.url.clone());

        let response = self
            .responses
            .get(&request.url)
            .cloned()
            .ok_or_else(|| AppError::network(request.url.clone(), "connection refused"))?;

        Ok(HttpResponse {
            url: request.url,
            status: response.status,
            content_encoding: response.content_encoding,
            body: stream::iter(vec![Ok(Bytes::from(response.body))]).boxed(),
        })
    }
}

/// 固定结果的区域查询，记录调用次数
pub struct StaticRegionProbe {
    region: Result<String>,
    calls: AtomicUsize,
}

impl StaticRegionProbe {
    pub fn new(region: Result<String>) -> Self {
        Self {
            region,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegionProbe for StaticRegionProbe {
    async fn region(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.region {
            Ok(region) => Ok(region.clone()),
            Err(e) => Err(AppError::RegionProbe(e.to_string())),
        }
    }
}

/// 捕获 tracing 输出（无 ANSI 颜色），用于断言事件级别
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let capture = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || capture.clone())
            .finish()
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buffer.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

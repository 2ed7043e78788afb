use std::sync::Arc;
use tracing::debug;

use super::decoder::DecoderRegistry;
use crate::error::{AppError, Result};
use crate::infrastructure::http::{HttpRequest, HttpTransport};

/**
 * NAR 归档下载器
 *
 * 下载归档并根据 `Content-Encoding` 透明解压
 */
pub struct NarFetcher {
    transport: Arc<dyn HttpTransport>,
    decoders: DecoderRegistry,
}

impl NarFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            decoders: DecoderRegistry::new(),
        }
    }

    /**
     * 下载并解压归档
     *
     * # 参数
     * * `url` - 归档 URL
     *
     * # 返回
     * * `Ok(Vec<u8>)` - 解压后的内容
     * * `Err(AppError)` - 网络、状态码或解压失败
     */
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.transport.send(HttpRequest::get(url)).await?;

        if !response.is_success() {
            // 提前返回时 response 被丢弃，底层连接随之关闭
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let decoder = response
            .content_encoding
            .as_deref()
            .and_then(|encoding| self.decoders.find_decoder(encoding));

        match decoder {
            Some(decoder) => {
                debug!(url = %url, encoding = decoder.name(), "decompressing NAR body");
                decoder.decode(url, response.body).await
            }
            None => response.bytes().await,
        }
    }
}

use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;

use crate::error::{AppError, Result};
use crate::infrastructure::http::BodyStream;

/**
 * 响应体解码器trait
 *
 * 根据 `Content-Encoding` 选择解码器，把响应体流式解压到内存
 */
#[async_trait]
pub trait BodyDecoder: Send + Sync {
    /**
     * 检查是否能处理该内容编码
     *
     * # 参数
     * * `encoding` - 已转为小写的 `Content-Encoding` 值
     */
    fn can_handle(&self, encoding: &str) -> bool;

    /**
     * 读取并解码完整响应体
     *
     * 响应体流在本方法内被消费，任何返回路径上都会被释放（连接随之关闭）。
     */
    async fn decode(&self, url: &str, body: BodyStream) -> Result<Vec<u8>>;

    /// 用于日志的编码名称
    fn name(&self) -> &'static str;
}

/**
 * gzip 解码器
 */
pub struct GzipBodyDecoder;

#[async_trait]
impl BodyDecoder for GzipBodyDecoder {
    fn can_handle(&self, encoding: &str) -> bool {
        matches!(encoding, "gzip" | "x-gzip")
    }

    async fn decode(&self, url: &str, body: BodyStream) -> Result<Vec<u8>> {
        // 多个 gzip member 拼接的响应体需要全部读完
        let mut decoder = GzipDecoder::new(StreamReader::new(body));
        decoder.multiple_members(true);
        read_decompressed(url, self.name(), decoder).await
    }

    fn name(&self) -> &'static str {
        "gzip"
    }
}

/**
 * zstd 解码器
 */
pub struct ZstdBodyDecoder;

#[async_trait]
impl BodyDecoder for ZstdBodyDecoder {
    fn can_handle(&self, encoding: &str) -> bool {
        encoding == "zstd"
    }

    async fn decode(&self, url: &str, body: BodyStream) -> Result<Vec<u8>> {
        let mut decoder = ZstdDecoder::new(StreamReader::new(body));
        decoder.multiple_members(true);
        read_decompressed(url, self.name(), decoder).await
    }

    fn name(&self) -> &'static str {
        "zstd"
    }
}

/// 逐块读取解压流
///
/// 底层流的读取错误与解压错误在这里都表现为 io::Error，统一归类为解压失败。
async fn read_decompressed<R>(url: &str, encoding: &str, mut reader: R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut decompressed = Vec::new();
    reader
        .read_to_end(&mut decompressed)
        .await
        .map_err(|e| AppError::Decompression {
            url: url.to_string(),
            encoding: encoding.to_string(),
            message: e.to_string(),
        })?;
    Ok(decompressed)
}

/**
 * 解码器管理器
 *
 * 未识别或缺失的内容编码按原样读取
 */
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn BodyDecoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        let decoders: Vec<Box<dyn BodyDecoder>> =
            vec![Box::new(GzipBodyDecoder), Box::new(ZstdBodyDecoder)];
        Self { decoders }
    }

    pub fn find_decoder(&self, encoding: &str) -> Option<&dyn BodyDecoder> {
        self.decoders
            .iter()
            .find(|decoder| decoder.can_handle(encoding))
            .map(|decoder| decoder.as_ref())
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use futures::stream::{self, StreamExt};
    use std::io::Write;
    use tokio::io::AsyncWriteExt;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    async fn zstd(data: &[u8]) -> Vec<u8> {
        let mut encoder = async_compression::tokio::write::ZstdEncoder::new(Vec::new());
        encoder.write_all(data).await.unwrap();
        encoder.shutdown().await.unwrap();
        encoder.into_inner()
    }

    fn body_of(chunks: Vec<Vec<u8>>) -> BodyStream {
        stream::iter(chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk)))).boxed()
    }

    #[test]
    fn test_find_decoder() {
        let registry = DecoderRegistry::new();

        assert_eq!(registry.find_decoder("gzip").unwrap().name(), "gzip");
        assert_eq!(registry.find_decoder("x-gzip").unwrap().name(), "gzip");
        assert_eq!(registry.find_decoder("zstd").unwrap().name(), "zstd");
        assert!(registry.find_decoder("identity").is_none());
        assert!(registry.find_decoder("br").is_none());
    }

    #[tokio::test]
    async fn test_gzip_decode_across_chunk_boundaries() {
        let original = b"bin/bash\nlib/foo\nshare/man/man1/foo.1.gz\n";
        let compressed = gzip(original);
        let (head, tail) = compressed.split_at(compressed.len() / 2);

        let decoded = GzipBodyDecoder
            .decode("http://x/a.nar", body_of(vec![head.to_vec(), tail.to_vec()]))
            .await
            .unwrap();

        assert_eq!(decoded, original);
    }

    #[tokio::test]
    async fn test_gzip_decode_garbage_is_decompression_error() {
        let result = GzipBodyDecoder
            .decode("http://x/a.nar", body_of(vec![b"definitely not gzip".to_vec()]))
            .await;

        match result {
            Err(AppError::Decompression { encoding, url, .. }) => {
                assert_eq!(encoding, "gzip");
                assert_eq!(url, "http://x/a.nar");
            }
            other => panic!("Expected decompression error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_truncated_gzip_is_decompression_error() {
        let compressed = gzip(b"lib/libfoo.so.1\nlib/libfoo.so.1.2.3\n");
        let truncated = compressed[..compressed.len() / 2].to_vec();

        let result = GzipBodyDecoder
            .decode("http://x/a.nar", body_of(vec![truncated]))
            .await;

        assert!(matches!(result, Err(AppError::Decompression { .. })));
    }

    #[tokio::test]
    async fn test_gzip_decode_reads_every_member() {
        let mut body = gzip(b"bin/bash\n");
        body.extend(gzip(b"lib/foo\n"));

        let decoded = GzipBodyDecoder
            .decode("http://x/a.nar", body_of(vec![body]))
            .await
            .unwrap();

        assert_eq!(decoded, b"bin/bash\nlib/foo\n");
    }

    #[tokio::test]
    async fn test_zstd_decode_across_chunk_boundaries() {
        let original = b"bin/zstd\nlib/libzstd.so.1\nshare/doc/zstd/README.md\n";
        let compressed = zstd(original).await;
        let (head, tail) = compressed.split_at(compressed.len() / 2);

        let decoded = ZstdBodyDecoder
            .decode("http://x/z.nar", body_of(vec![head.to_vec(), tail.to_vec()]))
            .await
            .unwrap();

        assert_eq!(decoded, original);
    }

    #[tokio::test]
    async fn test_zstd_decode_reads_every_frame() {
        let mut body = zstd(b"bin/bash\n").await;
        body.extend(zstd(b"lib/foo\n").await);

        let decoded = ZstdBodyDecoder
            .decode("http://x/z.nar", body_of(vec![body]))
            .await
            .unwrap();

        assert_eq!(decoded, b"bin/bash\nlib/foo\n");
    }

    #[tokio::test]
    async fn test_zstd_decode_garbage_is_decompression_error() {
        let result = ZstdBodyDecoder
            .decode("http://x/z.nar", body_of(vec![b"definitely not zstd".to_vec()]))
            .await;

        match result {
            Err(AppError::Decompression { encoding, .. }) => assert_eq!(encoding, "zstd"),
            other => panic!("Expected decompression error, got {:?}", other),
        }
    }
}

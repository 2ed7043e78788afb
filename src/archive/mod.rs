/**
 * NAR 归档处理模块
 *
 * 定位（narinfo）、下载和按内容编码解压 NAR 归档
 */
pub mod decoder;
pub mod fetcher;
pub mod narinfo;

pub use decoder::{BodyDecoder, DecoderRegistry, GzipBodyDecoder, ZstdBodyDecoder};
pub use fetcher::NarFetcher;
pub use narinfo::NarInfoLocator;

//! Store path 数据结构
//!
//! store path 形如 `<hash>-<name>`，可选带 `/nix/store/` 前缀。
//! 下游只使用 hash 段（第一个分隔符之前的文本）来定位 narinfo 记录。

use serde::{Deserialize, Serialize};
use std::fmt;

/// store 目录前缀，派生 hash 时剥离
pub const STORE_DIR_PREFIX: &str = "/nix/store/";

/// hash 段与名称之间的分隔符
pub const HASH_SEPARATOR: char = '-';

/// 不可变的 store path 标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorePath(String);

impl StorePath {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 第一个分隔符之前的 hash 段
    ///
    /// 没有分隔符时整个（去掉前缀的）字符串即为 hash。
    pub fn hash(&self) -> &str {
        let base = self.0.strip_prefix(STORE_DIR_PREFIX).unwrap_or(&self.0);
        base.split(HASH_SEPARATOR).next().unwrap_or(base)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StorePath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for StorePath {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

use crate::models::StorePath;
use serde::Serialize;
use std::fmt;

/**
 * 单条匹配结果
 *
 * 跨路径不保证顺序；同一路径内保持列表中的行顺序。
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub path: StorePath,
    pub line: String,
}

impl MatchResult {
    pub fn new(path: StorePath, line: impl Into<String>) -> Self {
        Self {
            path,
            line: line.into(),
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Found in {}: {}", self.path, self.line)
    }
}

/**
 * 单次运行的汇总统计
 */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// 处理的 store path 数
    pub paths: usize,
    /// 输出的匹配行数
    pub matches: usize,
    /// narinfo 返回 403 而跳过的路径数
    pub skipped: usize,
    /// 失败的路径数
    pub failures: usize,
}

use aho_corasick::AhoCorasick;

/**
 * 内容搜索器 - 在解压后的 NAR 列表中查找包含 needle 的行
 *
 * 执行大小写敏感的子串匹配，按 `\n` 切分，保持原始行顺序。
 * 空 needle 匹配所有行。
 */
pub struct ContentSearcher {
    needle: String,
    ac: Option<AhoCorasick>,
}

impl ContentSearcher {
    /**
     * 创建新的内容搜索器
     *
     * # 参数
     * * `needle` - 要查找的子串
     */
    pub fn new(needle: impl Into<String>) -> Self {
        let needle = needle.into();
        let ac = if needle.is_empty() {
            None
        } else {
            match AhoCorasick::new([needle.as_str()]) {
                Ok(ac) => Some(ac),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to build Aho-Corasick automaton, using str::contains");
                    None
                }
            }
        };

        Self { needle, ac }
    }

    /**
     * 检查单行是否包含 needle
     */
    pub fn is_match(&self, line: &str) -> bool {
        match &self.ac {
            Some(ac) => ac.is_match(line),
            None => line.contains(self.needle.as_str()),
        }
    }

    /**
     * 在内容中查找所有匹配行
     *
     * # 参数
     * * `content` - 解压后的归档内容，非法 UTF-8 按替换字符处理
     *
     * # 返回
     * * 按原始顺序排列的匹配行
     */
    pub fn find_matches(&self, content: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(content)
            .split('\n')
            .filter(|line| self.is_match(line))
            .map(str::to_string)
            .collect()
    }
}

//! 日志初始化
//!
//! 诊断信息全部写入 stderr，stdout 只输出匹配结果。

use tracing_subscriber::EnvFilter;

/// 初始化全局 tracing subscriber
///
/// `RUST_LOG` 存在时优先，否则使用配置中的 `logging.level`。
/// 重复初始化（例如测试中）会被静默忽略。
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

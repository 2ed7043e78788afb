//! 配置管理基础设施层
//!
//! 使用 `config` crate 实现多层配置：
//! - 内置默认值
//! - 配置文件（TOML/JSON，由 `--config` 指定）
//! - 环境变量，前缀 `GREP_NIXOS_CACHE_`，`__` 表示嵌套
//!
//! 命令行参数在此之后由 `main.rs` 覆盖。

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::Result;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "GREP_NIXOS_CACHE";

pub const DEFAULT_CDN_BASE_URL: &str = "https://cache.nixos.org";
pub const DEFAULT_DIRECT_BASE_URL: &str = "https://nix-cache.s3.amazonaws.com";
pub const DEFAULT_CACHE_REGION: &str = "us-east-1";
pub const DEFAULT_BULK_THRESHOLD: usize = 50;
pub const DEFAULT_USER_AGENT: &str =
    "grep-nixos-cache 1.0 (https://github.com/notashelf/grep-nixos-cache)";

/// 全局配置根结构
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheConfig,

    #[serde(default)]
    #[validate(nested)]
    pub fetch: FetchConfig,

    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
}

/// 缓存端点与成本守卫配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CacheConfig {
    /// CDN 端点
    #[validate(length(min = 1, max = 500))]
    pub cdn_base_url: String,

    /// 直连存储端点（仅限指定区域）
    #[validate(length(min = 1, max = 500))]
    pub direct_base_url: String,

    /// 直连存储所在的低成本区域
    #[validate(length(min = 1, max = 100))]
    pub region: String,

    /// 达到该路径数即视为批量访问，需要区域检查
    #[validate(range(min = 1))]
    pub bulk_threshold: usize,
}

/// 网络请求配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FetchConfig {
    #[validate(length(min = 1, max = 200))]
    pub user_agent: String,

    /// 同时处理的 store path 上限，0 表示不限制
    pub parallelism: usize,

    /// 区域查询超时（毫秒）
    #[validate(range(min = 1, max = 60000))]
    pub region_probe_timeout_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// EnvFilter 指令，`RUST_LOG` 优先
    #[validate(length(min = 1, max = 200))]
    pub level: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cdn_base_url: DEFAULT_CDN_BASE_URL.to_string(),
            direct_base_url: DEFAULT_DIRECT_BASE_URL.to_string(),
            region: DEFAULT_CACHE_REGION.to_string(),
            bulk_threshold: DEFAULT_BULK_THRESHOLD,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            parallelism: 0,
            region_probe_timeout_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// 配置加载器
pub struct AppConfigLoader;

impl AppConfigLoader {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序加载并校验配置
    pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: AppConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

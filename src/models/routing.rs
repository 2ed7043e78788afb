//! 路由决策
//!
//! 每次运行由成本守卫选定一次，之后所有并发任务只读共享。

use serde::Serialize;
use std::fmt;

/// 选定的缓存端点
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "endpoint", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// CDN 端点，无区域要求
    Cdn { base_url: String },
    /// 直连存储端点，只允许在指定区域内使用
    DirectStorage { base_url: String },
}

impl RoutingDecision {
    pub fn base_url(&self) -> &str {
        match self {
            RoutingDecision::Cdn { base_url } | RoutingDecision::DirectStorage { base_url } => {
                base_url
            }
        }
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingDecision::Cdn { base_url } => write!(f, "cdn ({})", base_url),
            RoutingDecision::DirectStorage { base_url } => {
                write!(f, "direct storage ({})", base_url)
            }
        }
    }
}

//! 基础设施层 - 技术实现
//!
//! 提供配置加载、日志初始化和 HTTP 传输

pub mod config;
pub mod http;
pub mod logging;

pub mod routing;
pub mod search;
pub mod store_path;

// 重新导出核心类型
pub use routing::RoutingDecision;
pub use search::{MatchResult, RunSummary};
pub use store_path::StorePath;

pub mod content_searcher;
pub mod cost_guard;
pub mod path_sources;
pub mod region_probe;

pub use content_searcher::ContentSearcher;
pub use cost_guard::CostGuard;
pub use path_sources::PathSource;
pub use region_probe::{Ec2MetadataProbe, RegionProbe};

//! 成本守卫
//!
//! 批量访问缓存时，直连存储端点只允许在与存储同区域的机器上使用，
//! 否则跨区域流量费用将由缓存提供方承担。该检查在整个运行开始前执行一次。

use tracing::{info, warn};

use super::region_probe::RegionProbe;
use crate::error::{AppError, Result};
use crate::infrastructure::config::CacheConfig;
use crate::models::RoutingDecision;

/// 成本守卫策略
#[derive(Debug, Clone)]
pub struct CostGuard {
    cdn_base_url: String,
    direct_base_url: String,
    required_region: String,
    bulk_threshold: usize,
}

impl CostGuard {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            cdn_base_url: config.cdn_base_url.clone(),
            direct_base_url: config.direct_base_url.clone(),
            required_region: config.region.clone(),
            bulk_threshold: config.bulk_threshold,
        }
    }

    /**
     * 选择本次运行的端点
     *
     * # 参数
     * * `path_count` - 待处理的 store path 数
     * * `probe` - 区域查询，仅在达到批量阈值时调用
     *
     * # 返回
     * * `Ok(Cdn)` - 路径数低于阈值
     * * `Ok(DirectStorage)` - 达到阈值且运行在指定区域
     * * `Err(CostGuard)` - 达到阈值但区域查询失败或区域不符，整个运行必须中止
     */
    pub async fn decide(&self, path_count: usize, probe: &dyn RegionProbe) -> Result<RoutingDecision> {
        if path_count < self.bulk_threshold {
            return Ok(RoutingDecision::Cdn {
                base_url: self.cdn_base_url.clone(),
            });
        }

        info!(
            paths = path_count,
            threshold = self.bulk_threshold,
            "At least {} paths to check, ensuring that we run co-located with the Nix cache...",
            self.bulk_threshold
        );

        let reason = match probe.region().await {
            Ok(region) if region == self.required_region => {
                info!(region = %region, "Running in the cache region, using direct storage endpoint");
                return Ok(RoutingDecision::DirectStorage {
                    base_url: self.direct_base_url.clone(),
                });
            }
            Ok(region) => format!("running in region {}", region),
            Err(e) => format!("could not determine the running region ({})", e),
        };

        warn!(required_region = %self.required_region, reason = %reason, "Cost guard rejected the run");
        Err(AppError::CostGuard {
            required_region: self.required_region.clone(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StaticRegionProbe;
    use rstest::rstest;

    fn guard() -> CostGuard {
        CostGuard::new(&CacheConfig::default())
    }

    #[tokio::test]
    async fn test_below_threshold_never_probes() {
        let probe = StaticRegionProbe::new(Ok("us-east-1".to_string()));

        let decision = guard().decide(49, &probe).await.unwrap();

        assert_eq!(
            decision,
            RoutingDecision::Cdn {
                base_url: "https://cache.nixos.org".to_string()
            }
        );
        assert_eq!(probe.calls(), 0);
    }

    #[rstest]
    #[case(49, Ok("us-east-1"), Some(false))]
    #[case(49, Ok("eu-west-1"), Some(false))]
    #[case(49, Err(()), Some(false))]
    #[case(50, Ok("us-east-1"), Some(true))]
    #[case(50, Ok("eu-west-1"), None)]
    #[case(50, Err(()), None)]
    #[case(60, Err(()), None)]
    #[tokio::test]
    async fn test_threshold_boundary(
        #[case] count: usize,
        #[case] region: std::result::Result<&str, ()>,
        #[case] expect_direct: Option<bool>,
    ) {
        let probe = StaticRegionProbe::new(
            region
                .map(str::to_string)
                .map_err(|_| AppError::RegionProbe("no metadata service".to_string())),
        );

        let result = guard().decide(count, &probe).await;

        match expect_direct {
            Some(direct) => assert_eq!(
                matches!(result.unwrap(), RoutingDecision::DirectStorage { .. }),
                direct
            ),
            None => assert!(matches!(result, Err(AppError::CostGuard { .. }))),
        }
    }

    #[tokio::test]
    async fn test_direct_storage_base_url() {
        let probe = StaticRegionProbe::new(Ok("us-east-1".to_string()));

        let decision = guard().decide(500, &probe).await.unwrap();

        assert_eq!(decision.base_url(), "https://nix-cache.s3.amazonaws.com");
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let config = CacheConfig {
            bulk_threshold: 2,
            ..CacheConfig::default()
        };
        let probe = StaticRegionProbe::new(Ok("ap-south-1".to_string()));

        let result = CostGuard::new(&config).decide(2, &probe).await;

        match result {
            Err(AppError::CostGuard { reason, required_region }) => {
                assert!(reason.contains("ap-south-1"));
                assert_eq!(required_region, "us-east-1");
            }
            other => panic!("Expected cost guard rejection, got {:?}", other),
        }
    }
}

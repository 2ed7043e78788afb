//! grep-nixos-cache - 主入口
//!
//! 负责：
//! - 解析命令行参数并加载配置
//! - 初始化日志系统
//! - 执行一次缓存搜索，匹配结果写入 stdout

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use tracing::info;

use grep_nixos_cache::infrastructure::logging::init_logging;
use grep_nixos_cache::{
    run_search, AppConfigLoader, Ec2MetadataProbe, HttpTransport, PathSource, ReqwestTransport,
    SearchRequest,
};

#[derive(Parser)]
#[command(
    name = "grep-nixos-cache",
    version,
    about = "Search NAR listings in the NixOS binary cache for a string"
)]
#[command(group(
    ArgGroup::new("source")
        .args(["path", "paths", "hydra_eval_url"])
        .multiple(false)
))]
struct Cli {
    /// String to look for in the target Nix store paths
    #[arg(long, default_value = "")]
    needle: String,

    /// Single Nix store path that need to be checked (mostly for testing purposes)
    #[arg(long)]
    path: Option<String>,

    /// Filename containing a newline-separated list of Nix store paths that need to be checked
    #[arg(long)]
    paths: Option<PathBuf>,

    /// Hydra eval URL to get all output Nix store paths from
    #[arg(long, alias = "hydra_eval_url")]
    hydra_eval_url: Option<String>,

    /// Maximum number of store paths processed at once (0 = unbounded)
    #[arg(long)]
    parallelism: Option<usize>,

    /// Configuration file (TOML or JSON)
    #[arg(long, env = "GREP_NIXOS_CACHE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfigLoader::load(cli.config.as_deref())?;
    if let Some(parallelism) = cli.parallelism {
        config.fetch.parallelism = parallelism;
    }

    init_logging(&config.logging.level);
    info!("grep-nixos-cache v{} starting", env!("CARGO_PKG_VERSION"));

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config.fetch.user_agent)?);
    let probe = Ec2MetadataProbe::new(
        Arc::clone(&transport),
        Duration::from_millis(config.fetch.region_probe_timeout_ms),
    );

    let request = SearchRequest {
        needle: cli.needle,
        source: PathSource::from_options(cli.path, cli.paths, cli.hydra_eval_url),
    };

    let mut stdout = tokio::io::stdout();
    run_search(&config, request, transport, &probe, &mut stdout).await?;
    Ok(())
}

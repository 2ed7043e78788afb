use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/**
 * 应用错误类型 - 使用 miette 提供用户友好的错误诊断
 *
 * 致命错误（输入、配置、成本守卫）会终止整个运行；
 * 网络、记录解析和解压错误只影响单个 store path。
 */
#[derive(Error, Debug, Diagnostic)]
pub enum AppError {
    #[error("IO error: {0}")]
    #[diagnostic(code(app::io_error))]
    Io(#[from] std::io::Error),

    #[error("No paths to check")]
    #[diagnostic(
        code(app::no_paths),
        help("Pass one of --path, --paths or --hydra-eval-url")
    )]
    NoPaths,

    #[error("Failed to collect store paths from {source_name}: {message}")]
    #[diagnostic(code(app::input_error))]
    Input {
        source_name: String,
        message: String,
    },

    #[error("Failed to read paths file {}: {message}", path.display())]
    #[diagnostic(code(app::paths_file_error))]
    PathsFile { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(app::config_error))]
    Config(String),

    #[error("Refusing to query the direct storage endpoint: {reason}")]
    #[diagnostic(
        code(app::cost_guard),
        help("To avoid unnecessary costs to the NixOS project, please run this program in the AWS {required_region} region")
    )]
    CostGuard {
        required_region: String,
        reason: String,
    },

    #[error("Region lookup failed: {0}")]
    #[diagnostic(code(app::region_probe))]
    RegionProbe(String),

    #[error("Network error fetching {url}: {message}")]
    #[diagnostic(code(app::network_error))]
    Network { url: String, message: String },

    #[error("Unexpected HTTP status {status} from {url}")]
    #[diagnostic(code(app::http_status))]
    HttpStatus { url: String, status: u16 },

    #[error("Did not find a NAR URL key in {url}")]
    #[diagnostic(
        code(app::malformed_record),
        help("The narinfo record was fetched but has no `URL: ` line")
    )]
    MalformedRecord { url: String },

    #[error("Failed to decompress {encoding} body from {url}: {message}")]
    #[diagnostic(code(app::decompression_error))]
    Decompression {
        url: String,
        encoding: String,
        message: String,
    },
}

impl AppError {
    /**
     * 创建网络错误
     */
    pub fn network(url: impl Into<String>, message: impl ToString) -> Self {
        AppError::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /**
     * 创建输入源错误
     */
    pub fn input(source_name: impl Into<String>, message: impl ToString) -> Self {
        AppError::Input {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /**
     * 错误类别，用作日志字段
     *
     * 记录格式错误与网络错误必须可区分，即使两者都只是单路径失败。
     */
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Io(_) => "io",
            AppError::NoPaths | AppError::Input { .. } | AppError::PathsFile { .. } => "input",
            AppError::Config(_) => "config",
            AppError::CostGuard { .. } => "cost_guard",
            AppError::RegionProbe(_) => "region_probe",
            AppError::Network { .. } | AppError::HttpStatus { .. } => "network",
            AppError::MalformedRecord { .. } => "malformed_record",
            AppError::Decompression { .. } => "decompression",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Config(errors.to_string())
    }
}

/**
 * 统一结果类型
 */
pub type Result<T> = std::result::Result<T, AppError>;

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// 服务端表示"仍在处理中"的状态值
pub const DEFAULT_PENDING_STATUS: &str = "The requested invoice is currently ongoing";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 识别服务基础地址
    pub base_url: String,
    /// 认证用户名
    pub username: String,
    /// 认证密码
    pub password: String,
    /// 每批处理的文档数量
    pub batch_size: usize,
    /// 待提交文档所在目录
    pub invoices_path: PathBuf,
    /// CSV 输出目录
    pub output_dir: PathBuf,
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 最大轮询次数
    pub max_poll_attempts: usize,
    /// 表示任务仍在处理中的状态值
    pub pending_status: String,
    /// 单个 HTTP 请求超时
    pub request_timeout: Duration,
    /// 批次内同时进行的请求数量
    pub max_concurrent_requests: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Config {
    /// 使用必填项创建配置，其余字段取默认值
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        batch_size: usize,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            batch_size,
            invoices_path: PathBuf::from("invoices"),
            output_dir: PathBuf::from("."),
            poll_interval: Duration::from_secs(20),
            max_poll_attempts: 10,
            pending_status: DEFAULT_PENDING_STATUS.to_string(),
            request_timeout: Duration::from_secs(60),
            max_concurrent_requests: 4,
            verbose_logging: false,
        }
    }

    /// 从环境变量加载配置（先加载 .env 文件）
    pub fn from_env() -> Result<Self, ConfigError> {
        // .env 不存在时直接使用进程环境变量
        let _ = dotenvy::dotenv_override();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// 通过任意查找函数加载配置
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = required(&lookup, "BASE_URL")?;
        let username = required(&lookup, "USERNAME")?;
        let password = required(&lookup, "PASSWORD")?;
        let batch_size = positive(&lookup, "BATCH_SIZE", None)?;

        let mut config = Self::new(base_url, username, password, batch_size);

        if let Some(path) = lookup("INVOICES_PATH") {
            config.invoices_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        config.poll_interval = Duration::from_secs(parsed(
            &lookup,
            "POLL_INTERVAL_SECS",
            config.poll_interval.as_secs(),
        )?);
        config.max_poll_attempts =
            positive(&lookup, "MAX_POLL_ATTEMPTS", Some(config.max_poll_attempts))?;
        if let Some(status) = lookup("PENDING_STATUS") {
            config.pending_status = status;
        }
        config.request_timeout = Duration::from_secs(positive(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            Some(config.request_timeout.as_secs() as usize),
        )? as u64);
        config.max_concurrent_requests = positive(
            &lookup,
            "MAX_CONCURRENT_REQUESTS",
            Some(config.max_concurrent_requests),
        )?;
        config.verbose_logging = parsed(&lookup, "VERBOSE_LOGGING", config.verbose_logging)?;

        Ok(config)
    }
}

fn required<F>(lookup: &F, var_name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::EnvVarNotFound {
            var_name: var_name.to_string(),
        })
}

fn parsed<F, T>(lookup: &F, var_name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
        None => Ok(default),
    }
}

/// 正整数配置项；`default` 为 None 时视为必填
fn positive<F>(lookup: &F, var_name: &str, default: Option<usize>) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match (lookup(var_name), default) {
        (Some(raw), _) => raw,
        (None, Some(default)) => return Ok(default),
        (None, None) => {
            return Err(ConfigError::EnvVarNotFound {
                var_name: var_name.to_string(),
            })
        }
    };

    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: "正整数".to_string(),
        }),
    }
}

use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 认证错误（致命）
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// 上传错误（单个文档）
    #[error("上传错误: {0}")]
    Upload(#[from] UploadError),
    /// 结果查询错误（单个文档）
    #[error("结果查询错误: {0}")]
    Fetch(#[from] FetchError),
    /// 导出错误（致命）
    #[error("导出错误: {0}")]
    Export(#[from] ExportError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// HTTP 客户端初始化失败
    #[error("HTTP 客户端初始化失败: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl AppError {
    /// 是否应该终止整个运行
    ///
    /// 单个文档的上传/查询错误只会记录到导出行中，其余错误都会中断运行。
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AppError::Upload(_) | AppError::Fetch(_))
    }
}

/// 认证相关错误
#[derive(Debug, Error)]
pub enum AuthError {
    /// 认证端点无法访问
    #[error("无法访问认证端点 {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 认证端点返回错误状态
    #[error("认证端点 {endpoint} 拒绝请求 (HTTP {status}): {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 认证响应无法解析
    #[error("认证端点 {endpoint} 返回了无法解析的响应: {source}")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    /// 认证响应中的有效期无法表示为过期时间
    #[error("认证端点 {endpoint} 返回了无效的有效期: {lifetime} 秒")]
    InvalidLifetime { endpoint: String, lifetime: i64 },
    /// 等待期间同一轮换取已经失败
    #[error("认证换取已失败: {reason}")]
    RenewalFailed { reason: String },
}

/// 文档上传错误
#[derive(Debug, Error)]
pub enum UploadError {
    /// 读取本地文件失败
    #[error("读取文件失败 ({}): {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 网络请求失败
    #[error("上传请求失败: {0}")]
    RequestFailed(#[source] reqwest::Error),
    /// 服务返回非成功状态
    #[error("上传被拒绝 (HTTP {status}): {body}")]
    BadStatus { status: u16, body: String },
    /// 响应中缺少任务 ID
    #[error("响应中缺少 id_fatura 字段: {body}")]
    MissingJobId { body: String },
}

/// 结果查询错误
#[derive(Debug, Error)]
pub enum FetchError {
    /// 网络请求失败
    #[error("查询请求失败: {0}")]
    RequestFailed(#[source] reqwest::Error),
    /// 响应不是合法 JSON
    #[error("查询响应无法解析: {source}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
    },
}

/// 表格导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    /// 文件系统操作失败
    #[error("写入文件失败 ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// CSV 写入失败
    #[error("CSV 写入失败 ({}): {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 输入目录不存在
    #[error("目录不存在: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },
    /// 读取输入目录失败
    #[error("读取目录失败 ({}): {source}", .path.display())]
    DirectoryReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_document_errors_are_not_fatal() {
        let upload = AppError::from(UploadError::MissingJobId {
            body: "{}".to_string(),
        });
        assert!(!upload.is_fatal());

        let fetch = AppError::from(FetchError::MalformedResponse {
            source: serde_json::from_str::<serde_json::Value>("not json").unwrap_err(),
        });
        assert!(!fetch.is_fatal());
    }

    #[test]
    fn test_auth_and_export_errors_are_fatal() {
        let auth = AppError::from(AuthError::Rejected {
            endpoint: "/token".to_string(),
            status: 401,
            body: "denied".to_string(),
        });
        assert!(auth.is_fatal());

        let export = AppError::from(ExportError::Io {
            path: PathBuf::from("/nowhere/responses_0.csv"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });
        assert!(export.is_fatal());
    }
}

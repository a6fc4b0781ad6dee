//! 识别服务 API 客户端
//!
//! 封装文档上传和结果查询两个接口，每次调用前向 TokenManager 取 access token

use crate::config::Config;
use crate::error::{AppResult, FetchError, UploadError};
use crate::infrastructure::TokenManager;
use crate::models::{Document, PollOutcome};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 识别服务客户端
pub struct ExtractionClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenManager>,
    pending_status: String,
}

impl ExtractionClient {
    /// 创建新的识别服务客户端
    pub fn new(http: Client, config: &Config, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            tokens,
            pending_status: config.pending_status.clone(),
        }
    }

    /// 上传文档
    ///
    /// # 返回
    /// 返回服务分配的任务 ID（`id_fatura`）
    pub async fn upload(&self, document: &Document) -> AppResult<String> {
        let bytes = tokio::fs::read(document.path())
            .await
            .map_err(|source| UploadError::ReadFailed {
                path: document.path().to_path_buf(),
                source,
            })?;

        let token = self.tokens.current_access_token().await?;

        let part = Part::bytes(bytes)
            .file_name(document.display_name().to_string())
            .mime_str(&document.content_type())
            .map_err(UploadError::RequestFailed)?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/v5/upload_fatura", self.base_url))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::RequestFailed)?;

        let status = response.status();
        let body = response.text().await.map_err(UploadError::RequestFailed)?;
        debug!("上传响应 {}: {}", status, body);

        if !status.is_success() {
            return Err(UploadError::BadStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let job_id = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|json| extract_job_id(&json));

        job_id.ok_or_else(|| UploadError::MissingJobId { body }.into())
    }

    /// 查询任务结果（单次）
    pub async fn fetch_result(&self, job_id: &str) -> AppResult<PollOutcome> {
        let token = self.tokens.current_access_token().await?;

        let response = self
            .http
            .get(format!("{}/v5/find-fatura/{}", self.base_url, job_id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(FetchError::RequestFailed)?;

        // 服务在失败时也会返回带 detail 的 JSON，这里只看响应体
        let body = response.text().await.map_err(FetchError::RequestFailed)?;
        let json: Value =
            serde_json::from_str(&body).map_err(|source| FetchError::MalformedResponse { source })?;

        Ok(classify_result_response(json, &self.pending_status))
    }
}

/// 对查询响应分类
///
/// - 含 `Data.Result` → Success（`Historic` 字段序列化为 JSON 字符串）
/// - 含 `detail` → Failure(detail)
/// - `status` 等于处理中状态值 → Pending
/// - 其他 → Failure(status)
pub fn classify_result_response(mut body: Value, pending_status: &str) -> PollOutcome {
    if let Some(mut result) = body.pointer_mut("/Data/Result").map(Value::take) {
        if let Some(historic) = result.get_mut("Historic") {
            *historic = Value::String(historic.to_string());
        }
        return PollOutcome::Success(result);
    }

    if let Some(detail) = body.get("detail") {
        return PollOutcome::Failure(value_to_message(detail));
    }

    match body.get("status") {
        Some(Value::String(status)) if status == pending_status => PollOutcome::Pending,
        Some(status) => PollOutcome::Failure(value_to_message(status)),
        None => PollOutcome::Failure(body.to_string()),
    }
}

fn extract_job_id(json: &Value) -> Option<String> {
    match json.get("id_fatura")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn value_to_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! 令牌管理器 - 基础设施层
//!
//! 持有唯一的凭证（access / refresh token），只暴露"获取可用 access token"的能力。
//!
//! ## 续期规则
//! - 首次使用时通过用户名密码换取凭证
//! - access token 过期后，如果 refresh token 仍有效则用它续期，否则重新用密码换取
//! - 过期时间 = 当前时间 + 服务端返回的有效期 - 1 秒
//!
//! 检查与续期在同一把锁内完成，并发调用最多触发一次换取。
//! 换取失败时，已在锁上等待的调用直接返回失败，不再重复请求认证端点。

use crate::config::Config;
use crate::error::AuthError;
use crate::infrastructure::Clock;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// 认证凭证，每次换取后整体替换
#[derive(Debug, Clone)]
pub struct Credential {
    access_token: String,
    refresh_token: String,
    access_expiry: DateTime<Utc>,
    refresh_expiry: DateTime<Utc>,
}

impl Credential {
    /// 由认证响应构造凭证；有效期无法表示时返回该有效期
    fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Result<Self, i64> {
        Ok(Self {
            access_expiry: expiry_after(now, response.expires_in)?,
            refresh_expiry: expiry_after(now, response.refresh_expires_in)?,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        })
    }

    /// access token 是否仍可使用
    pub fn is_access_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.access_expiry
    }

    /// refresh token 是否仍可用于续期
    pub fn can_refresh(&self, now: DateTime<Utc>) -> bool {
        now < self.refresh_expiry
    }

    pub fn access_expiry(&self) -> DateTime<Utc> {
        self.access_expiry
    }

    pub fn refresh_expiry(&self) -> DateTime<Utc> {
        self.refresh_expiry
    }
}

/// 过期时间 = now + lifetime - 1 秒
fn expiry_after(now: DateTime<Utc>, lifetime: i64) -> Result<DateTime<Utc>, i64> {
    lifetime
        .checked_sub(1)
        .and_then(Duration::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or(lifetime)
}

/// 认证端点的响应
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    refresh_expires_in: i64,
}

/// 换取方式
enum Grant {
    Password,
    Refresh(String),
}

/// 锁内状态
#[derive(Default)]
struct TokenState {
    credential: Option<Credential>,
    /// 最近一次换取失败的原因，成功后清空
    last_failure: Option<String>,
}

/// 令牌管理器
///
/// 职责：
/// - 持有唯一的 Credential
/// - 在每次使用前保证 access token 有效
/// - 不认识文档 / 任务
pub struct TokenManager {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    clock: Arc<dyn Clock>,
    /// 每次换取（无论成败）后递增
    generation: AtomicU64,
    state: Mutex<TokenState>,
}

impl TokenManager {
    /// 创建新的令牌管理器（不会立即发起认证）
    pub fn new(http: Client, config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            clock,
            generation: AtomicU64::new(0),
            state: Mutex::new(TokenState::default()),
        }
    }

    /// 获取当前可用的 access token
    ///
    /// 必要时先完成续期；续期失败返回 `AuthError`，下次调用会重新尝试。
    /// 等锁期间别的调用已经换取失败时，直接返回 `AuthError::RenewalFailed`。
    pub async fn current_access_token(&self) -> Result<String, AuthError> {
        let observed = self.generation.load(Ordering::Acquire);
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        if let Some(credential) = state.credential.as_ref() {
            if credential.is_access_valid(now) {
                return Ok(credential.access_token.clone());
            }
        }

        if self.generation.load(Ordering::Acquire) != observed {
            if let Some(reason) = &state.last_failure {
                debug!("等待期间认证已失败，跳过重复换取");
                return Err(AuthError::RenewalFailed {
                    reason: reason.clone(),
                });
            }
        }

        let grant = match state.credential.as_ref() {
            Some(credential) if credential.can_refresh(now) => {
                Grant::Refresh(credential.refresh_token.clone())
            }
            Some(_) => {
                debug!("refresh token 已过期，重新使用密码认证");
                Grant::Password
            }
            None => Grant::Password,
        };

        let result = self.exchange(grant).await;
        self.generation.fetch_add(1, Ordering::AcqRel);

        match result {
            Ok(credential) => {
                let access_token = credential.access_token.clone();
                state.credential = Some(credential);
                state.last_failure = None;
                Ok(access_token)
            }
            Err(e) => {
                state.last_failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// 当前持有的凭证（不触发续期）
    pub async fn credential(&self) -> Option<Credential> {
        self.state.lock().await.credential.clone()
    }

    /// 与认证端点交换新凭证
    async fn exchange(&self, grant: Grant) -> Result<Credential, AuthError> {
        let (endpoint, request) = match grant {
            Grant::Password => {
                let endpoint = format!("{}/token", self.base_url);
                let form = [
                    ("username", self.username.as_str()),
                    ("password", self.password.as_str()),
                ];
                let request = self.http.post(&endpoint).form(&form);
                (endpoint, request)
            }
            Grant::Refresh(refresh_token) => {
                let endpoint = format!("{}/refresh_token", self.base_url);
                let request = self.http.post(&endpoint).bearer_auth(refresh_token);
                (endpoint, request)
            }
        };

        debug!("正在换取令牌: {}", endpoint);

        let response = request.send().await.map_err(|source| AuthError::Unreachable {
            endpoint: endpoint.clone(),
            source,
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| AuthError::Unreachable {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let token_response: TokenResponse =
            serde_json::from_str(&body).map_err(|source| AuthError::MalformedResponse {
                endpoint: endpoint.clone(),
                source,
            })?;

        let credential = Credential::from_response(token_response, self.clock.now())
            .map_err(|lifetime| AuthError::InvalidLifetime { endpoint, lifetime })?;
        info!(
            "✓ 令牌已更新，有效期至 {}",
            credential.access_expiry.format("%Y-%m-%d %H:%M:%S")
        );

        Ok(credential)
    }
}

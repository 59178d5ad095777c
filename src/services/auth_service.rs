//! 认证服务 - 业务能力层
//!
//! 负责登录 / 退出登录，会话本身由 `SessionStore` 持有

use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use tracing::{info, warn};

use crate::clients::api_client::{decode_json, read_message, ApiClient};
use crate::error::{AppError, AppResult, AuthError};
use crate::models::{Envelope, Session, SignInRequest, User};
use crate::services::list_cache::ListCache;
use crate::services::SessionStore;

const LOGIN_ENDPOINT: &str = "/login";
const DEFAULT_SIGN_IN_ERROR: &str = "Error al iniciar sesión";

/// 认证服务
pub struct AuthService {
    client: ApiClient,
    cache: Option<ListCache>,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            cache: None,
        }
    }

    /// 退出登录时一并清空列表缓存
    pub fn with_cache(mut self, cache: ListCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.client.session()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session().current().map(|s| s.user)
    }

    /// 登录
    ///
    /// 非管理员账号会在本地被拒绝，不会保存任何会话。
    pub async fn sign_in(&self, username: &str, password: &str) -> AppResult<User> {
        let body = SignInRequest { username, password };
        let response = self
            .client
            .request(Method::POST, LOGIN_ENDPOINT)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::network(LOGIN_ENDPOINT, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = read_message(response)
                .await
                .unwrap_or_else(|| DEFAULT_SIGN_IN_ERROR.to_string());
            warn!("⚠️ 登录失败 ({}): {}", status, message);
            if status.is_server_error() {
                return Err(AppError::Server {
                    endpoint: LOGIN_ENDPOINT.to_string(),
                    status: status.as_u16(),
                    message: Some(message),
                });
            }
            return Err(AuthError::SignInFailed(message).into());
        }

        let envelope: Envelope<User> = decode_json(response, LOGIN_ENDPOINT).await?;
        let user = envelope.data;

        if !user.is_admin() {
            warn!("⚠️ 用户 {} 不是管理员 (role: {})", user.username, user.role);
            return Err(AuthError::Forbidden { role: user.role }.into());
        }

        self.session().save(Session::from_user(user.clone(), Utc::now()))?;
        info!("✓ 已登录: {}", user.username);

        Ok(user)
    }

    /// 退出登录
    pub async fn sign_out(&self) -> AppResult<()> {
        self.session().clear()?;
        if let Some(cache) = &self.cache {
            cache.invalidate_all().await;
        }
        info!("✓ 已退出登录");
        Ok(())
    }

    /// 要求已登录
    pub fn require_session(&self) -> AppResult<Session> {
        match self.session().current() {
            Some(session) if session.is_valid_at(Utc::now()) => Ok(session),
            _ => Err(AuthError::NotSignedIn.into()),
        }
    }
}

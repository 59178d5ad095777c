//! 题库 HTTP 客户端
//!
//! 封装请求头（x-api-key / x-origin / Bearer 令牌）与状态码到 `AppError` 的映射
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError};
use crate::models::{ApiErrorResponse, QuestionId};
use crate::services::SessionStore;

/// 题库 API 客户端
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    /// 创建新的 API 客户端
    pub fn new(config: &Config, session: Arc<SessionStore>) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", header_value("x-api-key", &config.api_key)?);
        headers.insert("x-origin", header_value("x-origin", &config.api_origin)?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// 构建请求，已登录时附带 Bearer 令牌
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET 并解析 JSON 响应
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self
            .execute(self.request(Method::GET, path).query(query), path, None)
            .await?;
        decode_json(response, path).await
    }

    /// 发送不关心响应体的写操作（POST / PUT / DELETE）
    pub async fn send_command<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        target: Option<QuestionId>,
    ) -> AppResult<()> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder, path, target).await?;
        Ok(())
    }

    /// 发送请求并把失败状态码映射为错误
    ///
    /// `target` 为写操作针对的题目 ID，404 时据此返回 `NotFound`。
    pub async fn execute(
        &self,
        builder: RequestBuilder,
        endpoint: &str,
        target: Option<QuestionId>,
    ) -> AppResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::network(endpoint, e))?;

        let status = response.status();
        debug!("{} -> {}", endpoint, status);

        if status.is_success() {
            return Ok(response);
        }

        let message = read_message(response).await;

        match (status, target) {
            (StatusCode::UNAUTHORIZED, _) => {
                warn!("⚠️ 收到 401，清除本地会话");
                // 内存中的会话已清除；文件删不掉也要让调用方知道需要重新登录
                if let Err(e) = self.session.clear() {
                    warn!("⚠️ 会话文件清除失败: {}", e);
                }
                Err(AuthError::Unauthorized.into())
            }
            (StatusCode::NOT_FOUND, Some(id)) => Err(AppError::NotFound { id }),
            (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, _) => {
                Err(AppError::ServerValidation {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                    message,
                })
            }
            _ => Err(AppError::Server {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            }),
        }
    }
}

fn header_value(name: &str, value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Config(format!("请求头 {} 的值非法: {}", name, e)))
}

/// 读取成功响应的 JSON 响应体
///
/// 读取中断算网络错误；响应体格式不符返回 `Json`，不参与重试。
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: Response,
    endpoint: &str,
) -> AppResult<T> {
    let text = response
        .text()
        .await
        .map_err(|e| AppError::network(endpoint, e))?;
    serde_json::from_str(&text).map_err(|e| {
        warn!("⚠️ {} 的响应体无法解析: {}", endpoint, e);
        AppError::Json(e)
    })
}

/// 从错误响应中提取 `message` 字段，不是 JSON 时使用原文
pub(crate) async fn read_message(response: Response) -> Option<String> {
    let text = response.text().await.ok()?;
    if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&text) {
        return Some(error.message);
    }
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

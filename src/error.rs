use std::fmt;

use thiserror::Error;

use crate::models::QuestionId;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 本地表单校验失败（不会发起任何网络请求）
    #[error("校验失败: {0}")]
    Validation(ValidationErrors),

    /// 网络传输失败（连接、超时等）
    #[error("网络错误 ({endpoint}): {source}")]
    Network {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 服务端返回 5xx 或无法识别的响应
    #[error("服务端错误 ({endpoint}): status={status}, message={message:?}")]
    Server {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },

    /// 服务端拒绝了提交的数据（400 / 422）
    #[error("服务端拒绝请求 ({endpoint}): status={status}, message={message:?}")]
    ServerValidation {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },

    /// 题目不存在（ID 已过期）
    #[error("题目不存在: {id}")]
    NotFound { id: QuestionId },

    /// 认证错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),

    /// 页码非法（必须 >= 1）
    #[error("页码非法: {0}")]
    InvalidPage(i64),

    /// 每页数量不在可选范围内
    #[error("每页数量 {0} 不在可选范围 {options:?} 内", options = crate::models::PAGE_SIZE_OPTIONS)]
    InvalidPageSize(u32),

    /// 上一次提交尚未完成
    #[error("上一次提交仍在进行中")]
    Busy,

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 会话文件读写失败
    #[error("会话文件错误 ({path}): {source}")]
    Session {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 认证相关错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// 服务端返回 401，本地会话已清除
    #[error("会话已失效，请重新登录")]
    Unauthorized,

    /// 登录用户不是管理员
    #[error("No tienes permiso para iniciar sesión (role: {role})")]
    Forbidden { role: String },

    /// 用户名或密码错误
    #[error("Error al iniciar sesión: {0}")]
    SignInFailed(String),

    /// 尚未登录
    #[error("尚未登录")]
    NotSignedIn,
}

/// 表单字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Question,
    Answers,
    Answer(usize),
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormField::Question => write!(f, "question"),
            FormField::Answers => write!(f, "answers"),
            FormField::Answer(i) => write!(f, "answers[{}]", i),
        }
    }
}

/// 单个字段的校验错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: &'static str,
}

/// 校验错误列表（按规则顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: FormField, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// 查找某个字段的第一条错误
    pub fn for_field(&self, field: FormField) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    pub fn contains_message(&self, message: &str) -> bool {
        self.0.iter().any(|e| e.message == message)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建网络错误
    pub fn network(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Network {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// 创建会话文件错误
    pub fn session_io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Session {
            path: path.into(),
            source,
        }
    }

    /// 列表查询是否应当自动重试
    ///
    /// 只有传输失败和服务端 5xx 才值得重试，认证/校验/不存在都不会因为重试而改变结果。
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Network { .. } | AppError::Server { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }

    /// 面向用户的简短提示（用于变更失败通知）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(errors) => errors.to_string(),
            AppError::Network { .. } => "No se pudo conectar con el servidor".to_string(),
            AppError::Server { .. } | AppError::ServerValidation { .. } => {
                "La operación falló en el servidor".to_string()
            }
            AppError::NotFound { id } => format!("La pregunta {} ya no existe", id),
            AppError::Auth(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

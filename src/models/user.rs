use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 管理员角色标识
pub const ADMIN_ROLE: &str = "ADMIN";

/// 登录接口返回的用户信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: String,
    pub token: String,
    /// 令牌有效期（秒），接口可能以字符串或数字返回
    #[serde(deserialize_with = "deserialize_seconds")]
    pub expires_in: i64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// 登录请求体
#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// 登录失败时的错误响应
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub message: String,
}

/// 会话有效期上限（100 年），超出的 `expiresIn` 按上限处理
pub const MAX_SESSION_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// 本地会话：用户 + 令牌 + 绝对过期时间
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// 以当前时间加上有效期计算过期时间
    ///
    /// 有效期截断到 `[0, MAX_SESSION_TTL_SECS]`，负数视为已过期。
    pub fn from_user(user: User, now: DateTime<Utc>) -> Self {
        let ttl = user.expires_in.clamp(0, MAX_SESSION_TTL_SECS);
        let expires_at = Duration::try_seconds(ttl)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(now);
        Self {
            token: user.token.clone(),
            user,
            expires_at,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && self.expires_at > now
    }
}

// expiresIn 在不同版本接口中类型不一致
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct SecondsVisitor;

    impl<'de> Visitor<'de> for SecondsVisitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer number of seconds")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            value.trim().parse().map_err(E::custom)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            i64::try_from(value).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(SecondsVisitor)
}

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 题库 API 根地址
    pub api_base_url: String,
    /// 题目相关接口的路径前缀
    pub api_prefix: String,
    /// 固定的 x-api-key 请求头
    pub api_key: String,
    /// x-origin 请求头
    pub api_origin: String,
    /// 会话文件（保存登录令牌）
    pub session_file: String,
    /// 默认每页数量
    pub default_page_size: u32,
    /// 搜索防抖时长（毫秒）
    pub search_debounce_ms: u64,
    /// 列表缓存保鲜时长（秒），期间不发请求
    pub list_stale_secs: u64,
    /// 列表缓存保留时长（秒），超过后直接丢弃
    pub list_gc_secs: u64,
    /// 列表查询失败后的最多重试次数（不含第一次请求）
    pub list_max_retries: u32,
    /// 重试退避基数（毫秒）
    pub retry_base_delay_ms: u64,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            api_prefix: "/caminosdelinca".to_string(),
            api_key: String::new(),
            api_origin: "pe.newxperience.caminosdelinca".to_string(),
            session_file: ".qbadmin_session.json".to_string(),
            default_page_size: 50,
            search_debounce_ms: 2000,
            list_stale_secs: 5 * 60,
            list_gc_secs: 10 * 60,
            list_max_retries: 3,
            retry_base_delay_ms: 1000,
            request_timeout_secs: 30,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，再叠加环境变量
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("无法读取配置文件 {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("无法解析配置文件 {}: {}", path.display(), e)))?;
        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: env_or("QB_API_BASE_URL", self.api_base_url),
            api_prefix: env_or("QB_API_PREFIX", self.api_prefix),
            api_key: env_or("QB_API_KEY", self.api_key),
            api_origin: env_or("QB_API_ORIGIN", self.api_origin),
            session_file: env_or("QB_SESSION_FILE", self.session_file),
            default_page_size: env_parse_or("QB_DEFAULT_PAGE_SIZE", self.default_page_size),
            search_debounce_ms: env_parse_or("QB_SEARCH_DEBOUNCE_MS", self.search_debounce_ms),
            list_stale_secs: env_parse_or("QB_LIST_STALE_SECS", self.list_stale_secs),
            list_gc_secs: env_parse_or("QB_LIST_GC_SECS", self.list_gc_secs),
            list_max_retries: env_parse_or("QB_LIST_MAX_RETRIES", self.list_max_retries),
            retry_base_delay_ms: env_parse_or("QB_RETRY_BASE_DELAY_MS", self.retry_base_delay_ms),
            request_timeout_secs: env_parse_or("QB_REQUEST_TIMEOUT_SECS", self.request_timeout_secs),
            verbose_logging: env_parse_or("VERBOSE_LOGGING", self.verbose_logging),
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn list_stale_time(&self) -> Duration {
        Duration::from_secs(self.list_stale_secs)
    }

    pub fn list_gc_time(&self) -> Duration {
        Duration::from_secs(self.list_gc_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_list_behaviour() {
        let config = Config::default();
        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.search_debounce(), Duration::from_secs(2));
        assert_eq!(config.list_stale_time(), Duration::from_secs(300));
        assert_eq!(config.list_max_retries, 3);
    }

    #[test]
    fn test_from_file_fills_missing_keys_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_base_url = \"https://api.example.com\"\nsearch_debounce_ms = 500"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.search_debounce_ms, 500);
        assert_eq!(config.api_prefix, "/caminosdelinca");
    }

    #[test]
    fn test_from_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "search_debounce_ms = \"soon\"").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}

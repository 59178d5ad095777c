//! 会话存储 - 业务能力层
//!
//! 持有登录令牌，并把它持久化到本地 JSON 文件。
//! 初始化时读取文件并校验过期时间，退出登录或收到 401 时显式清除。

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::Session;

/// 会话存储
pub struct SessionStore {
    path: PathBuf,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// 从会话文件加载；文件不存在、损坏或已过期时得到空会话
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        Self::load_at(path, Utc::now())
    }

    pub fn load_at(path: impl Into<PathBuf>, now: DateTime<Utc>) -> AppResult<Self> {
        let store = Self {
            path: path.into(),
            current: RwLock::new(None),
        };

        match read_session(&store.path)? {
            Some(session) if session.is_valid_at(now) => {
                debug!("已恢复会话: {}", session.user.username);
                store.set_in_memory(Some(session));
            }
            Some(_) => {
                info!("本地会话已过期，清除");
                store.clear()?;
            }
            None => {}
        }

        Ok(store)
    }

    /// 仅内存中的会话（不落盘），用于测试
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            current: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(|s| s.token.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.is_signed_in_at(Utc::now())
    }

    pub fn is_signed_in_at(&self, now: DateTime<Utc>) -> bool {
        self.current
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(|s| s.is_valid_at(now))
    }

    /// 保存新会话（内存 + 文件）
    pub fn save(&self, session: Session) -> AppResult<()> {
        if self.persists() {
            let json = serde_json::to_string_pretty(&session)?;
            std::fs::write(&self.path, json)
                .map_err(|e| AppError::session_io(self.path.display().to_string(), e))?;
        }
        self.set_in_memory(Some(session));
        Ok(())
    }

    /// 清除会话（内存 + 文件）
    pub fn clear(&self) -> AppResult<()> {
        self.set_in_memory(None);
        if self.persists() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => debug!("已删除会话文件 {}", self.path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(AppError::session_io(self.path.display().to_string(), e)),
            }
        }
        Ok(())
    }

    fn persists(&self) -> bool {
        !self.path.as_os_str().is_empty()
    }

    fn set_in_memory(&self, session: Option<Session>) {
        *self.current.write().unwrap_or_else(|p| p.into_inner()) = session;
    }
}

fn read_session(path: &Path) -> AppResult<Option<Session>> {
    if path.as_os_str().is_empty() {
        return Ok(None);
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AppError::session_io(path.display().to_string(), e)),
    };
    match serde_json::from_str::<Session>(&content) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            warn!("⚠️ 会话文件损坏，忽略: {}", e);
            if let Err(e) = std::fs::remove_file(path) {
                warn!("⚠️ 无法删除损坏的会话文件 {}: {}", path.display(), e);
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use chrono::Duration;

    fn admin(expires_in: i64) -> User {
        User {
            id: "1".into(),
            full_name: "Ana".into(),
            username: "ana".into(),
            email: "ana@example.com".into(),
            role: "ADMIN".into(),
            token: "secret".into(),
            expires_in,
        }
    }

    #[test]
    fn test_save_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let now = Utc::now();

        let store = SessionStore::load_at(&path, now).unwrap();
        assert!(store.current().is_none());
        store.save(Session::from_user(admin(3600), now)).unwrap();

        let reloaded = SessionStore::load_at(&path, now).unwrap();
        assert_eq!(reloaded.token().as_deref(), Some("secret"));
        assert!(reloaded.is_signed_in_at(now));
    }

    #[test]
    fn test_expired_session_is_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let now = Utc::now();

        SessionStore::load_at(&path, now)
            .unwrap()
            .save(Session::from_user(admin(60), now))
            .unwrap();

        let later = now + Duration::seconds(120);
        let reloaded = SessionStore::load_at(&path, later).unwrap();
        assert!(reloaded.current().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::load(&path).unwrap();
        assert!(store.token().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_reports_undeletable_file_but_forgets_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::load(&path).unwrap();
        store.save(Session::from_user(admin(60), Utc::now())).unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(store.clear(), Err(AppError::Session { .. })));
        assert!(store.current().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = SessionStore::in_memory();
        store.save(Session::from_user(admin(60), Utc::now())).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(!store.is_signed_in());
    }
}

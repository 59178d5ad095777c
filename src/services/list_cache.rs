//! 列表缓存
//!
//! 以 `PageRequest` 为键缓存列表结果：
//! - 保鲜期内直接返回缓存，不发请求
//! - 过了保鲜期仍返回缓存，同时由调用方发起一次后台刷新
//! - 超过保留时长未被使用的条目直接丢弃
//!
//! 任何成功的写操作都会清空全部缓存并递增代数，
//! 旧代数下发起的请求结果不会再写回缓存。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::models::{PageRequest, PageResult, Question};

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// 保鲜期内
    Fresh(PageResult<Question>),
    /// 已过期但仍可展示；`refresh` 为 true 时调用方负责发起后台刷新
    Stale {
        result: PageResult<Question>,
        refresh: bool,
    },
    /// 无缓存
    Miss,
}

struct CacheEntry {
    result: PageResult<Question>,
    fetched_at: Instant,
    last_used: Instant,
    refreshing: bool,
}

#[derive(Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<PageRequest, CacheEntry>,
    in_flight: HashMap<PageRequest, Arc<Mutex<()>>>,
}

/// 列表缓存（可克隆，克隆体共享同一份数据）
#[derive(Clone)]
pub struct ListCache {
    state: Arc<Mutex<CacheState>>,
    stale_time: Duration,
    gc_time: Duration,
}

impl ListCache {
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            stale_time,
            gc_time,
        }
    }

    /// 查询缓存
    pub async fn lookup(&self, request: &PageRequest) -> Lookup {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        self.evict_unused(&mut state, now);

        let Some(entry) = state.entries.get_mut(request) else {
            return Lookup::Miss;
        };
        entry.last_used = now;

        if now.duration_since(entry.fetched_at) < self.stale_time {
            return Lookup::Fresh(entry.result.clone());
        }

        let refresh = !entry.refreshing;
        entry.refreshing = true;
        Lookup::Stale {
            result: entry.result.clone(),
            refresh,
        }
    }

    /// 仅返回保鲜期内的结果，不改变刷新状态
    pub async fn fresh(&self, request: &PageRequest) -> Option<PageResult<Question>> {
        let now = Instant::now();
        let state = self.state.lock().await;
        state
            .entries
            .get(request)
            .filter(|e| now.duration_since(e.fetched_at) < self.stale_time)
            .map(|e| e.result.clone())
    }

    /// 当前代数，发请求前记录，写回时比对
    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    /// 写入结果；代数已变化（期间发生过写操作）时丢弃
    pub async fn store(&self, request: PageRequest, result: PageResult<Question>, generation: u64) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!("丢弃过期代数的列表结果: {:?}", request);
            return false;
        }
        state.entries.insert(
            request,
            CacheEntry {
                result,
                fetched_at: now,
                last_used: now,
                refreshing: false,
            },
        );
        true
    }

    /// 后台刷新失败时复位刷新标记，下次查询可再次触发
    pub async fn refresh_failed(&self, request: &PageRequest) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.entries.get_mut(request) {
            entry.refreshing = false;
        }
    }

    /// 同一查询参数共享的请求锁，用于合并并发的相同请求
    pub async fn request_lock(&self, request: &PageRequest) -> Arc<Mutex<()>> {
        let mut state = self.state.lock().await;
        state
            .in_flight
            .entry(request.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 清空全部缓存（粗粒度失效，不按页修补）
    pub async fn invalidate_all(&self) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.entries.clear();
        state.in_flight.retain(|_, lock| Arc::strong_count(lock) > 1);
        debug!("列表缓存已失效，代数 {}", state.generation);
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[cfg(test)]
    async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    /// 丢弃过了保留时长的条目，以及已经没有请求持有的锁
    fn evict_unused(&self, state: &mut CacheState, now: Instant) {
        let gc_time = self.gc_time;
        state
            .entries
            .retain(|_, e| now.duration_since(e.last_used) < gc_time);
        state.in_flight.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

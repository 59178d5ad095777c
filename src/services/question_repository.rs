//! 题目仓库 - 业务能力层
//!
//! - `QuestionSource`：远端题目集合的原始能力（列表 / 创建 / 更新 / 删除）
//! - `HttpQuestionSource`：基于题库 HTTP 接口的实现
//! - `QuestionRepository`：在原始能力之上加入列表缓存、自动重试和写后失效

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::clients::ApiClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    Envelope, PagePayload, PageRequest, PageResult, Question, QuestionId, QuestionRequest,
};
use crate::services::list_cache::{ListCache, Lookup};

/// 按 ID 查找时每页取的数量
const LOOKUP_PAGE_SIZE: u32 = 100;

/// 远端题目集合
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// 查询一页题目
    async fn fetch_page(&self, request: &PageRequest) -> AppResult<PageResult<Question>>;

    /// 创建题目
    async fn create(&self, question: &QuestionRequest) -> AppResult<()>;

    /// 更新题目
    async fn update(&self, id: QuestionId, question: &QuestionRequest) -> AppResult<()>;

    /// 删除题目
    async fn delete(&self, id: QuestionId) -> AppResult<()>;
}

/// 基于 HTTP 接口的题目集合
pub struct HttpQuestionSource {
    client: ApiClient,
    prefix: String,
}

impl HttpQuestionSource {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        Self {
            client,
            prefix: config.api_prefix.trim_end_matches('/').to_string(),
        }
    }

    fn list_path(&self) -> String {
        format!("{}/questions_with_answers", self.prefix)
    }

    fn collection_path(&self) -> String {
        format!("{}/questions", self.prefix)
    }

    fn item_path(&self, id: QuestionId) -> String {
        format!("{}/questions/{}", self.prefix, id)
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch_page(&self, request: &PageRequest) -> AppResult<PageResult<Question>> {
        let envelope: Envelope<PagePayload<Question>> = self
            .client
            .get_json(&self.list_path(), &request.query_pairs())
            .await?;
        Ok(envelope.data.into())
    }

    async fn create(&self, question: &QuestionRequest) -> AppResult<()> {
        debug!("创建题目 Payload: {:?}", question);
        self.client
            .send_command(Method::POST, &self.collection_path(), Some(question), None)
            .await
    }

    async fn update(&self, id: QuestionId, question: &QuestionRequest) -> AppResult<()> {
        debug!("更新题目 {} Payload: {:?}", id, question);
        self.client
            .send_command(Method::PUT, &self.item_path(id), Some(question), Some(id))
            .await
    }

    async fn delete(&self, id: QuestionId) -> AppResult<()> {
        self.client
            .send_command::<()>(Method::DELETE, &self.item_path(id), None, Some(id))
            .await
    }
}

/// 列表查询的重试策略（写操作不重试）
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 第一次请求失败后最多重试几次
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.list_max_retries,
            base_delay: config.retry_base_delay(),
            max_delay: Duration::from_secs(30),
        }
    }

    /// 第 `retry` 次重试前的等待时间（指数退避，封顶）
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 删除结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// 服务端已不存在该题目，按成功处理
    AlreadyGone,
}

/// 题目仓库客户端
pub struct QuestionRepository<S: QuestionSource + 'static> {
    source: Arc<S>,
    cache: ListCache,
    retry: RetryPolicy,
}

impl<S: QuestionSource + 'static> Clone for QuestionRepository<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            cache: self.cache.clone(),
            retry: self.retry,
        }
    }
}

impl<S: QuestionSource + 'static> QuestionRepository<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self::with_parts(
            Arc::new(source),
            ListCache::new(config.list_stale_time(), config.list_gc_time()),
            RetryPolicy::from_config(config),
        )
    }

    pub fn with_parts(source: Arc<S>, cache: ListCache, retry: RetryPolicy) -> Self {
        Self {
            source,
            cache,
            retry,
        }
    }

    pub fn cache(&self) -> &ListCache {
        &self.cache
    }

    /// 查询一页题目
    ///
    /// 页码小于 1 时直接拒绝，不会发出请求。
    pub async fn list(&self, page: i64, page_size: u32, search: &str) -> AppResult<PageResult<Question>> {
        let request = PageRequest::new(page, page_size, search)?;
        self.list_request(&request).await
    }

    /// 按查询参数获取列表（经过缓存）
    pub async fn list_request(&self, request: &PageRequest) -> AppResult<PageResult<Question>> {
        match self.cache.lookup(request).await {
            Lookup::Fresh(result) => {
                debug!("列表缓存命中: {:?}", request);
                return Ok(result);
            }
            Lookup::Stale { result, refresh } => {
                if refresh {
                    self.spawn_refresh(request.clone());
                }
                return Ok(result);
            }
            Lookup::Miss => {}
        }

        let lock = self.cache.request_lock(request).await;
        let _guard = lock.lock().await;

        // 等锁期间可能已由相同请求填充
        if let Some(result) = self.cache.fresh(request).await {
            return Ok(result);
        }

        let generation = self.cache.generation().await;
        let result = fetch_with_retry(self.source.as_ref(), request, self.retry).await?;
        self.cache.store(request.clone(), result.clone(), generation).await;
        Ok(result)
    }

    /// 按 ID 查找题目
    ///
    /// 接口没有单题查询，这里逐页翻列表（经过缓存）直到找到或翻完。
    pub async fn find(&self, id: QuestionId) -> AppResult<Question> {
        let mut page = 1;
        loop {
            let request = PageRequest {
                page,
                page_size: LOOKUP_PAGE_SIZE,
                search: String::new(),
            };
            let result = self.list_request(&request).await?;
            if let Some(question) = result.items.into_iter().find(|q| q.id == id) {
                return Ok(question);
            }
            if page >= result.total_pages {
                return Err(AppError::NotFound { id });
            }
            page += 1;
        }
    }

    /// 创建题目，成功后清空列表缓存
    pub async fn create(&self, question: &QuestionRequest) -> AppResult<()> {
        self.source.create(question).await?;
        self.cache.invalidate_all().await;
        info!("✓ Pregunta creada correctamente");
        Ok(())
    }

    /// 更新题目，成功后清空列表缓存
    pub async fn update(&self, id: QuestionId, question: &QuestionRequest) -> AppResult<()> {
        self.source.update(id, question).await?;
        self.cache.invalidate_all().await;
        info!("✓ Pregunta {} actualizada correctamente", id);
        Ok(())
    }

    /// 删除题目
    ///
    /// 重复删除同一个 ID 不视为错误。
    pub async fn delete(&self, id: QuestionId) -> AppResult<DeleteOutcome> {
        let outcome = match self.source.delete(id).await {
            Ok(()) => DeleteOutcome::Deleted,
            Err(e) if e.is_not_found() => {
                warn!("⚠️ 题目 {} 已不存在，按删除成功处理", id);
                DeleteOutcome::AlreadyGone
            }
            Err(e) => return Err(e),
        };
        self.cache.invalidate_all().await;
        info!("✓ Pregunta {} eliminada", id);
        Ok(outcome)
    }

    fn spawn_refresh(&self, request: PageRequest) {
        let source = self.source.clone();
        let cache = self.cache.clone();
        let retry = self.retry;

        tokio::spawn(async move {
            let lock = cache.request_lock(&request).await;
            let _guard = lock.lock().await;
            let generation = cache.generation().await;
            debug!("后台刷新列表: {:?}", request);
            match fetch_with_retry(source.as_ref(), &request, retry).await {
                Ok(result) => {
                    cache.store(request, result, generation).await;
                }
                Err(e) => {
                    warn!("⚠️ 后台刷新列表失败: {}", e);
                    cache.refresh_failed(&request).await;
                }
            }
        });
    }
}

/// 带重试的列表查询
async fn fetch_with_retry<S: QuestionSource + ?Sized>(
    source: &S,
    request: &PageRequest,
    retry: RetryPolicy,
) -> AppResult<PageResult<Question>> {
    let mut retries = 0;
    loop {
        match source.fetch_page(request).await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && retries < retry.max_retries => {
                let delay = retry.delay(retries);
                retries += 1;
                warn!(
                    "列表请求失败, {:?} 后第 {}/{} 次重试: {}",
                    delay, retries, retry.max_retries, e
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{question_request, RecordingSource};

    fn repo(source: RecordingSource) -> QuestionRepository<RecordingSource> {
        QuestionRepository::with_parts(
            Arc::new(source),
            ListCache::new(Duration::from_secs(300), Duration::from_secs(600)),
            RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(10),
                max_delay: Duration::from_secs(30),
            },
        )
    }

    #[test]
    fn test_retry_delay_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(10), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_list_is_cached_within_stale_time() {
        let repo = repo(RecordingSource::with_questions(3));
        repo.list(1, 10, "").await.unwrap();
        repo.list(1, 10, "").await.unwrap();
        repo.list(1, 10, "  ").await.unwrap();
        assert_eq!(repo.source.list_calls(), 1);

        repo.list(2, 10, "").await.unwrap();
        assert_eq!(repo.source.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_list_never_requests_page_below_one() {
        let repo = repo(RecordingSource::with_questions(3));
        let err = repo.list(0, 10, "").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPage(0)));
        assert_eq!(repo.source.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_recovers_on_third_retry() {
        let source = RecordingSource::with_questions(1);
        source.fail_next_lists(3);
        let repo = repo(source);

        let page = repo.list(1, 10, "").await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(repo.source.list_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_gives_up_after_three_retries() {
        let source = RecordingSource::with_questions(1);
        source.fail_next_lists(5);
        let repo = repo(source);

        let err = repo.list(1, 10, "").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(repo.source.list_calls(), 4);
        assert!(repo.cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_result_served_while_refreshing() {
        let repo = repo(RecordingSource::with_questions(2));
        repo.list(1, 10, "").await.unwrap();

        tokio::time::advance(Duration::from_secs(301)).await;
        let stale = repo.list(1, 10, "").await.unwrap();
        assert_eq!(stale.items.len(), 2);

        // 让后台刷新任务跑完
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(repo.source.list_calls(), 2);

        repo.list(1, 10, "").await.unwrap();
        assert_eq!(repo.source.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_identical_lists_share_one_request() {
        let repo = repo(RecordingSource::with_questions(2));
        let (a, b) = tokio::join!(repo.list(1, 10, "x"), repo.list(1, 10, "x"));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(repo.source.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_successful_mutation_triggers_exactly_one_refetch() {
        let repo = repo(RecordingSource::with_questions(2));
        repo.list(1, 10, "").await.unwrap();

        repo.create(&question_request("nueva")).await.unwrap();
        repo.list(1, 10, "").await.unwrap();
        repo.list(1, 10, "").await.unwrap();
        assert_eq!(repo.source.list_calls(), 2);

        repo.update(QuestionId(1), &question_request("editada"))
            .await
            .unwrap();
        repo.list(1, 10, "").await.unwrap();
        assert_eq!(repo.source.list_calls(), 3);

        repo.delete(QuestionId(1)).await.unwrap();
        repo.list(1, 10, "").await.unwrap();
        assert_eq!(repo.source.list_calls(), 4);
    }

    #[tokio::test]
    async fn test_failed_mutation_triggers_no_refetch() {
        let source = RecordingSource::with_questions(2);
        source.fail_next_mutation(AppError::Server {
            endpoint: "/questions".into(),
            status: 500,
            message: None,
        });
        let repo = repo(source);
        repo.list(1, 10, "").await.unwrap();

        assert!(repo.create(&question_request("nueva")).await.is_err());
        repo.list(1, 10, "").await.unwrap();
        assert_eq!(repo.source.list_calls(), 1);
        assert_eq!(repo.source.mutation_calls(), 1);
    }

    #[tokio::test]
    async fn test_update_of_missing_question_is_not_found() {
        let repo = repo(RecordingSource::with_questions(1));
        let err = repo
            .update(QuestionId(99), &question_request("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { id: QuestionId(99) }));
    }

    #[tokio::test]
    async fn test_repeated_delete_is_idempotent() {
        let repo = repo(RecordingSource::with_questions(2));
        assert_eq!(
            repo.delete(QuestionId(1)).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            repo.delete(QuestionId(1)).await.unwrap(),
            DeleteOutcome::AlreadyGone
        );
    }

    #[tokio::test]
    async fn test_find_walks_pages_until_found() {
        let repo = repo(RecordingSource::with_questions(250));
        let question = repo.find(QuestionId(230)).await.unwrap();
        assert_eq!(question.question, "Pregunta 230");
        assert_eq!(repo.source.list_calls(), 3);

        let missing = repo.find(QuestionId(999)).await;
        assert!(matches!(missing, Err(AppError::NotFound { id }) if id == QuestionId(999)));
        // 三页都已缓存
        assert_eq!(repo.source.list_calls(), 3);
    }
}

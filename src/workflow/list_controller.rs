//! 分页列表控制器
//!
//! 持有视图状态和搜索防抖，决定下一次向仓库请求哪一页。
//! 页码永远不会小于 1；修改每页数量或搜索词时回到第 1 页。

use std::time::Duration;

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::{PageRequest, PageResult, Question, PAGE_SIZE_OPTIONS};
use crate::services::{QuestionRepository, QuestionSource};
use crate::workflow::search_debounce::SearchDebounce;
use crate::workflow::view_state::ViewState;

pub struct ListController<S: QuestionSource + 'static> {
    repo: QuestionRepository<S>,
    view: ViewState,
    search: SearchDebounce,
    last: Option<PageResult<Question>>,
}

impl<S: QuestionSource + 'static> ListController<S> {
    pub fn new(repo: QuestionRepository<S>, view: ViewState, debounce: Duration) -> Self {
        let search = SearchDebounce::new(debounce, &view.search);
        Self {
            repo,
            view,
            search,
            last: None,
        }
    }

    /// 从可分享的查询字符串恢复
    pub fn from_query(repo: QuestionRepository<S>, query: &str, debounce: Duration) -> Self {
        Self::new(repo, ViewState::from_query(query), debounce)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn repository(&self) -> &QuestionRepository<S> {
        &self.repo
    }

    /// 当前视图对应的查询字符串
    pub fn query_string(&self) -> String {
        self.view.to_query()
    }

    /// 输入框中显示的搜索词
    pub fn displayed_search(&self) -> &str {
        self.search.displayed()
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_searching()
    }

    /// 最近一次成功获取的结果
    pub fn last(&self) -> Option<&PageResult<Question>> {
        self.last.as_ref()
    }

    pub fn set_page(&mut self, page: i64) -> AppResult<()> {
        if page < 1 || page > u32::MAX as i64 {
            return Err(AppError::InvalidPage(page));
        }
        self.view.page = page as u32;
        Ok(())
    }

    /// 修改每页数量，变化时回到第 1 页
    pub fn set_page_size(&mut self, page_size: u32) -> AppResult<()> {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return Err(AppError::InvalidPageSize(page_size));
        }
        if page_size != self.view.page_size {
            self.view.page_size = page_size;
            self.view.page = 1;
        }
        Ok(())
    }

    /// 搜索框输入
    pub fn search_input(&mut self, text: &str) {
        self.search.input(text);
        self.view.page = 1;
    }

    /// 下一页（不超过已知的总页数）
    pub fn next(&mut self) -> bool {
        let total_pages = self.last.as_ref().map_or(0, |last| last.total_pages);
        if self.view.page < total_pages {
            self.view.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.view.page > 1 {
            self.view.page -= 1;
            true
        } else {
            false
        }
    }

    /// 当前生效的查询参数（不等待防抖）
    pub fn effective_request(&self) -> PageRequest {
        self.view.request()
    }

    /// 等待搜索词生效；没有待生效输入时一直挂起
    ///
    /// 返回查询词是否变化。可以放在 `tokio::select!` 中使用。
    pub async fn wait_search(&mut self) -> bool {
        let changed = self.search.wait().await;
        self.apply_search(changed);
        changed
    }

    /// 等待未生效的搜索词，然后获取当前页
    pub async fn next_page(&mut self) -> AppResult<&PageResult<Question>> {
        let changed = self.search.settle().await;
        self.apply_search(changed);

        let request = self.effective_request();
        debug!("获取列表: {:?}", request);
        let result = self.repo.list_request(&request).await?;
        info!(
            "✓ 第 {}/{} 页，共 {} 道题",
            result.page, result.total_pages, result.total_items
        );
        Ok(&*self.last.insert(result))
    }

    fn apply_search(&mut self, changed: bool) {
        if changed {
            self.view.search = self.search.effective().to_string();
            self.view.page = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::services::testing::RecordingSource;
    use crate::services::{ListCache, RetryPolicy};

    const QUIET: Duration = Duration::from_millis(2000);

    fn controller(count: u64, query: &str) -> (Arc<RecordingSource>, ListController<RecordingSource>) {
        let source = Arc::new(RecordingSource::with_questions(count));
        let repo = QuestionRepository::with_parts(
            source.clone(),
            ListCache::new(Duration::from_secs(300), Duration::from_secs(600)),
            RetryPolicy::default(),
        );
        (source, ListController::from_query(repo, query, QUIET))
    }

    fn searches(source: &RecordingSource) -> Vec<String> {
        source
            .list_requests()
            .into_iter()
            .map(|request| request.search)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_within_quiet_period_issues_one_request() {
        let (source, mut controller) = controller(5, "");
        controller.search_input("cat");

        tokio::select! {
            _ = controller.wait_search() => panic!("search applied too early"),
            _ = tokio::time::sleep(Duration::from_millis(1000)) => {}
        }
        assert_eq!(source.list_calls(), 0);
        assert!(controller.is_searching());

        controller.search_input("cats");
        assert!(controller.wait_search().await);
        controller.next_page().await.unwrap();

        assert_eq!(searches(&source), vec!["cats".to_string()]);
        assert!(!controller.is_searching());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pausing_after_first_term_requests_both() {
        let (source, mut controller) = controller(5, "");
        controller.search_input("cat");
        assert!(controller.wait_search().await);
        controller.next_page().await.unwrap();

        controller.search_input("cats");
        assert!(controller.wait_search().await);
        controller.next_page().await.unwrap();

        assert_eq!(searches(&source), vec!["cat".to_string(), "cats".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_page_settles_pending_search_first() {
        let (source, mut controller) = controller(5, "");
        controller.search_input("Pregunta 3");
        let page = controller.next_page().await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(source.list_calls(), 1);
        assert_eq!(controller.view().search, "Pregunta 3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_size_change_resets_to_first_page() {
        let (source, mut controller) = controller(200, "page=3&pageSize=50");
        controller.next_page().await.unwrap();
        assert_eq!(source.list_requests()[0].page, 3);

        controller.set_page_size(10).unwrap();
        controller.next_page().await.unwrap();

        let request = &source.list_requests()[1];
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 10);
        assert_eq!(controller.query_string(), "page=1&pageSize=10");
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_resets_to_first_page() {
        let (_source, mut controller) = controller(200, "page=4");
        controller.search_input("Pregunta");
        assert_eq!(controller.view().page, 1);
        assert_eq!(controller.displayed_search(), "Pregunta");
        assert_eq!(controller.view().search, "");
    }

    #[tokio::test]
    async fn test_invalid_page_and_size_are_rejected() {
        let (source, mut controller) = controller(5, "page=2");
        assert!(matches!(controller.set_page(0), Err(AppError::InvalidPage(0))));
        assert!(matches!(
            controller.set_page_size(7),
            Err(AppError::InvalidPageSize(7))
        ));
        assert_eq!(controller.view().page, 2);
        assert_eq!(source.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_navigation_is_bounded_by_total_pages() {
        let (_source, mut controller) = controller(25, "pageSize=10");
        assert!(!controller.next());

        controller.next_page().await.unwrap();
        assert!(!controller.prev());
        assert!(controller.next());
        assert!(controller.next());
        assert!(!controller.next());
        assert_eq!(controller.view().page, 3);

        let page = controller.next_page().await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert!(controller.prev());
        assert_eq!(controller.view().page, 2);
    }
}
